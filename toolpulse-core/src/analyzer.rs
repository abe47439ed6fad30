//! Quality analyzer for skills and subagents.
//!
//! Consumes the loader's execution list and produces per-tool success/failure
//! statistics, sorted worst first so unreliable automations surface at the
//! top of the report.

use crate::types::{ExecutionOutcome, ToolExecution};
use std::collections::HashMap;

/// Dispatcher tool name for skill invocations.
pub const SKILL_TOOL: &str = "Skill";

/// Dispatcher tool name for delegated subagent invocations.
pub const SUBAGENT_TOOL: &str = "Task";

/// Built-in subagent types shipped with the platform.
///
/// These are not operator-authored, so their executions are excluded from
/// quality reporting entirely. Kept as data so the set can grow without
/// touching the aggregation logic.
pub const BUILTIN_SUBAGENTS: &[&str] = &[
    "Explore",
    "Plan",
    "Bash",
    "general-purpose",
    "statusline-setup",
    "claude-code-guide",
];

fn is_builtin_subagent(subagent_type: &str) -> bool {
    BUILTIN_SUBAGENTS.contains(&subagent_type)
}

/// Quality metrics for a single tool (skill or subagent).
#[derive(Debug, Clone)]
pub struct ToolQuality {
    pub name: String,
    pub success_count: usize,
    pub failure_count: usize,
    pub incomplete_count: usize,
    pub total_count: usize,
    /// Success rate over completed executions, 0.0 to 1.0.
    pub success_rate: f64,
}

impl ToolQuality {
    /// Number of executions with an observed result.
    pub fn completed_count(&self) -> usize {
        self.success_count + self.failure_count
    }
}

/// Quality statistics for skills and subagents, each sorted ascending by
/// success rate (worst first).
#[derive(Debug, Clone, Default)]
pub struct QualityStats {
    pub skills: Vec<ToolQuality>,
    pub subagents: Vec<ToolQuality>,
}

impl QualityStats {
    /// Tools with a success rate below `threshold`.
    ///
    /// The lists are sorted ascending by rate, so this is a prefix selection
    /// that preserves their order.
    pub fn problematic(&self, threshold: f64) -> (&[ToolQuality], &[ToolQuality]) {
        (
            below_threshold(&self.skills, threshold),
            below_threshold(&self.subagents, threshold),
        )
    }

    /// Whether any tool produced data in the analyzed period.
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.subagents.is_empty()
    }
}

fn below_threshold(tools: &[ToolQuality], threshold: f64) -> &[ToolQuality] {
    let cut = tools.partition_point(|t| t.success_rate < threshold);
    &tools[..cut]
}

#[derive(Default)]
struct Tally {
    success: usize,
    failure: usize,
    incomplete: usize,
}

impl Tally {
    fn record(&mut self, outcome: ExecutionOutcome) {
        match outcome {
            ExecutionOutcome::Pending => self.incomplete += 1,
            ExecutionOutcome::Failure => self.failure += 1,
            ExecutionOutcome::Success => self.success += 1,
        }
    }

    fn into_quality(self, name: String) -> ToolQuality {
        let completed = self.success + self.failure;
        // Zero completed executions reports as 0% rather than undefined, so
        // an all-incomplete tool still surfaces below any positive threshold.
        let success_rate = if completed > 0 {
            self.success as f64 / completed as f64
        } else {
            0.0
        };

        ToolQuality {
            name,
            success_count: self.success,
            failure_count: self.failure,
            incomplete_count: self.incomplete,
            total_count: self.success + self.failure + self.incomplete,
            success_rate,
        }
    }
}

/// Aggregate executions into per-tool quality metrics.
///
/// With `project_prefix` set, the aggregation key is `"[project] name"`, so
/// the same skill used in two projects produces two rows; without it the
/// counts merge into one row per bare name.
pub fn analyze_quality(executions: &[ToolExecution], project_prefix: bool) -> QualityStats {
    let mut skills: HashMap<String, Tally> = HashMap::new();
    let mut subagents: HashMap<String, Tally> = HashMap::new();

    for execution in executions {
        match execution.tool_name.as_str() {
            SKILL_TOOL => {
                let skill = execution
                    .tool_input
                    .get("skill")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                let key = display_name(project_prefix, &execution.project, skill);
                skills.entry(key).or_default().record(execution.outcome);
            }
            SUBAGENT_TOOL => {
                let subagent_type = execution
                    .tool_input
                    .get("subagent_type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                // Only operator-authored subagents are audited; empty or
                // built-in types do not count toward any total.
                if subagent_type.is_empty() || is_builtin_subagent(subagent_type) {
                    continue;
                }
                let key = display_name(project_prefix, &execution.project, subagent_type);
                subagents.entry(key).or_default().record(execution.outcome);
            }
            _ => {}
        }
    }

    QualityStats {
        skills: into_sorted_qualities(skills),
        subagents: into_sorted_qualities(subagents),
    }
}

fn display_name(project_prefix: bool, project: &str, name: &str) -> String {
    if project_prefix {
        format!("[{}] {}", project, name)
    } else {
        name.to_string()
    }
}

fn into_sorted_qualities(tallies: HashMap<String, Tally>) -> Vec<ToolQuality> {
    let mut tools: Vec<ToolQuality> = tallies
        .into_iter()
        .map(|(name, tally)| tally.into_quality(name))
        .collect();
    tools.sort_by(|a, b| a.success_rate.total_cmp(&b.success_rate));
    tools
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn execution(
        tool_name: &str,
        input: serde_json::Value,
        project: &str,
        outcome: ExecutionOutcome,
    ) -> ToolExecution {
        ToolExecution {
            tool_use_id: "id".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 8, 1, 10, 0, 0).unwrap(),
            tool_name: tool_name.to_string(),
            tool_input: input,
            project: project.to_string(),
            outcome,
        }
    }

    fn skill(name: &str, project: &str, outcome: ExecutionOutcome) -> ToolExecution {
        execution("Skill", serde_json::json!({ "skill": name }), project, outcome)
    }

    fn subagent(kind: &str, project: &str, outcome: ExecutionOutcome) -> ToolExecution {
        execution(
            "Task",
            serde_json::json!({ "subagent_type": kind }),
            project,
            outcome,
        )
    }

    #[test]
    fn test_bucketing_by_outcome() {
        let executions = vec![
            skill("deploy", "a", ExecutionOutcome::Success),
            skill("deploy", "a", ExecutionOutcome::Failure),
            skill("deploy", "a", ExecutionOutcome::Pending),
        ];

        let stats = analyze_quality(&executions, false);
        assert_eq!(stats.skills.len(), 1);

        let deploy = &stats.skills[0];
        assert_eq!(deploy.name, "deploy");
        assert_eq!(deploy.success_count, 1);
        assert_eq!(deploy.failure_count, 1);
        assert_eq!(deploy.incomplete_count, 1);
        assert_eq!(deploy.total_count, 3);
        // Incomplete executions never enter the denominator
        assert_eq!(deploy.success_rate, 0.5);
    }

    #[test]
    fn test_sorted_worst_first() {
        let mut executions = Vec::new();
        // 90%, 30%, 60% success rates
        for _ in 0..9 {
            executions.push(skill("good", "p", ExecutionOutcome::Success));
        }
        executions.push(skill("good", "p", ExecutionOutcome::Failure));
        for _ in 0..3 {
            executions.push(skill("bad", "p", ExecutionOutcome::Success));
        }
        for _ in 0..7 {
            executions.push(skill("bad", "p", ExecutionOutcome::Failure));
        }
        for _ in 0..6 {
            executions.push(skill("mid", "p", ExecutionOutcome::Success));
        }
        for _ in 0..4 {
            executions.push(skill("mid", "p", ExecutionOutcome::Failure));
        }

        let stats = analyze_quality(&executions, false);
        let names: Vec<&str> = stats.skills.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["bad", "mid", "good"]);
    }

    #[test]
    fn test_zero_denominator_reports_zero_rate() {
        let executions = vec![skill("stalled", "p", ExecutionOutcome::Pending)];
        let stats = analyze_quality(&executions, false);

        assert_eq!(stats.skills[0].success_rate, 0.0);
        assert_eq!(stats.skills[0].incomplete_count, 1);

        // Appears in the problematic set for any threshold > 0
        let (problem_skills, _) = stats.problematic(0.01);
        assert_eq!(problem_skills.len(), 1);
    }

    #[test]
    fn test_builtin_subagents_excluded() {
        let executions = vec![
            subagent("general-purpose", "p", ExecutionOutcome::Failure),
            subagent("Explore", "p", ExecutionOutcome::Failure),
            subagent("", "p", ExecutionOutcome::Failure),
            subagent("my-reviewer", "p", ExecutionOutcome::Success),
        ];

        let stats = analyze_quality(&executions, false);
        assert_eq!(stats.subagents.len(), 1);
        assert_eq!(stats.subagents[0].name, "my-reviewer");
        assert_eq!(stats.subagents[0].total_count, 1);
    }

    #[test]
    fn test_unrelated_tools_ignored() {
        let executions = vec![
            execution("Bash", serde_json::json!({}), "p", ExecutionOutcome::Failure),
            execution("Read", serde_json::json!({}), "p", ExecutionOutcome::Success),
        ];

        let stats = analyze_quality(&executions, false);
        assert!(stats.is_empty());
    }

    #[test]
    fn test_project_prefixing() {
        let executions = vec![
            skill("lint", "a", ExecutionOutcome::Success),
            skill("lint", "b", ExecutionOutcome::Failure),
        ];

        let prefixed = analyze_quality(&executions, true);
        let names: Vec<&str> = prefixed.skills.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"[a] lint"));
        assert!(names.contains(&"[b] lint"));

        let merged = analyze_quality(&executions, false);
        assert_eq!(merged.skills.len(), 1);
        assert_eq!(merged.skills[0].name, "lint");
        assert_eq!(merged.skills[0].total_count, 2);
        assert_eq!(merged.skills[0].success_rate, 0.5);
    }

    #[test]
    fn test_skill_without_name_defaults_to_unknown() {
        let executions = vec![execution(
            "Skill",
            serde_json::json!({}),
            "p",
            ExecutionOutcome::Success,
        )];

        let stats = analyze_quality(&executions, false);
        assert_eq!(stats.skills[0].name, "unknown");
    }

    #[test]
    fn test_problematic_is_prefix_of_sorted_list() {
        let executions = vec![
            skill("failing", "p", ExecutionOutcome::Failure),
            skill("passing", "p", ExecutionOutcome::Success),
        ];

        let stats = analyze_quality(&executions, false);
        let (problem_skills, problem_subagents) = stats.problematic(0.8);

        assert_eq!(problem_skills.len(), 1);
        assert_eq!(problem_skills[0].name, "failing");
        assert!(problem_subagents.is_empty());

        let (all, _) = stats.problematic(1.1);
        assert_eq!(all.len(), 2);
    }
}
