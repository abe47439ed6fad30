//! Terminal report rendering.
//!
//! Consumes the analyzer's plain data structures and renders the worst-first
//! quality report, with a JSON mode for scripting.

use anyhow::Result;
use crossterm::style::{Color, Stylize};
use serde_json::json;
use toolpulse_core::{QualityStats, ToolQuality};

const COLOR_PRIMARY: Color = Color::Rgb {
    r: 0xE0,
    g: 0x7A,
    b: 0x5F,
};
const COLOR_MUTED: Color = Color::Rgb {
    r: 0x6B,
    g: 0x72,
    b: 0x80,
};
const COLOR_TEXT: Color = Color::Rgb {
    r: 0xF4,
    g: 0xF3,
    b: 0xEE,
};
// Red below 50%
const COLOR_CRITICAL: Color = Color::Rgb {
    r: 0xEF,
    g: 0x44,
    b: 0x44,
};
// Yellow for 50-69%
const COLOR_WARNING: Color = Color::Rgb {
    r: 0xF5,
    g: 0x9E,
    b: 0x0B,
};
const COLOR_SUCCESS: Color = Color::Rgb {
    r: 0x10,
    g: 0xB9,
    b: 0x81,
};

const BAR_CHAR: char = '█';
const BAR_WIDTH: usize = 10;
const NAME_MIN_WIDTH: usize = 15;

/// Presentation options resolved from CLI flags and config.
pub struct ReportView<'a> {
    pub subtitle: &'a str,
    pub project: Option<&'a str>,
    pub threshold: f64,
    pub show_skills: bool,
    pub show_subagents: bool,
}

fn rate_color(success_rate: f64) -> Color {
    if success_rate < 0.50 {
        COLOR_CRITICAL
    } else if success_rate < 0.70 {
        COLOR_WARNING
    } else {
        COLOR_TEXT
    }
}

fn success_bar(success_rate: f64, width: usize) -> String {
    let filled = ((success_rate * width as f64) as usize).min(width);
    BAR_CHAR.to_string().repeat(filled)
}

/// Render the text report.
pub fn print_text(stats: &QualityStats, view: &ReportView) {
    let (mut problem_skills, mut problem_subagents) = stats.problematic(view.threshold);
    if !view.show_skills {
        problem_skills = &[];
    }
    if !view.show_subagents {
        problem_subagents = &[];
    }
    let total_problematic = problem_skills.len() + problem_subagents.len();

    println!();
    println!("{}", "toolpulse".with(COLOR_PRIMARY).bold());
    println!("{}", format!("Period: {}", view.subtitle).with(COLOR_MUTED));
    if let Some(project) = view.project {
        println!("{}", format!("Project: {}", project).with(COLOR_MUTED));
    }

    if stats.is_empty() {
        println!("{}", "Status: No data available".with(COLOR_MUTED));
        println!();
        println!(
            "{}",
            "No custom skills or subagents used in this period.".with(COLOR_MUTED)
        );
        println!();
        return;
    }

    if total_problematic == 0 {
        println!(
            "{}",
            "Status: All tools working well!".with(COLOR_SUCCESS)
        );
        println!();
        println!(
            "{}",
            "No problematic skills or subagents detected.".with(COLOR_SUCCESS)
        );
        println!(
            "{}",
            format!(
                "All executions have >={}% success rate.",
                (view.threshold * 100.0) as u32
            )
            .with(COLOR_MUTED)
        );
        println!();
        return;
    }

    let tool_word = if total_problematic == 1 { "tool" } else { "tools" };
    println!(
        "{}",
        format!("Status: {} problematic {} found", total_problematic, tool_word)
            .with(COLOR_WARNING)
    );

    if !problem_skills.is_empty() {
        print_section("SKILLS WITH ISSUES", problem_skills);
    }
    if !problem_subagents.is_empty() {
        print_section("SUBAGENTS WITH ISSUES", problem_subagents);
    }
    println!();
}

fn print_section(title: &str, tools: &[ToolQuality]) {
    println!();
    println!("{}", title.with(COLOR_WARNING).bold());
    println!("{}", "─".repeat(60).with(COLOR_MUTED));

    let name_width = tools
        .iter()
        .map(|t| t.name.len())
        .max()
        .unwrap_or(0)
        .max(NAME_MIN_WIDTH);

    for tool in tools {
        let rate_pct = format!("{}%", (tool.success_rate * 100.0) as u32);
        let bar = success_bar(tool.success_rate, BAR_WIDTH);
        let ratio = format!("{}/{}", tool.success_count, tool.completed_count());
        let incomplete_note = if tool.incomplete_count > 0 {
            format!("  ({} incomplete)", tool.incomplete_count)
        } else {
            String::new()
        };

        let line = format!(
            "{:<name_width$} {:>4}  {:<bar_width$} {:>6}{}",
            tool.name,
            rate_pct,
            bar,
            ratio,
            incomplete_note,
            name_width = name_width,
            bar_width = BAR_WIDTH,
        );
        println!("{}", line.with(rate_color(tool.success_rate)));
    }
}

/// Emit the full stats as pretty-printed JSON.
pub fn print_json(stats: &QualityStats, view: &ReportView) -> Result<()> {
    let (problem_skills, problem_subagents) = stats.problematic(view.threshold);

    let output = json!({
        "period": view.subtitle,
        "project": view.project,
        "threshold": view.threshold,
        "skills": stats.skills.iter().map(tool_json).collect::<Vec<_>>(),
        "subagents": stats.subagents.iter().map(tool_json).collect::<Vec<_>>(),
        "problematic": {
            "skills": problem_skills.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            "subagents": problem_subagents.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        },
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn tool_json(tool: &ToolQuality) -> serde_json::Value {
    json!({
        "name": tool.name,
        "success_count": tool.success_count,
        "failure_count": tool.failure_count,
        "incomplete_count": tool.incomplete_count,
        "total_count": tool.total_count,
        "success_rate": tool.success_rate,
    })
}
