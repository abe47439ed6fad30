//! Event correlation loader.
//!
//! Scans per-project session logs under `~/.claude/projects/[encoded-path]/*.jsonl`
//! and reconstructs completed tool executions by pairing each `tool_use`
//! invocation with its `tool_result`, which may appear anywhere later in the
//! same file (or not at all).
//!
//! # Error Handling
//!
//! The loader is designed to degrade rather than fail:
//!
//! - **Missing projects root**: returns an empty list.
//! - **Unreadable file**: logged as a warning, file skipped, load continues.
//! - **Malformed JSON line**: skipped, parsing continues.
//! - **Unparseable timestamp**: that single event is skipped.
//! - **Orphan result** (no matching invocation id): discarded, it cannot be
//!   attributed.
//!
//! The worst observable outcome of malformed input is an undercount, never a
//! crash.
//!
//! # Two-Pass Correlation
//!
//! Each file is read twice. Invocations and results for the same logical call
//! may be interleaved with unrelated events, so pass 1 indexes every in-window
//! invocation by its id and pass 2 re-reads the file attaching results by id
//! lookup. Reading twice trades I/O for memory, which is the right trade for
//! large local log files.

use crate::error::Result;
use crate::types::{DateRange, ExecutionOutcome, ToolExecution};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Loader for Claude Code session logs.
pub struct ExecutionLoader {
    root: Option<PathBuf>,
}

impl ExecutionLoader {
    /// Create a loader rooted at the default projects directory
    /// (`~/.claude/projects`).
    pub fn new() -> Self {
        Self {
            root: dirs::home_dir().map(|h| h.join(".claude").join("projects")),
        }
    }

    /// Create a loader with a custom projects root (testing, overrides).
    pub fn with_root(root: PathBuf) -> Self {
        Self { root: Some(root) }
    }

    /// Load all tool executions whose invocation falls inside `window`,
    /// optionally restricted to one project directory (exact name match).
    ///
    /// The result is sorted ascending by invocation timestamp; ties keep
    /// insertion order. Duplicate invocation ids overwrite the earlier
    /// record in place (last-seen-wins).
    pub fn load(
        &self,
        window: &DateRange,
        project_filter: Option<&str>,
    ) -> Result<Vec<ToolExecution>> {
        let root = match &self.root {
            Some(r) if r.is_dir() => r.clone(),
            _ => return Ok(Vec::new()),
        };

        let entries = match std::fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "Cannot read projects root");
                return Ok(Vec::new());
            }
        };

        let mut index = ExecutionIndex::default();

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let dir_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            if let Some(filter) = project_filter {
                if dir_name != filter {
                    continue;
                }
            }

            let project = extract_project_name(&dir_name);
            self.load_project_dir(&path, &project, window, &mut index);
        }

        let executions = index.into_sorted();
        tracing::debug!(count = executions.len(), "Loaded tool executions");
        Ok(executions)
    }

    /// Correlate every session file in one project directory.
    fn load_project_dir(
        &self,
        dir: &Path,
        project: &str,
        window: &DateRange,
        index: &mut ExecutionIndex,
    ) {
        let pattern = dir.join("*.jsonl");
        let paths = match glob::glob(&pattern.to_string_lossy()) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Invalid glob pattern");
                return;
            }
        };

        for file in paths.flatten() {
            // Files are written append-only in chronological order, so a file
            // last modified before the window start cannot contain in-window
            // events.
            if file_predates_window(&file, window) {
                continue;
            }

            if let Err(e) = correlate_file(&file, project, window, index) {
                tracing::warn!(path = %file.display(), error = %e, "Skipping unreadable log file");
            }
        }
    }
}

impl Default for ExecutionLoader {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================
// Raw JSONL record types (serde deserialization)
// ============================================

/// A single line from a session log.
///
/// Only the fields the correlator inspects are modeled; everything else in
/// the record is ignored. `#[serde(default)]` keeps missing fields non-fatal.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawRecord {
    #[serde(rename = "type")]
    record_type: Option<String>,
    timestamp: Option<String>,
    message: Option<RawMessage>,
}

impl RawRecord {
    /// The structured content blocks, if the message carries any.
    fn into_blocks(self) -> Vec<ContentBlock> {
        match self.message.and_then(|m| m.content) {
            Some(RawContent::Blocks(blocks)) => blocks,
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawMessage {
    content: Option<RawContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        #[serde(default)]
        tool_use_id: String,
        #[serde(default)]
        is_error: bool,
    },
    // Text, image and any future block types play no role in correlation
    #[serde(other)]
    Other,
}

// ============================================
// Correlation index
// ============================================

/// Insertion-ordered map from invocation id to execution record.
///
/// Overwriting an id replaces the record in its original slot, so insertion
/// order survives duplicates and the final stable sort breaks timestamp ties
/// by it.
#[derive(Default)]
struct ExecutionIndex {
    entries: Vec<ToolExecution>,
    by_id: HashMap<String, usize>,
}

impl ExecutionIndex {
    fn insert(&mut self, execution: ToolExecution) {
        match self.by_id.get(&execution.tool_use_id) {
            Some(&slot) => self.entries[slot] = execution,
            None => {
                self.by_id
                    .insert(execution.tool_use_id.clone(), self.entries.len());
                self.entries.push(execution);
            }
        }
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut ToolExecution> {
        self.by_id.get(id).map(|&slot| &mut self.entries[slot])
    }

    fn into_sorted(mut self) -> Vec<ToolExecution> {
        self.entries.sort_by_key(|e| e.timestamp);
        self.entries
    }
}

/// Run both correlation passes over one session file.
fn correlate_file(
    path: &Path,
    project: &str,
    window: &DateRange,
    index: &mut ExecutionIndex,
) -> Result<()> {
    index_invocations(path, project, window, index)?;
    attach_results(path, index)?;
    Ok(())
}

/// Pass 1: index every in-window invocation by its id.
fn index_invocations(
    path: &Path,
    project: &str,
    window: &DateRange,
    index: &mut ExecutionIndex,
) -> Result<()> {
    let reader = BufReader::new(File::open(path)?);

    for line in reader.lines() {
        let Some(record) = parse_line(line) else {
            continue;
        };
        if record.record_type.as_deref() != Some("assistant") {
            continue;
        }
        let Some(timestamp) = record.timestamp.as_deref().and_then(parse_timestamp) else {
            continue;
        };
        if !window.contains(timestamp) {
            continue;
        }

        for block in record.into_blocks() {
            if let ContentBlock::ToolUse { id, name, input } = block {
                if id.is_empty() {
                    continue;
                }
                index.insert(ToolExecution {
                    tool_use_id: id,
                    timestamp,
                    tool_name: name,
                    tool_input: input,
                    project: project.to_string(),
                    outcome: ExecutionOutcome::Pending,
                });
            }
        }
    }

    Ok(())
}

/// Pass 2: re-read the file and attach results to indexed invocations.
///
/// Results referencing unknown ids are discarded. Results are not
/// window-filtered: a late result still resolves an in-window invocation.
fn attach_results(path: &Path, index: &mut ExecutionIndex) -> Result<()> {
    let reader = BufReader::new(File::open(path)?);

    for line in reader.lines() {
        let Some(record) = parse_line(line) else {
            continue;
        };
        if record.record_type.as_deref() != Some("user") {
            continue;
        }

        for block in record.into_blocks() {
            if let ContentBlock::ToolResult {
                tool_use_id,
                is_error,
            } = block
            {
                if let Some(execution) = index.get_mut(&tool_use_id) {
                    execution.outcome = ExecutionOutcome::from_result_flag(is_error);
                }
            }
        }
    }

    Ok(())
}

/// Parse one log line, returning `None` for blank, unreadable or malformed
/// lines.
fn parse_line(line: std::io::Result<String>) -> Option<RawRecord> {
    let line = line.ok()?;
    if line.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(&line) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping malformed log line");
            None
        }
    }
}

/// Parse an ISO-8601 timestamp into UTC.
///
/// RFC 3339 parsing accepts both the trailing `Z` designator and explicit
/// offsets; the result is normalized to UTC for all window comparisons.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Whether a file's mtime rules out any in-window content.
fn file_predates_window(path: &Path, window: &DateRange) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(|modified| DateTime::<Utc>::from(modified) < window.start)
        .unwrap_or(false)
}

/// Extract the human-readable project name from an on-disk directory name.
///
/// Directory names encode a filesystem root indicator ahead of a `--`
/// separator, e.g. `C--toolpulse` becomes `toolpulse`. Names that do not
/// match the pattern are used verbatim.
pub fn extract_project_name(dir_name: &str) -> String {
    let mut chars = dir_name.chars();
    match (chars.next(), chars.as_str().strip_prefix("--")) {
        (Some(first), Some(rest)) if first.is_ascii_uppercase() && !rest.is_empty() => {
            rest.to_string()
        }
        _ => dir_name.to_string(),
    }
}

/// Find the project directory matching the current working directory.
///
/// Matches the cwd basename against extracted project names, then falls back
/// to a substring match on the full path. Returns the on-disk directory name
/// suitable for use as a load filter.
pub fn current_project_dir(root: &Path, cwd: &Path) -> Option<String> {
    let cwd_name = cwd.file_name()?.to_str()?.to_lowercase();
    let cwd_full = cwd.to_string_lossy().to_lowercase();

    let entries = std::fs::read_dir(root).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let dir_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        let project = extract_project_name(&dir_name).to_lowercase();
        if cwd_name == project || cwd_full.contains(&project) {
            return Some(dir_name);
        }
    }
    None
}
