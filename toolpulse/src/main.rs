//! toolpulse - audit skill and subagent reliability from session logs
//!
//! Loads tool executions for the requested window, aggregates per-tool
//! quality and renders a worst-first report of problematic automations.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use toolpulse_core::{
    analyze_quality, current_project_dir, extract_project_name, Config, DateRange, ExecutionLoader,
};

mod report;

#[derive(Parser)]
#[command(name = "toolpulse")]
#[command(about = "Audit skill and subagent reliability from coding-assistant session logs")]
#[command(version)]
struct Args {
    /// Date range: 7d, 2w, 1m, or YYYYMMDD (default: today)
    #[arg(short, long)]
    since: Option<String>,

    /// Restrict to one project directory (exact on-disk name)
    #[arg(short, long, conflicts_with = "here")]
    project: Option<String>,

    /// Restrict to the project matching the current working directory
    #[arg(long)]
    here: bool,

    /// Success rate threshold below which a tool is problematic
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Show only skills
    #[arg(long, conflicts_with = "subagents")]
    skills: bool,

    /// Show only subagents
    #[arg(long)]
    subagents: bool,

    /// Do not prefix tool names with their owning project
    #[arg(long)]
    no_project_prefix: bool,

    /// Override the projects root directory
    #[arg(long)]
    root: Option<PathBuf>,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text")]
    format: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        toolpulse_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let root = args.root.clone().or_else(|| config.projects_root());

    // Resolve the project filter before the root is handed to the loader
    let project_filter = if args.here {
        let cwd = std::env::current_dir().context("failed to resolve current directory")?;
        let matched = root
            .as_deref()
            .and_then(|root| current_project_dir(root, &cwd));
        match matched {
            Some(dir) => Some(dir),
            None => anyhow::bail!("no project found matching {}", cwd.display()),
        }
    } else {
        args.project.clone()
    };

    let (window, subtitle) = match args.since.as_deref() {
        Some(label) => DateRange::parse_label(label),
        None => (DateRange::today(), "Today".to_string()),
    };

    let loader = match root {
        Some(root) => ExecutionLoader::with_root(root),
        None => ExecutionLoader::new(),
    };

    let executions = loader
        .load(&window, project_filter.as_deref())
        .context("failed to load tool executions")?;

    tracing::info!(
        count = executions.len(),
        project = project_filter.as_deref().unwrap_or("all"),
        "Loaded executions for report"
    );

    let project_prefix = config.report.project_prefix && !args.no_project_prefix;
    let stats = analyze_quality(&executions, project_prefix);

    let threshold = args
        .threshold
        .unwrap_or(config.report.threshold)
        .clamp(0.0, 1.0);

    let project_name = project_filter.as_deref().map(extract_project_name);

    let view = report::ReportView {
        subtitle: &subtitle,
        project: project_name.as_deref(),
        threshold,
        show_skills: !args.subagents,
        show_subagents: !args.skills,
    };

    match args.format.as_str() {
        "json" => report::print_json(&stats, &view)?,
        _ => report::print_text(&stats, &view),
    }

    Ok(())
}
