//! # toolpulse-core
//!
//! Core library for toolpulse - a quality auditor for coding-assistant
//! automations.
//!
//! This library provides:
//! - The event correlation loader, which reconstructs tool executions from
//!   append-only session logs
//! - The quality analyzer, which aggregates per-skill / per-subagent
//!   success rates
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows one-directional through the core:
//! raw log lines → correlated [`ToolExecution`] records →
//! per-tool [`ToolQuality`] aggregates → (external) report renderer.
//!
//! ## Example
//!
//! ```rust,no_run
//! use toolpulse_core::{analyze_quality, DateRange, ExecutionLoader};
//!
//! let loader = ExecutionLoader::new();
//! let executions = loader
//!     .load(&DateRange::today(), None)
//!     .expect("failed to load executions");
//! let stats = analyze_quality(&executions, true);
//! for tool in &stats.skills {
//!     println!("{}: {:.0}%", tool.name, tool.success_rate * 100.0);
//! }
//! ```

// Re-export commonly used items at the crate root
pub use analyzer::{analyze_quality, QualityStats, ToolQuality, BUILTIN_SUBAGENTS};
pub use config::Config;
pub use correlate::{current_project_dir, extract_project_name, ExecutionLoader};
pub use error::{Error, Result};
pub use types::{DateRange, ExecutionOutcome, ToolExecution};

// Public modules
pub mod analyzer;
pub mod config;
pub mod correlate;
pub mod error;
pub mod logging;
pub mod types;
