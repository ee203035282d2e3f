//! Settings read by the handler runtime from its command line or environment.

use clap::{Args, ValueEnum};

pub const DEFAULT_LOG_FORMAT_VARIABLE: &str = "SQL_RUN_LOG_FORMAT";
pub const DEFAULT_CACHE_REFERENCES_VARIABLE: &str = "SQL_RUN_CACHE_REFERENCES";

/// How log lines are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// JSON lines, one object per event.
    Json,
    /// Human readable single lines.
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct RuntimeSettings {
    #[arg(long, env = DEFAULT_LOG_FORMAT_VARIABLE, value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
    /// Fetch each distinct dynamic reference at most once per invocation.
    #[arg(
        long,
        env = DEFAULT_CACHE_REFERENCES_VARIABLE,
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub cache_references: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        RuntimeSettings {
            log_format: LogFormat::Json,
            cache_references: true,
        }
    }
}
