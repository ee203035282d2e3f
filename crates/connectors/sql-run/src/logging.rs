//! Tracing subscriber setup for the binary.

use sql_run_configuration::LogFormat;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_LEVEL: &str = "info";

// sqlx logs statements after binding, which would leak resolved secrets.
const NOISY_TARGETS: &[(&str, &str)] = &[
    ("aws_config", "warn"),
    ("aws_smithy_runtime", "warn"),
    ("hyper", "warn"),
    ("rustls", "warn"),
    ("sqlx::query", "warn"),
];

/// The filter: `info` plus the noisy target overrides, then whatever `RUST_LOG` adds.
pub fn build_env_filter(rust_log: Option<&str>) -> anyhow::Result<EnvFilter> {
    let mut directives = vec![DEFAULT_LEVEL.to_string()];
    directives.extend(
        NOISY_TARGETS
            .iter()
            .map(|(target, level)| format!("{target}={level}")),
    );
    if let Some(rust_log) = rust_log.filter(|rust_log| !rust_log.trim().is_empty()) {
        directives.push(rust_log.to_string());
    }
    let filter = directives.join(",");
    EnvFilter::try_new(&filter)
        .map_err(|err| anyhow::anyhow!("invalid tracing filter '{filter}': {err}"))
}

/// Install the global subscriber. Logs go to stderr so stdout stays free for output.
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_env_filter(rust_log.as_deref())?;

    let layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|err| anyhow::anyhow!("unable to install the tracing subscriber: {err}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silences_statement_logging() {
        let filter = build_env_filter(None).unwrap().to_string();
        assert!(filter.contains("sqlx::query=warn"));
    }

    #[test]
    fn accepts_rust_log_additions() {
        let filter = build_env_filter(Some("query_engine_execution=debug")).unwrap();
        assert!(filter.to_string().contains("query_engine_execution=debug"));
    }

    #[test]
    fn rejects_malformed_rust_log() {
        assert!(build_env_filter(Some("sqlx=notalevel")).is_err());
    }
}
