//! Logging setup and the `[handler] event` macros used across the crate.
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! default = "warn"  # quiet by default
//!
//! [logging.modules]
//! "reposcope::indexing" = "debug"     # enable indexer debug logs
//! ```
//!
//! # Environment Variable
//!
//! `RUST_LOG` takes precedence over config:
//! ```bash
//! RUST_LOG=debug reposcope index
//! RUST_LOG=reposcope::search=trace reposcope search parser
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Install the global subscriber. Output goes to stderr so `--json`
/// stdout stays machine-readable. Only the first call has an effect;
/// `RUST_LOG`, when set, replaces the configured directives entirely.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directives(config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_writer(std::io::stderr)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Build the `EnvFilter` directive string: default level, then module overrides
/// in a stable order so the same config always yields the same filter.
pub fn filter_directives(config: &LoggingConfig) -> String {
    let mut modules: Vec<(&String, &String)> = config.modules.iter().collect();
    modules.sort();

    let mut filter_str = config.default.clone();
    for (module, level) in modules {
        filter_str.push_str(&format!(",{module}={level}"));
    }
    filter_str
}

/// Raise the default level from CLI verbosity flags (`-v` info, `-vv` debug, `-vvv` trace).
pub fn with_verbosity(config: &LoggingConfig, verbose: u8) -> LoggingConfig {
    let default = match verbose {
        0 => return config.clone(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    LoggingConfig {
        default: default.to_string(),
        modules: config.modules.clone(),
    }
}

/// Install the subscriber with `LoggingConfig::default()` (warn).
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

/// Log an event with handler context.
///
/// # Examples
/// ```ignore
/// log_event!("indexer", "reindexed", "{}", path);
/// log_event!("watcher", "started");
/// ```
#[macro_export]
macro_rules! log_event {
    ($handler:expr, $event:expr) => {
        tracing::info!("[{}] {}", $handler, $event)
    };
    ($handler:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $handler, $event, format!($($arg)*))
    };
}

/// Debug-only event logging.
///
/// # Examples
/// ```ignore
/// debug_event!("resolver", "alias table", "{} rules", rules.len());
/// ```
#[macro_export]
macro_rules! debug_event {
    ($handler:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $handler, $event)
    };
    ($handler:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $handler, $event, format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_are_sorted() {
        let mut config = LoggingConfig::default();
        config
            .modules
            .insert("reposcope::search".to_string(), "trace".to_string());
        config
            .modules
            .insert("reposcope::indexing".to_string(), "debug".to_string());

        assert_eq!(
            filter_directives(&config),
            "warn,reposcope::indexing=debug,reposcope::search=trace"
        );
    }

    #[test]
    fn test_verbosity_overrides_default_only() {
        let mut config = LoggingConfig::default();
        config
            .modules
            .insert("reposcope::watcher".to_string(), "error".to_string());

        assert_eq!(with_verbosity(&config, 0).default, "warn");
        assert_eq!(with_verbosity(&config, 2).default, "debug");
        assert_eq!(with_verbosity(&config, 9).default, "trace");
        assert_eq!(with_verbosity(&config, 1).modules.len(), 1);
    }
}
