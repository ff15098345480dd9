//! Structured logging for wayr.
//!
//! stdout carries the report; every log record goes to stderr, either as
//! human-readable lines or as JSON lines.
//!
//! # Usage
//!
//! ```ignore
//! use wayr_core::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//! tracing::debug!(pid = 4242, "resolving ancestry");
//! ```

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, EnvFilter};

/// Module whose records `--debug-man` opens up.
pub const DESCRIBE_TARGET: &str = "wayr_core::context::describe";

/// Filter for `config`, layered over `RUST_LOG` when it is set and valid.
///
/// The wayr level and the extra directives always apply, so `--quiet` and
/// `--debug-man` hold whatever `RUST_LOG` says about other targets.
pub fn build_filter(config: &LogConfig, rust_log: Option<&str>) -> EnvFilter {
    let Some(filter) = rust_log.and_then(|spec| EnvFilter::try_new(spec).ok()) else {
        return EnvFilter::new(config.filter_spec());
    };
    config
        .filter_spec()
        .split(',')
        .filter_map(|directive| directive.parse::<Directive>().ok())
        .fold(filter, EnvFilter::add_directive)
}

/// Initialize the global subscriber.
///
/// Must be called once at startup.
pub fn init_logging(config: &LogConfig) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(config, rust_log.as_deref());

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .init();
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .init();
        }
    }
}
