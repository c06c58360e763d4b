//! Tracing setup.
//!
//! Library code only emits events and spans. A host binary, or a test that
//! wants to see them, installs a subscriber here once; `RUST_LOG` overrides
//! the default filter of [`DEFAULT_DIRECTIVE`].

use std::sync::Once;

use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Warnings from dependencies, info from this crate.
pub const DEFAULT_DIRECTIVE: &str = "warn,mzlayout=info";

static INIT: Once = Once::new();

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber in `format`.
///
/// Only the first call in a process has an effect. An already installed
/// subscriber from the host is left alone.
pub fn init_with(format: LogFormat) {
    INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(env_filter());
        let installed = match format {
            LogFormat::Pretty => registry
                .with(
                    fmt::layer()
                        .with_span_events(FmtSpan::CLOSE)
                        .with_target(true)
                        .with_line_number(true),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .json()
                        .with_span_events(FmtSpan::CLOSE)
                        .with_current_span(true)
                        .with_span_list(false),
                )
                .try_init(),
        };
        if installed.is_ok() {
            info!(?format, "mzlayout tracing initialized");
        }
    });
}

pub fn init_tracing() {
    init_with(LogFormat::Pretty);
}

/// Structured JSON lines, one object per event.
pub fn init_tracing_json() {
    init_with(LogFormat::Json);
}
