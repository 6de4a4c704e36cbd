//! Structured logging.
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when neither `RUST_LOG` nor a config level is given.
pub const DEFAULT_FILTER: &str = "edge_migrator=info,tower_http=info";

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = match level {
            Some(level) => format!("edge_migrator={level},tower_http={level}"),
            None => DEFAULT_FILTER.to_string(),
        };
        EnvFilter::new(directive)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
