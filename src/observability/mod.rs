//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! compiler, deploy, http
//!     → logging.rs (structured tracing events, stdout)
//!     → metrics.rs (platform call counters and latencies, deploy outcomes)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the HTTP trace span
//! - Metric calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;

pub use self::logging::init_logging;
pub use self::metrics::{init_metrics, record_api_call, record_deploy};
