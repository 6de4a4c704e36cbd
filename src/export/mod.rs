//! Distribution export.
//!
//! # Data Flow
//! ```text
//! distribution id
//!     → cloudfront.rs: GetDistributionConfig, GetCachePolicy, ...
//!     → exporter.rs: behaviors + resolved cache policies
//!     → DistributionConfig document (+ optional summary rows)
//! ```
//!
//! The document is the same shape the compiler accepts, so an export can be
//! fed straight into `compile` or posted to the service.

pub mod cloudfront;
pub mod exporter;
pub mod types;

pub use cloudfront::CloudFrontSource;
pub use exporter::{export_distribution, DistributionSource, Export};
pub use types::{
    render_summary, BehaviorRef, DistributionSettings, ExportError, ExportResult, PolicyKind, SummaryRow,
};
