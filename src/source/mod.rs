//! Source configuration subsystem.
//!
//! # Data Flow
//! ```text
//! JSON distribution document (request body or file)
//!     → schema.rs (serde deserialize, unknown fields ignored)
//!     → DistributionConfig (immutable, consumed once per compile)
//! ```
//!
//! # Design Decisions
//! - Optional policy blocks are `Option`, never null checks
//! - Enumerants with undefined values keep them in an explicit variant
//! - No validation here; the compiler rejects only what it cannot compile

pub mod schema;

pub use schema::{
    CacheBehavior, CachePolicy, CachePolicyConfig, DistributionConfig, HeaderBehavior, Origin,
    ProtocolPolicy, QueryStringBehavior,
};
