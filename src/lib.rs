//! CloudFront distribution to edge VCL migration library.

pub mod compiler;
pub mod config;
pub mod deploy;
pub mod export;
pub mod http;
pub mod observability;
pub mod snippet;
pub mod source;

pub use compiler::{compile, CompileOptions, CompiledDistribution};
pub use config::ServiceConfig;
pub use deploy::Deployer;
pub use http::HttpServer;
