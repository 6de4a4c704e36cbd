//! HTTP service subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, tracing)
//!     → handlers.rs
//!         → credential check (deploy only)
//!         → source::DistributionConfig (JSON body)
//!         → compiler::compile
//!         → deploy::Deployer (deploy only)
//!     → response.rs (AppError → JSON status + body)
//!     → Send to client
//! ```

pub mod handlers;
pub mod response;
pub mod server;

pub use response::AppError;
pub use server::{AppState, HttpServer, ServerError, X_REQUEST_ID};
