//! Deployment subsystem.
//!
//! # Data Flow
//! ```text
//! SnippetSet + service id + credential
//!     → orchestrator.rs (Deployer)
//!         → api.rs: GET service          → state.rs: Start → ActiveVersionFound
//!         → api.rs: PUT clone            → state.rs: → Cloned
//!         → api.rs: DELETE snippet ×5    → state.rs: → Cleared
//!         → api.rs: POST snippet ×5      → state.rs: → Populated
//!         → api.rs: PUT activate         → state.rs: → Activated
//!     → DeployReport | DeployError (failing step, artifact, draft version)
//! ```
//!
//! # Design Decisions
//! - The active version is only ever read and cloned
//! - Activation requires every upload to have succeeded
//! - No rollback: a failed deploy leaves an inactive draft behind

pub mod api;
pub mod orchestrator;
pub mod state;
pub mod types;

pub use api::{ApiKey, FastlyApi, PlatformApi, API_KEY_HEADER};
pub use orchestrator::Deployer;
pub use state::{DeployPhase, DeploymentState};
pub use types::{ApiError, DeployError, DeployReport, DeployResult, DeployStep, ServiceVersion};
