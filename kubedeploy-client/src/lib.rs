//! Client side of the kubedeploy console
//!
//! Talks to the kubedeploy backend, keeps resource collections in sync and
//! runs the deploy workflow. Rendering is left to the caller.

pub mod api;
pub mod context;
pub mod error;
pub mod session;
pub mod sync;
pub mod workflow;

pub use api::{HttpResourceClient, ResourceApi};
pub use context::{ClientSettings, ConsoleContext};
pub use error::{ApiError, ApiResult, SyncClosed};
pub use session::{SessionContext, SessionState};
pub use sync::{LiveView, QueryKey, QueryState, ResourceKind, ResourceSync, SyncConfig, ViewStatus};
pub use workflow::{DeploymentError, DeploymentOutcome, DeploymentStage, Workflow};
