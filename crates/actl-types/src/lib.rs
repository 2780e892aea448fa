//! Wire schemas and closed enums shared across the controller: the
//! Executor's Task/Reply envelopes, the Bridge's UserMessage/
//! OutboundBridgeMessage, PendingAction, per-tab WorkflowState, and the
//! Command/Intent classifier outputs.

pub mod bridge;
pub mod classify;
pub mod error;
pub mod pending;
pub mod task;
pub mod workflow;

pub use bridge::{normalize_inbound_type, NormalizedAction, OutboundBridgeMessage, OutboundKind, UserMessage};
pub use classify::{first_matching_token, Command, Intent};
pub use error::ControllerError;
pub use pending::{PendingAction, PendingKind};
pub use task::{Reply, ReplyResult, Target, Task};
pub use workflow::{extract_repo_name, TabId, WorkflowState, DEFAULT_EXECUTE_FILE};
