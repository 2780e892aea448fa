//! PendingAction — an approval request awaiting a user response.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::Reply;

/// Which step in the workflow a pending approval gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingKind {
    ReadPyFiles,
    GitEditRequest,
    GitEditConfirm,
}

impl PendingKind {
    /// The question shown to the user, per the workflow transitions.
    pub fn prompt(self) -> &'static str {
        match self {
            PendingKind::ReadPyFiles => "Is this correct?",
            PendingKind::GitEditRequest => "Would you like to make modifications, or proceed as is?",
            PendingKind::GitEditConfirm => "Shall we proceed with training using this modification?",
        }
    }
}

/// A queued approval request. Carries the Reply that caused the prompt so
/// the consuming handler can reconstruct context (the files read, the venv
/// created, the edit applied) without a second round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: Uuid,
    pub kind: PendingKind,
    pub msg: Reply,
    pub tab_id: i64,
}

impl PendingAction {
    pub fn new(kind: PendingKind, msg: Reply, tab_id: i64) -> Self {
        PendingAction {
            id: Uuid::new_v4(),
            kind,
            msg,
            tab_id,
        }
    }
}
