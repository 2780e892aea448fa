//! UserMessage/OutboundBridgeMessage — the Controller ↔ Bridge wire schemas.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message the Bridge forwarded from the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "tabId", default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
}

/// The internal action name a normalized `UserMessage` dispatches as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizedAction {
    /// `chat | user_input | input | prompt` → a fresh top-level request.
    UserInputNormal,
    /// `pending_response` → a reply to the head of the pending queue.
    UserInputPending,
    /// `reset` → wipe LLM conversation memory.
    Reset,
}

impl NormalizedAction {
    pub fn as_str(self) -> &'static str {
        match self {
            NormalizedAction::UserInputNormal => "user_input_normal",
            NormalizedAction::UserInputPending => "user_input_pending",
            NormalizedAction::Reset => "reset",
        }
    }
}

/// The fixed `type` → action table from the spec. Returns `None` for a type
/// the Bridge contract doesn't recognize — callers echo that back as
/// `supervisor_log` rather than dispatching it.
pub fn normalize_inbound_type(kind: &str) -> Option<NormalizedAction> {
    match kind {
        "chat" | "user_input" | "input" | "prompt" => Some(NormalizedAction::UserInputNormal),
        "pending_response" => Some(NormalizedAction::UserInputPending),
        "reset" => Some(NormalizedAction::Reset),
        _ => None,
    }
}

/// A message the Controller sends to the Bridge for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundBridgeMessage {
    #[serde(rename = "type")]
    pub kind: OutboundKind,
    pub text: Value,
    #[serde(rename = "tabId", default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<i64>,
}

impl OutboundBridgeMessage {
    pub fn text(kind: OutboundKind, text: impl Into<String>, tab_id: Option<i64>) -> Self {
        OutboundBridgeMessage {
            kind,
            text: Value::from(text.into()),
            tab_id,
        }
    }
}

/// Recognized `type` values on outbound Bridge messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundKind {
    MainInput,
    PendingRequest,
    Info,
    Summary,
    Diff,
    Result,
    Error,
    SupervisorLog,
    System,
}
