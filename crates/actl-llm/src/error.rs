//! Errors surfaced by the LLM adapter, folded into
//! [`actl_types::ControllerError::LlmUnavailable`] by callers.

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm backend unreachable: {0}")]
    Unreachable(String),
    #[error("llm backend returned an error status: {0}")]
    BadStatus(u16),
    #[error("failed to decode llm response: {0}")]
    Decode(String),
}
