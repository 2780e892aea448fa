//! Closed error taxonomy for the controller, per the error handling design.
//!
//! Every fallible internal API returns `Result<T, ControllerError>`; boundary
//! code (the main loop, emitter listeners) logs and recovers rather than
//! propagating panics. See the error policy table for what each kind does.

use thiserror::Error;

/// The six error kinds the controller distinguishes.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Socket/WebSocket level failure (Executor TCP or Bridge WebSocket).
    #[error("transport error: {0}")]
    Transport(String),

    /// A frame or message failed to parse as JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// An Executor action completed with `result: "fail"`.
    #[error("executor action failed ({action}): {stderr}")]
    ExecutorActionFailed {
        /// The action name that failed.
        action: String,
        /// The `stderr` payload from the Reply.
        stderr: String,
    },

    /// The LLM adapter could not be reached or returned an error.
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    /// No handler is registered for a `(command, action)` pair.
    #[error("unknown dispatch: command={command:?} action={action}")]
    UnknownDispatch {
        /// The command half of the dispatch key, if any.
        command: Option<String>,
        /// The action half of the dispatch key.
        action: String,
    },

    /// A classifier returned a value outside its closed enum.
    #[error("bad user input: {0}")]
    BadUserInput(String),
}
