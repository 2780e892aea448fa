//! The LLM seam: an [`adapter::LlmAdapter`] trait hiding the concrete
//! inference backend, plus the two classifiers built on top of it.

pub mod adapter;
pub mod error;
pub mod intent;
pub mod router;

pub use adapter::{ChatMessage, HttpLlmAdapter, LlmAdapter, StubLlmAdapter, CLASSIFIER_MAX_NEW_TOKENS};
pub use error::LlmError;
pub use intent::IntentClassifier;
pub use router::CommandRouter;
