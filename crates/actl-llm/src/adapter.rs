//! The seam between the controller's workflow logic and the model that
//! actually answers it. The production adapter talks to a local inference
//! server over HTTP; tests swap in [`StubLlmAdapter`] instead.

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// One turn of conversation history, in the shape most chat-completion
/// endpoints expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        ChatMessage { role: "system".to_string(), content: content.into() }
    }

    fn user(content: impl Into<String>) -> Self {
        ChatMessage { role: "user".to_string(), content: content.into() }
    }

    fn assistant(content: impl Into<String>) -> Self {
        ChatMessage { role: "assistant".to_string(), content: content.into() }
    }
}

const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

/// Anything that can turn a `(system prompt, user input)` pair into text.
/// `load`/`reset` exist because the concrete adapter may hold a
/// long-lived connection or context window that needs to be (re)primed
/// between tabs.
pub trait LlmAdapter: Send + Sync {
    /// Prepare the backend for use. Called once at controller startup.
    fn load(&mut self) -> Result<(), LlmError>;

    /// A single-shot completion, capped at `max_new_tokens`. Used by the
    /// two classifiers, which only ever need one word back and never
    /// persist into conversation memory.
    fn generate(
        &self,
        system_prompt: &str,
        user_input: &str,
        max_new_tokens: u32,
    ) -> Result<String, LlmError>;

    /// A longer, uncapped completion for prose-producing steps
    /// (experiment summaries, code edits, conversation turns). When
    /// `persistent` is set, the prompt and its reply are folded into the
    /// adapter's conversation memory instead of being issued as a
    /// throwaway one-shot exchange.
    fn run_with_prompt(&self, system_prompt: &str, user_input: &str, persistent: bool) -> Result<String, LlmError>;

    /// Drop any accumulated conversation memory, e.g. on an explicit
    /// reset command or between unrelated tabs.
    fn reset(&mut self) -> Result<(), LlmError>;
}

/// Token budget shared by both classifiers: enough for one word of
/// output, never enough for the model to ramble past it.
pub const CLASSIFIER_MAX_NEW_TOKENS: u32 = 8;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    messages: &'a [ChatMessage],
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    text: String,
}

/// Talks to an OpenAI-server-compatible local inference endpoint
/// (llama.cpp's `server` binary, Ollama, etc.) over HTTP.
#[derive(Debug)]
pub struct HttpLlmAdapter {
    endpoint: String,
    agent: ureq::Agent,
    /// Conversation memory for `persistent` calls. `&self`-compatible via
    /// interior mutability since every call site already holds this
    /// adapter behind one exclusive lock, but the trait itself only
    /// requires `&self` for `run_with_prompt`.
    history: std::sync::Mutex<Vec<ChatMessage>>,
}

impl HttpLlmAdapter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        HttpLlmAdapter {
            endpoint: endpoint.into(),
            agent: ureq::AgentBuilder::new().build(),
            history: std::sync::Mutex::new(vec![ChatMessage::system(DEFAULT_SYSTEM_MESSAGE)]),
        }
    }

    fn complete(&self, messages: &[ChatMessage], max_tokens: Option<u32>) -> Result<String, LlmError> {
        let body = CompletionRequest { messages, max_tokens };
        let response = self
            .agent
            .post(&format!("{}/completion", self.endpoint))
            .send_json(body)
            .map_err(|e| LlmError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(LlmError::BadStatus(status));
        }

        let parsed: CompletionResponse = response
            .into_json()
            .map_err(|e| LlmError::Decode(e.to_string()))?;
        Ok(parsed.text)
    }
}

impl LlmAdapter for HttpLlmAdapter {
    fn load(&mut self) -> Result<(), LlmError> {
        let status = self
            .agent
            .get(&format!("{}/health", self.endpoint))
            .call()
            .map_err(|e| LlmError::Unreachable(e.to_string()))?
            .status();
        if !(200..300).contains(&status) {
            return Err(LlmError::BadStatus(status));
        }
        Ok(())
    }

    fn generate(&self, system_prompt: &str, user_input: &str, max_new_tokens: u32) -> Result<String, LlmError> {
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(user_input)];
        self.complete(&messages, Some(max_new_tokens))
    }

    fn run_with_prompt(&self, system_prompt: &str, user_input: &str, persistent: bool) -> Result<String, LlmError> {
        if persistent {
            let mut history = self.history.lock().unwrap();
            history.push(ChatMessage::system(system_prompt));
            history.push(ChatMessage::user(user_input));
            let result = self.complete(&history, None)?;
            history.push(ChatMessage::assistant(result.clone()));
            Ok(result)
        } else {
            let messages = [ChatMessage::system(system_prompt), ChatMessage::user(user_input)];
            self.complete(&messages, None)
        }
    }

    fn reset(&mut self) -> Result<(), LlmError> {
        *self.history.get_mut().unwrap() = vec![ChatMessage::system(DEFAULT_SYSTEM_MESSAGE)];
        Ok(())
    }
}

/// A scripted adapter for tests: returns whatever was queued, in order,
/// regardless of the prompt it was asked.
#[derive(Debug, Default)]
pub struct StubLlmAdapter {
    responses: std::collections::VecDeque<String>,
}

impl StubLlmAdapter {
    pub fn new(responses: Vec<String>) -> Self {
        StubLlmAdapter {
            responses: responses.into(),
        }
    }
}

impl LlmAdapter for StubLlmAdapter {
    fn load(&mut self) -> Result<(), LlmError> {
        Ok(())
    }

    fn generate(&self, _system_prompt: &str, _user_input: &str, _max_new_tokens: u32) -> Result<String, LlmError> {
        Ok(self
            .responses
            .front()
            .cloned()
            .unwrap_or_else(|| "conversation".to_string()))
    }

    fn run_with_prompt(&self, _system_prompt: &str, _user_input: &str, _persistent: bool) -> Result<String, LlmError> {
        Ok(self.responses.front().cloned().unwrap_or_default())
    }

    fn reset(&mut self) -> Result<(), LlmError> {
        self.responses.pop_front();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_returns_queued_response() {
        let stub = StubLlmAdapter::new(vec!["git".to_string()]);
        let out = stub.generate("sys", "clone this repo", CLASSIFIER_MAX_NEW_TOKENS).unwrap();
        assert_eq!(out, "git");
    }

    #[test]
    fn stub_falls_back_to_conversation_when_empty() {
        let stub = StubLlmAdapter::default();
        let out = stub.generate("sys", "hi", CLASSIFIER_MAX_NEW_TOKENS).unwrap();
        assert_eq!(out, "conversation");
    }

    #[test]
    fn reset_clears_accumulated_conversation_history() {
        let mut adapter = HttpLlmAdapter::new("http://127.0.0.1:0");
        {
            let mut history = adapter.history.lock().unwrap();
            history.push(ChatMessage::user("earlier turn"));
            history.push(ChatMessage::assistant("earlier reply"));
        }
        assert!(adapter.history.lock().unwrap().len() > 1);

        adapter.reset().unwrap();

        let history = adapter.history.lock().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, "system");
        assert_eq!(history[0].content, DEFAULT_SYSTEM_MESSAGE);
    }
}
