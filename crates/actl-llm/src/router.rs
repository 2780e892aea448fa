//! The Command Router: a single LLM call that decides which of the four
//! top-level branches a user message belongs to.

use actl_types::{first_matching_token, Command};

use crate::adapter::{LlmAdapter, CLASSIFIER_MAX_NEW_TOKENS};
use crate::error::LlmError;

pub struct CommandRouter<'a> {
    adapter: &'a dyn LlmAdapter,
    system_prompt: &'a str,
}

impl<'a> CommandRouter<'a> {
    pub fn new(adapter: &'a dyn LlmAdapter, system_prompt: &'a str) -> Self {
        CommandRouter { adapter, system_prompt }
    }

    /// Classify `user_input`, falling back to [`Command::Conversation`]
    /// when the model's reply doesn't contain a recognized whole word.
    pub fn classify(&self, user_input: &str) -> Result<Command, LlmError> {
        let raw = self
            .adapter
            .generate(self.system_prompt, user_input, CLASSIFIER_MAX_NEW_TOKENS)?;
        let matched = first_matching_token(&raw, &["git", "code", "train", "conversation"]);
        Ok(match matched {
            Some("git") => Command::Git,
            Some("code") => Command::Code,
            Some("train") => Command::Train,
            _ => Command::Conversation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StubLlmAdapter;

    #[test]
    fn classifies_git_command() {
        let stub = StubLlmAdapter::new(vec!["git".to_string()]);
        let router = CommandRouter::new(&stub, "sys");
        assert_eq!(router.classify("clone this").unwrap(), Command::Git);
    }

    #[test]
    fn unrecognized_reply_falls_back_to_conversation() {
        let stub = StubLlmAdapter::new(vec!["I am not sure".to_string()]);
        let router = CommandRouter::new(&stub, "sys");
        assert_eq!(router.classify("huh").unwrap(), Command::Conversation);
    }
}
