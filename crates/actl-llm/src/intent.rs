//! The Intent Classifier: a single LLM call that reads a user's reply to
//! a pending approval question and decides what to do next.

use actl_types::{first_matching_token, Intent};

use crate::adapter::{LlmAdapter, CLASSIFIER_MAX_NEW_TOKENS};
use crate::error::LlmError;

pub struct IntentClassifier<'a> {
    adapter: &'a dyn LlmAdapter,
    system_prompt: &'a str,
}

impl<'a> IntentClassifier<'a> {
    pub fn new(adapter: &'a dyn LlmAdapter, system_prompt: &'a str) -> Self {
        IntentClassifier { adapter, system_prompt }
    }

    /// Classify `user_input`, falling back to [`Intent::Negative`] when
    /// the model's reply doesn't contain a recognized whole word — an
    /// unrecognized answer to an approval question should never be read
    /// as consent.
    pub fn classify(&self, user_input: &str) -> Result<Intent, LlmError> {
        let raw = self
            .adapter
            .generate(self.system_prompt, user_input, CLASSIFIER_MAX_NEW_TOKENS)?;
        let matched = first_matching_token(&raw, &["positive", "negative", "revise", "direct"]);
        Ok(match matched {
            Some("positive") => Intent::Positive,
            Some("revise") => Intent::Revise,
            Some("direct") => Intent::Direct,
            _ => Intent::Negative,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StubLlmAdapter;

    #[test]
    fn classifies_positive_intent() {
        let stub = StubLlmAdapter::new(vec!["positive".to_string()]);
        let classifier = IntentClassifier::new(&stub, "sys");
        assert_eq!(classifier.classify("yes that's right").unwrap(), Intent::Positive);
    }

    #[test]
    fn unrecognized_reply_defaults_to_negative_not_consent() {
        let stub = StubLlmAdapter::new(vec!["uh what?".to_string()]);
        let classifier = IntentClassifier::new(&stub, "sys");
        assert_eq!(classifier.classify("huh").unwrap(), Intent::Negative);
    }
}
