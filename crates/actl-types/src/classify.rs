//! Closed enums produced by the two LLM classifiers, and the shared
//! first-matching-token normalizer they both use.

use serde::{Deserialize, Serialize};

/// What a user request is about, per the Command Router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Git,
    Code,
    Train,
    Conversation,
}

impl Command {
    /// `conversation` is the only command whose LLM conversation memory
    /// persists across turns.
    pub fn is_persistent(self) -> bool {
        matches!(self, Command::Conversation)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Command::Git => "git",
            Command::Code => "code",
            Command::Train => "train",
            Command::Conversation => "conversation",
        }
    }
}

/// A user's intent in response to a pending approval question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Positive,
    Negative,
    Revise,
    Direct,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Positive => "positive",
            Intent::Negative => "negative",
            Intent::Revise => "revise",
            Intent::Direct => "direct",
        }
    }
}

/// Normalize raw LLM output into whitespace-delimited, letters-only tokens
/// and return the first one that matches a candidate exactly.
///
/// A plain "strip everything but letters, then substring-match" (as the
/// original classifier did) lets an unrelated phrase accidentally contain a
/// candidate as a substring once whitespace is gone. Matching whole tokens
/// avoids that without changing the result for any well-behaved classifier
/// output (a single short word, per `max_new_tokens=8`).
pub fn first_matching_token<'a>(raw: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let tokens: Vec<String> = raw
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphabetic())
                .flat_map(|c| c.to_lowercase())
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .collect();

    candidates
        .iter()
        .find(|cand| tokens.iter().any(|t| t == *cand))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_single_word_output() {
        assert_eq!(first_matching_token("Git", &["git", "code"]), Some("git"));
    }

    #[test]
    fn does_not_match_substring_inside_an_unrelated_word() {
        // "revising" contains "revis" but not the whole token "revise".
        assert_eq!(
            first_matching_token("not revising now", &["revise", "direct"]),
            None
        );
    }

    #[test]
    fn returns_first_candidate_in_priority_order_not_token_order() {
        assert_eq!(
            first_matching_token("code train", &["train", "code"]),
            Some("train")
        );
    }

    #[test]
    fn empty_input_matches_nothing() {
        assert_eq!(first_matching_token("", &["git"]), None);
    }
}
