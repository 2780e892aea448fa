//! The prompts file: system prompts for the two classifiers and the three
//! LLM-backed workflow steps, loaded once at startup.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default path, mirroring the original source's `prompts.yaml` layout.
pub const DEFAULT_PROMPTS_PATH: &str = "config/prompts.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSet {
    pub classifier: String,
    pub intent_classifier: String,
    pub git: String,
    pub summarize_experiment: String,
    pub edit: String,
    pub conversation: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        PromptSet {
            classifier: "Classify the user's request as one of: git, code, train, conversation. \
                Respond with exactly one word."
                .to_string(),
            intent_classifier: "Classify the user's reply to the question as one of: positive, \
                negative, revise, direct. Respond with exactly one word."
                .to_string(),
            git: "Extract the git clone URL from the user's request. Respond with only the URL."
                .to_string(),
            summarize_experiment: "Summarize the experiment in this repository. Produce a \
                [System Summary] section and a [User Summary] section."
                .to_string(),
            edit: "Given the user's requested change and the repository's Python files, produce \
                the edited file contents."
                .to_string(),
            conversation: "You are a helpful assistant.".to_string(),
        }
    }
}

/// Parse error while loading the prompts file.
#[derive(Debug, thiserror::Error)]
pub enum PromptLoadError {
    #[error("failed to read prompts file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse prompts file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Load the prompts file, falling back to hardcoded defaults (with a
/// logged warning) when it is missing, matching the same degrade-gracefully
/// policy the sampler config loader uses.
pub fn load_prompts(path: impl AsRef<Path>) -> PromptSet {
    let path_ref = path.as_ref();
    match fs::read_to_string(path_ref) {
        Ok(content) => match serde_yaml::from_str::<PromptSet>(&content) {
            Ok(prompts) => prompts,
            Err(e) => {
                log::warn!(
                    "failed to parse prompts file {}: {e}, using defaults",
                    path_ref.display()
                );
                PromptSet::default()
            }
        },
        Err(_) => {
            log::warn!(
                "prompts file {} not found, using defaults",
                path_ref.display()
            );
            PromptSet::default()
        }
    }
}
