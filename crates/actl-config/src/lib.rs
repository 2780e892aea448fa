//! Configuration loading: the YAML prompts file and the JSON runtime
//! config, both falling back to hardcoded defaults when absent.

pub mod config;
pub mod prompts;

pub use config::{ConfigSaveError, ControllerConfig, DEFAULT_CONFIG_PATH};
pub use prompts::{load_prompts, PromptLoadError, PromptSet, DEFAULT_PROMPTS_PATH};
