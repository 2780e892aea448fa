//! Per-tab workflow state and the `basename(url)`-stripped-`.git` helper
//! invariant 3 depends on.

use crate::task::Reply;

pub type TabId = i64;

/// Default script `run_in_venv` targets when the user never customized it.
pub const DEFAULT_EXECUTE_FILE: &str = "train.py";

/// State tracked per tab across the clone → scan → summarize → approve →
/// edit → run workflow. Created on the first `user_input_normal`
/// classified as `git` or `code`; destroyed on tab close or shutdown.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub tab_id: TabId,
    pub last_git_url: Option<String>,
    pub last_dir_name: Option<String>,
    /// The last successful `read_py_files` Reply.
    pub py_files: Option<Reply>,
    pub execute_file: String,
}

impl WorkflowState {
    pub fn new(tab_id: TabId) -> Self {
        WorkflowState {
            tab_id,
            last_git_url: None,
            last_dir_name: None,
            py_files: None,
            execute_file: DEFAULT_EXECUTE_FILE.to_string(),
        }
    }
}

/// `basename(git_url)` with a trailing `.git` stripped. Empty or missing
/// input falls back to `"repo"`.
pub fn extract_repo_name(git_url: &str) -> String {
    let trimmed = git_url.trim_end_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or("");
    if name.is_empty() {
        return "repo".to_string();
    }
    name.strip_suffix(".git").unwrap_or(name).to_string()
}
