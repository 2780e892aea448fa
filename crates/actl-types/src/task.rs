//! Task/Reply — the Controller ↔ Executor wire schemas.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `target` names one file, several files, or nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Single(String),
    Many(Vec<String>),
}

impl Target {
    pub fn single(s: impl Into<String>) -> Self {
        Target::Single(s.into())
    }

    /// The primary path, whichever form `target` took.
    pub fn first(&self) -> Option<&str> {
        match self {
            Target::Single(s) => Some(s.as_str()),
            Target::Many(v) => v.first().map(String::as_str),
        }
    }
}

/// A Controller → Executor command envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub command: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Task {
    pub fn new(command: impl Into<String>, action: impl Into<String>) -> Self {
        Task {
            command: command.into(),
            action: action.into(),
            target: None,
            metadata: None,
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// `metadata.tabId`, if present and representable as an `i64`.
    pub fn tab_id(&self) -> Option<i64> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("tabId"))
            .and_then(Value::as_i64)
    }
}

/// Whether an Executor action completed or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyResult {
    Success,
    Fail,
}

/// An Executor → Controller result envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub command: String,
    pub action: String,
    pub result: ReplyResult,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.result == ReplyResult::Success
    }

    pub fn tab_id(&self) -> Option<i64> {
        self.metadata.get("tabId").and_then(Value::as_i64)
    }

    pub fn stdout(&self) -> Option<&Value> {
        self.metadata.get("stdout")
    }

    pub fn stderr(&self) -> Option<&str> {
        self.metadata.get("stderr").and_then(Value::as_str)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_round_trips_through_json() {
        let task = Task::new("git", "clone_repo").with_metadata({
            let mut m = Map::new();
            m.insert("git_url".into(), Value::from("https://example.com/a/b.git"));
            m.insert("tabId".into(), Value::from(2));
            m
        });
        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back.command, "git");
        assert_eq!(back.tab_id(), Some(2));
    }

    #[test]
    fn reply_fail_exposes_stderr() {
        let json = serde_json::json!({
            "command": "git",
            "action": "clone_repo",
            "result": "fail",
            "metadata": {"stderr": "fatal: repository not found", "tabId": 2}
        });
        let reply: Reply = serde_json::from_value(json).unwrap();
        assert!(!reply.is_success());
        assert_eq!(reply.stderr(), Some("fatal: repository not found"));
        assert_eq!(reply.tab_id(), Some(2));
    }

    #[test]
    fn target_many_first_returns_primary_path() {
        let t = Target::Many(vec!["train.py".into(), "utils.py".into()]);
        assert_eq!(t.first(), Some("train.py"));
    }
}
