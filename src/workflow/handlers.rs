//! The per-tab workflow state machine: clone → scan → summarize →
//! approve → optionally edit → create venv → run. Each handler reacts to
//! one Executor Reply (or one normalized user-input event), mutates the
//! active tab's `WorkflowState`, and either issues the next Task, pushes
//! a pending approval, or reports a terminal outcome to the Bridge.

use std::sync::Arc;

use actl_llm::{CommandRouter, IntentClassifier};
use actl_types::{
    extract_repo_name, Command, ControllerError, Intent, OutboundBridgeMessage, OutboundKind, PendingAction,
    PendingKind, Reply, Target, Task,
};
use serde_json::{Map, Value};

use crate::context::AppContext;
use crate::{log_error, log_info, log_warn};

/// `Value::to_string` JSON-quotes plain strings; unwrap those so bridge
/// text reads as plain prose instead of `"like this"`.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn metadata_with_tab(tab_id: i64, extra: impl IntoIterator<Item = (&'static str, Value)>) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("tabId".to_string(), Value::from(tab_id));
    for (k, v) in extra {
        metadata.insert(k.to_string(), v);
    }
    metadata
}

async fn report_failure(ctx: &AppContext, tab_id: i64, reply: &Reply) {
    let err = ControllerError::ExecutorActionFailed {
        action: reply.action.clone(),
        stderr: reply.stderr().unwrap_or("unknown error").to_string(),
    };
    log_error!(tab_id, "{err}");
    ctx.tell_bridge(OutboundBridgeMessage::text(OutboundKind::Error, err.to_string(), Some(tab_id)))
        .await;
}

/// Split an LLM edit response into `(filename, contents)` sections
/// delimited by `### filename` header lines, the same convention the
/// edit prompt asks the model to follow. A response with no headers at
/// all yields an empty list rather than guessing at a filename.
fn parse_edit_sections(raw: &str) -> Vec<(String, String)> {
    let mut sections = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;
    for line in raw.lines() {
        if let Some(name) = line.strip_prefix("### ") {
            if let Some((filename, buffer)) = current.take() {
                sections.push((filename, buffer.join("\n").trim().to_string()));
            }
            current = Some((name.trim().to_string(), Vec::new()));
        } else if let Some((_, buffer)) = current.as_mut() {
            buffer.push(line);
        }
    }
    if let Some((filename, buffer)) = current {
        sections.push((filename, buffer.join("\n").trim().to_string()));
    }
    sections
}

/// `clone_repo` success: extract `git_url`, compute `dir_name`, store
/// into the active `WorkflowState`, then issue `read_py_files`.
pub async fn handle_clone_repo(ctx: Arc<AppContext>, reply: Reply) -> Result<(), ControllerError> {
    let tab_id = reply
        .tab_id()
        .ok_or_else(|| ControllerError::BadUserInput("clone_repo reply missing tabId".to_string()))?;

    if !reply.is_success() {
        report_failure(&ctx, tab_id, &reply).await;
        return Ok(());
    }

    let git_url = reply
        .get_str("git_url")
        .ok_or_else(|| ControllerError::BadUserInput("clone_repo reply missing git_url".to_string()))?
        .to_string();
    let dir_name = extract_repo_name(&git_url);

    {
        let mut tabs = ctx.tabs.lock().unwrap();
        if let Some(state) = tabs.get_mut(tab_id) {
            state.last_git_url = Some(git_url.clone());
            state.last_dir_name = Some(dir_name.clone());
        }
    }

    log_info!(tab_id, "cloned {git_url} into {dir_name}");
    ctx.tell_bridge(OutboundBridgeMessage::text(
        OutboundKind::Info,
        format!("Cloned into {dir_name}"),
        Some(tab_id),
    ))
    .await;

    let task = Task::new("git", "read_py_files")
        .with_metadata(metadata_with_tab(tab_id, [("dir_path", Value::from(dir_name))]));
    ctx.send_task(task).await
}

/// `read_py_files` success: store the Reply as `pyFiles`, summarize via
/// the LLM, and push a `read_py_files` pending approval.
pub async fn handle_read_py_files(ctx: Arc<AppContext>, reply: Reply) -> Result<(), ControllerError> {
    let tab_id = reply
        .tab_id()
        .ok_or_else(|| ControllerError::BadUserInput("read_py_files reply missing tabId".to_string()))?;

    if !reply.is_success() {
        report_failure(&ctx, tab_id, &reply).await;
        return Ok(());
    }

    let files_blob = reply.stdout().map(stringify).unwrap_or_default();

    {
        let mut tabs = ctx.tabs.lock().unwrap();
        if let Some(state) = tabs.get_mut(tab_id) {
            state.py_files = Some(reply.clone());
        }
    }

    let summary = ctx
        .llm
        .lock()
        .unwrap()
        .run_with_prompt(&ctx.prompts.summarize_experiment, &files_blob, true)
        .map_err(|e| ControllerError::LlmUnavailable(e.to_string()))?;

    ctx.tell_bridge(OutboundBridgeMessage::text(OutboundKind::Summary, summary.clone(), Some(tab_id)))
        .await;

    let mut summarized_reply = reply;
    summarized_reply.metadata.insert("summary".to_string(), Value::from(summary));

    let pending = PendingAction::new(PendingKind::ReadPyFiles, summarized_reply, tab_id);
    ctx.tell_bridge(OutboundBridgeMessage::text(
        OutboundKind::PendingRequest,
        PendingKind::ReadPyFiles.prompt(),
        Some(tab_id),
    ))
    .await;
    ctx.pending.push(pending);
    Ok(())
}

/// `user_input_pending` against a `read_py_files` pending item:
/// `positive` issues `create_venv`; anything else cancels the workflow.
pub async fn handle_read_py_files_response(
    ctx: Arc<AppContext>,
    pending: PendingAction,
    intent: Intent,
) -> Result<(), ControllerError> {
    let tab_id = pending.tab_id;
    match intent {
        Intent::Positive | Intent::Direct => {
            let dir_name = ctx
                .tabs
                .lock()
                .unwrap()
                .get(tab_id)
                .and_then(|s| s.last_dir_name.clone())
                .ok_or_else(|| ControllerError::BadUserInput("no dir_name for tab".to_string()))?;

            let task = Task::new("git", "create_venv").with_metadata(metadata_with_tab(
                tab_id,
                [
                    ("dir_path", Value::from(dir_name)),
                    ("requirements", Value::from("requirements.txt")),
                ],
            ));
            ctx.send_task(task).await
        }
        Intent::Negative | Intent::Revise => {
            log_warn!(tab_id, "user declined read_py_files summary, cancelling workflow");
            ctx.tell_bridge(OutboundBridgeMessage::text(
                OutboundKind::SupervisorLog,
                "Workflow cancelled.",
                Some(tab_id),
            ))
            .await;
            Ok(())
        }
    }
}

/// `create_venv` success: push a `git_edit_request` pending approval.
pub async fn handle_create_venv(ctx: Arc<AppContext>, reply: Reply) -> Result<(), ControllerError> {
    let tab_id = reply
        .tab_id()
        .ok_or_else(|| ControllerError::BadUserInput("create_venv reply missing tabId".to_string()))?;

    if !reply.is_success() {
        report_failure(&ctx, tab_id, &reply).await;
        return Ok(());
    }

    ctx.tell_bridge(OutboundBridgeMessage::text(
        OutboundKind::PendingRequest,
        PendingKind::GitEditRequest.prompt(),
        Some(tab_id),
    ))
    .await;
    ctx.pending.push(PendingAction::new(PendingKind::GitEditRequest, reply, tab_id));
    Ok(())
}

fn build_run_in_venv_task(tab_id: i64, dir_name: &str, execute_file: &str) -> Task {
    Task::new("git", "run_in_venv")
        .with_target(Target::single(execute_file))
        .with_metadata(metadata_with_tab(
            tab_id,
            [
                ("cwd", Value::from(dir_name)),
                ("venv_path", Value::from(format!("{dir_name}/venv"))),
            ],
        ))
}

/// `user_input_pending` against a `git_edit_request` pending item:
/// `revise` asks the LLM for an edit and issues `edit`; `direct`/`positive`
/// goes straight to `run_in_venv`; `negative` cancels.
pub async fn handle_git_edit_request_response(
    ctx: Arc<AppContext>,
    pending: PendingAction,
    intent: Intent,
    user_text: &str,
) -> Result<(), ControllerError> {
    let tab_id = pending.tab_id;
    let (dir_name, execute_file, py_files) = {
        let tabs = ctx.tabs.lock().unwrap();
        let state = tabs
            .get(tab_id)
            .ok_or_else(|| ControllerError::BadUserInput("unknown tab".to_string()))?;
        let dir_name = state
            .last_dir_name
            .clone()
            .ok_or_else(|| ControllerError::BadUserInput("no dir_name for tab".to_string()))?;
        let py_files = state
            .py_files
            .clone()
            .ok_or_else(|| ControllerError::BadUserInput("pyFiles must be set before an edit".to_string()))?;
        (dir_name, state.execute_file.clone(), py_files)
    };

    match intent {
        Intent::Revise => {
            let files_blob = py_files.stdout().map(stringify).unwrap_or_default();
            let edit_prompt = format!("{user_text}\n\n---\n{files_blob}");
            let edited = ctx
                .llm
                .lock()
                .unwrap()
                .run_with_prompt(&ctx.prompts.edit, &edit_prompt, true)
                .map_err(|e| ControllerError::LlmUnavailable(e.to_string()))?;

            let sections = parse_edit_sections(&edited);
            let mut metadata = metadata_with_tab(tab_id, []);
            let targets: Vec<String> = if sections.is_empty() {
                // No `### filename` headers in the reply: treat the whole
                // response as the active tab's execute file.
                let filename = format!("{dir_name}/{execute_file}");
                metadata.insert(filename.clone(), Value::from(edited));
                vec![filename]
            } else {
                sections
                    .into_iter()
                    .map(|(name, content)| {
                        let path = format!("{dir_name}/{name}");
                        metadata.insert(path.clone(), Value::from(content));
                        path
                    })
                    .collect()
            };

            let task = Task::new("git", "edit")
                .with_target(Target::Many(targets))
                .with_metadata(metadata);
            ctx.send_task(task).await
        }
        Intent::Direct | Intent::Positive => {
            let task = build_run_in_venv_task(tab_id, &dir_name, &execute_file);
            ctx.send_task(task).await
        }
        Intent::Negative => {
            log_warn!(tab_id, "user declined to proceed, cancelling workflow");
            ctx.tell_bridge(OutboundBridgeMessage::text(
                OutboundKind::SupervisorLog,
                "Workflow cancelled.",
                Some(tab_id),
            ))
            .await;
            Ok(())
        }
    }
}

/// `edit` success: show the new file contents and push a
/// `git_edit_confirm` pending approval.
pub async fn handle_edit(ctx: Arc<AppContext>, reply: Reply) -> Result<(), ControllerError> {
    let tab_id = reply
        .tab_id()
        .ok_or_else(|| ControllerError::BadUserInput("edit reply missing tabId".to_string()))?;

    if !reply.is_success() {
        report_failure(&ctx, tab_id, &reply).await;
        return Ok(());
    }

    let diff_text = reply.stdout().map(stringify).unwrap_or_default();
    ctx.tell_bridge(OutboundBridgeMessage::text(OutboundKind::Diff, diff_text, Some(tab_id)))
        .await;

    ctx.tell_bridge(OutboundBridgeMessage::text(
        OutboundKind::PendingRequest,
        PendingKind::GitEditConfirm.prompt(),
        Some(tab_id),
    ))
    .await;
    ctx.pending.push(PendingAction::new(PendingKind::GitEditConfirm, reply, tab_id));
    Ok(())
}

/// `user_input_pending` against a `git_edit_confirm` pending item.
pub async fn handle_git_edit_confirm_response(
    ctx: Arc<AppContext>,
    pending: PendingAction,
    intent: Intent,
) -> Result<(), ControllerError> {
    let tab_id = pending.tab_id;
    match intent {
        Intent::Positive | Intent::Direct => {
            let (dir_name, execute_file) = {
                let tabs = ctx.tabs.lock().unwrap();
                let state = tabs
                    .get(tab_id)
                    .ok_or_else(|| ControllerError::BadUserInput("unknown tab".to_string()))?;
                (
                    state
                        .last_dir_name
                        .clone()
                        .ok_or_else(|| ControllerError::BadUserInput("no dir_name for tab".to_string()))?,
                    state.execute_file.clone(),
                )
            };
            let task = build_run_in_venv_task(tab_id, &dir_name, &execute_file);
            ctx.send_task(task).await
        }
        Intent::Negative => {
            ctx.tell_bridge(OutboundBridgeMessage::text(
                OutboundKind::SupervisorLog,
                "Workflow cancelled.",
                Some(tab_id),
            ))
            .await;
            Ok(())
        }
        Intent::Revise => {
            ctx.tell_bridge(OutboundBridgeMessage::text(
                OutboundKind::PendingRequest,
                PendingKind::GitEditRequest.prompt(),
                Some(tab_id),
            ))
            .await;
            ctx.pending.push(PendingAction::new(PendingKind::GitEditRequest, pending.msg, tab_id));
            Ok(())
        }
    }
}

/// `run_in_venv`: terminal step. Success forwards `stdout` as a `result`;
/// failure forwards `stderr` as an `error`.
pub async fn handle_run_in_venv(ctx: Arc<AppContext>, reply: Reply) -> Result<(), ControllerError> {
    let tab_id = reply
        .tab_id()
        .ok_or_else(|| ControllerError::BadUserInput("run_in_venv reply missing tabId".to_string()))?;

    if reply.is_success() {
        let stdout = reply.stdout().map(stringify).unwrap_or_default();
        log_info!(tab_id, "run_in_venv complete");
        ctx.tell_bridge(OutboundBridgeMessage::text(OutboundKind::Result, stdout, Some(tab_id)))
            .await;
    } else {
        report_failure(&ctx, tab_id, &reply).await;
    }
    Ok(())
}

/// A fresh `user_input_normal` event classified as `git`: allocate (or
/// reuse) a tab and kick off the clone.
pub async fn handle_user_input_normal(ctx: Arc<AppContext>, tab_id: i64, text: &str) -> Result<(), ControllerError> {
    let command = {
        let llm = ctx.llm.lock().unwrap();
        let router = CommandRouter::new(llm.as_ref(), &ctx.prompts.classifier);
        router
            .classify(text)
            .map_err(|e| ControllerError::LlmUnavailable(e.to_string()))?
    };

    match command {
        Command::Git => {
            let git_url = ctx
                .llm
                .lock()
                .unwrap()
                .run_with_prompt(&ctx.prompts.git, text, command.is_persistent())
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|_| text.trim().to_string());

            let task = Task::new("git", "clone_repo")
                .with_metadata(metadata_with_tab(tab_id, [("git_url", Value::from(git_url))]));
            ctx.send_task(task).await
        }
        Command::Code => {
            log_info!(tab_id, "command classified as code (no-op in this workflow)");
            Ok(())
        }
        Command::Train => {
            log_info!(tab_id, "command classified as train (no-op; unrecognized by this workflow's dispatch table)");
            Ok(())
        }
        Command::Conversation => {
            let reply_text = ctx
                .llm
                .lock()
                .unwrap()
                .run_with_prompt(&ctx.prompts.conversation, text, command.is_persistent())
                .map_err(|e| ControllerError::LlmUnavailable(e.to_string()))?;
            ctx.tell_bridge(OutboundBridgeMessage::text(OutboundKind::MainInput, reply_text, Some(tab_id)))
                .await;
            Ok(())
        }
    }
}

/// `user_input_pending`: classify the user's reply to the head pending
/// item's question and route to the matching response handler.
pub async fn handle_user_input_pending(
    ctx: Arc<AppContext>,
    pending: PendingAction,
    text: &str,
) -> Result<(), ControllerError> {
    let question = pending.kind.prompt();
    let intent = {
        let llm = ctx.llm.lock().unwrap();
        let classifier = IntentClassifier::new(llm.as_ref(), &ctx.prompts.intent_classifier);
        classifier
            .classify(&format!("Q: {question}\nA: {text}"))
            .map_err(|e| ControllerError::LlmUnavailable(e.to_string()))?
    };

    match pending.kind {
        PendingKind::ReadPyFiles => handle_read_py_files_response(ctx, pending, intent).await,
        PendingKind::GitEditRequest => handle_git_edit_request_response(ctx, pending, intent, text).await,
        PendingKind::GitEditConfirm => handle_git_edit_confirm_response(ctx, pending, intent).await,
    }
}
