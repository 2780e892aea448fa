//! End-to-end scenarios driving the controller against a real executor
//! socket and a real bridge WebSocket, both played by a small test double
//! in this file. Exercises the full clone → scan → summarize → approve →
//! run happy path, and a clone failure.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Map, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use actl::context::AppContext;
use actl::workflow;
use actl_config::{ControllerConfig, PromptSet};
use actl_llm::StubLlmAdapter;
use actl_transport::{spawn_bridge, spawn_executor, BridgeLinkConfig};
use actl_types::{
    normalize_inbound_type, Intent, NormalizedAction, OutboundBridgeMessage, OutboundKind, PendingAction, PendingKind,
    Reply, ReplyResult, Target, Task, UserMessage,
};

async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Connects to the controller's executor port and answers whatever Task it
/// is sent with a successful Reply carrying the given metadata.
async fn fake_executor_reply_once(addr: &str, extra_metadata: Map<String, Value>) -> Task {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut read_half, mut write_half) = stream.into_split();
    let task: Task = actl_transport::read_frame(&mut read_half).await.unwrap().unwrap();

    let mut metadata = task.metadata.clone().unwrap_or_default();
    for (k, v) in extra_metadata {
        metadata.insert(k, v);
    }
    let reply = Reply {
        command: task.command.clone(),
        action: task.action.clone(),
        result: ReplyResult::Success,
        metadata,
    };
    actl_transport::write_frame(&mut write_half, &reply).await.unwrap();
    task
}

async fn fake_executor_fail_once(addr: &str, stderr: &str) -> Task {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut read_half, mut write_half) = stream.into_split();
    let task: Task = actl_transport::read_frame(&mut read_half).await.unwrap().unwrap();

    let mut metadata = task.metadata.clone().unwrap_or_default();
    metadata.insert("stderr".to_string(), Value::from(stderr));
    let reply = Reply {
        command: task.command.clone(),
        action: task.action.clone(),
        result: ReplyResult::Fail,
        metadata,
    };
    actl_transport::write_frame(&mut write_half, &reply).await.unwrap();
    task
}

/// Runs a minimal WS server speaking the Bridge protocol: accepts one
/// connection, expects the `supervisor_connected` hello, and returns the
/// split sink/stream so the test can push `UserMessage`s and read back
/// `OutboundBridgeMessage`s.
async fn accept_fake_bridge(
    listener: TcpListener,
) -> (
    futures_util::stream::SplitSink<
        tokio_tungstenite::WebSocketStream<TcpStream>,
        Message,
    >,
    futures_util::stream::SplitStream<tokio_tungstenite::WebSocketStream<TcpStream>>,
) {
    let (stream, _) = listener.accept().await.unwrap();
    let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
    let (sink, mut stream) = ws.split();
    // Drain the hello frame.
    let hello = stream.next().await.unwrap().unwrap();
    assert!(matches!(hello, Message::Text(_)));
    (sink, stream)
}

fn ctx_with_links(
    executor: actl_transport::ExecutorHandle,
    bridge: actl_transport::BridgeHandle,
    llm_scripts: Vec<String>,
) -> Arc<AppContext> {
    Arc::new(AppContext::new(
        executor,
        bridge,
        ControllerConfig::default(),
        PromptSet::default(),
        Box::new(StubLlmAdapter::new(llm_scripts)),
    ))
}

#[tokio::test]
async fn happy_path_clone_through_run() {
    let executor_port = free_port().await;
    let bridge_port = free_port().await;
    let bridge_url = format!("ws://127.0.0.1:{bridge_port}/ws/supervisor");

    let (exec_inbound_tx, mut exec_inbound_rx) = tokio::sync::mpsc::unbounded_channel::<Reply>();
    let executor = spawn_executor(executor_port, exec_inbound_tx).await.unwrap();

    let bridge_listener = TcpListener::bind(("127.0.0.1", bridge_port)).await.unwrap();
    let bridge_config = BridgeLinkConfig {
        url: bridge_url,
        reconnect_initial_secs: 1,
        reconnect_ceiling_secs: 10,
        ping_interval_secs: 20,
        ping_timeout_secs: 20,
        outbound_queue_capacity: 100,
    };
    let (bridge_inbound_tx, _bridge_inbound_rx) = tokio::sync::mpsc::unbounded_channel::<UserMessage>();
    let bridge = spawn_bridge(bridge_config, bridge_inbound_tx);

    let (mut bridge_sink, mut bridge_stream) = accept_fake_bridge(bridge_listener).await;

    // First scripted reply drives the command router to "git"; after an
    // explicit reset the second drives both intent-classifier calls below
    // to "positive".
    let ctx = ctx_with_links(executor, bridge, vec!["git".to_string(), "positive".to_string()]);
    let dispatcher = Arc::new(workflow::build_dispatcher());

    let addr = format!("127.0.0.1:{executor_port}");

    // Drive the reply-dispatch loop manually, one step per expected Task.
    let ctx2 = ctx.clone();
    let dispatcher2 = dispatcher.clone();
    let reply_driver = tokio::spawn(async move {
        while let Some(reply) = exec_inbound_rx.recv().await {
            dispatcher2.dispatch(ctx2.clone(), reply).await.unwrap();
        }
    });

    let tab_id = ctx.route_tab(None);
    workflow::handlers::handle_user_input_normal(ctx.clone(), tab_id, "https://example.com/owner/repo.git")
        .await
        .unwrap();

    let mut metadata = Map::new();
    metadata.insert("git_url".to_string(), Value::from("https://example.com/owner/repo.git"));
    let _clone_task = fake_executor_reply_once(&addr, metadata).await;

    // read_py_files Task arrives next; answer it with some file content.
    let mut metadata = Map::new();
    metadata.insert("stdout".to_string(), Value::from("print('hello')"));
    let _read_task = fake_executor_reply_once(&addr, metadata).await;

    // Summary is pushed to the bridge as a pending_request; wait for it.
    let msg = bridge_stream.next().await.unwrap().unwrap();
    assert!(matches!(msg, Message::Text(_)));

    // Advance the stub past the command-routing step so the intent
    // classifier sees "positive" for both approvals below.
    ctx.llm.lock().unwrap().reset().unwrap();

    // User approves: positive -> create_venv.
    let pending = fake_pending_for(&ctx);
    workflow::handlers::handle_user_input_pending(ctx.clone(), pending, "looks good")
        .await
        .unwrap();

    let _venv_task = fake_executor_reply_once(&addr, Map::new()).await;

    // git_edit_request pending pushed; user goes direct.
    let pending = fake_pending_for(&ctx);
    workflow::handlers::handle_user_input_pending(ctx.clone(), pending, "just run it")
        .await
        .unwrap();

    let run_task = fake_executor_reply_once(&addr, {
        let mut m = Map::new();
        m.insert("stdout".to_string(), Value::from("epoch 1: acc=0.9"));
        m
    })
    .await;
    assert_eq!(run_task.action, "run_in_venv");

    tokio::time::sleep(Duration::from_millis(50)).await;
    reply_driver.abort();
    let _ = bridge_sink.send(Message::Close(None)).await;
}

/// Re-fetches whatever the last test step pushed onto the pending queue,
/// since the stub LLM only ever needs the head item.
fn fake_pending_for(ctx: &AppContext) -> actl_types::PendingAction {
    ctx.pending.pop_front().expect("expected a pending approval to have been queued")
}

#[tokio::test]
async fn clone_failure_reports_error_and_does_not_proceed() {
    let executor_port = free_port().await;
    let bridge_port = free_port().await;
    let bridge_url = format!("ws://127.0.0.1:{bridge_port}/ws/supervisor");

    let (exec_inbound_tx, mut exec_inbound_rx) = tokio::sync::mpsc::unbounded_channel::<Reply>();
    let executor = spawn_executor(executor_port, exec_inbound_tx).await.unwrap();

    let bridge_listener = TcpListener::bind(("127.0.0.1", bridge_port)).await.unwrap();
    let bridge_config = BridgeLinkConfig {
        url: bridge_url,
        reconnect_initial_secs: 1,
        reconnect_ceiling_secs: 10,
        ping_interval_secs: 20,
        ping_timeout_secs: 20,
        outbound_queue_capacity: 100,
    };
    let (bridge_inbound_tx, _bridge_inbound_rx) = tokio::sync::mpsc::unbounded_channel::<UserMessage>();
    let bridge = spawn_bridge(bridge_config, bridge_inbound_tx);
    let (mut bridge_sink, mut bridge_stream) = accept_fake_bridge(bridge_listener).await;

    let ctx = ctx_with_links(executor, bridge, vec!["git".to_string()]);
    let dispatcher = Arc::new(workflow::build_dispatcher());

    let ctx2 = ctx.clone();
    let dispatcher2 = dispatcher.clone();
    let reply_driver = tokio::spawn(async move {
        while let Some(reply) = exec_inbound_rx.recv().await {
            dispatcher2.dispatch(ctx2.clone(), reply).await.unwrap();
        }
    });

    let tab_id = ctx.route_tab(None);
    workflow::handlers::handle_user_input_normal(ctx.clone(), tab_id, "https://bad.example/nope.git")
        .await
        .unwrap();

    let addr = format!("127.0.0.1:{executor_port}");
    let _clone_task = fake_executor_fail_once(&addr, "fatal: repository not found").await;

    let msg = bridge_stream.next().await.unwrap().unwrap();
    let Message::Text(text) = msg else { panic!("expected text frame") };
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["type"], "error");
    assert!(parsed["text"].as_str().unwrap().contains("not found"));

    assert!(ctx.pending.is_empty());

    tokio::time::sleep(Duration::from_millis(20)).await;
    reply_driver.abort();
    let _ = bridge_sink.send(Message::Close(None)).await;
}

/// `revise` against a `git_edit_request` pending item, where the LLM's
/// reply carries more than one `### filename` section. Exercises the
/// multi-file edit path end to end: the resulting `edit` Task must carry
/// every parsed file as its target, each with its own metadata entry.
#[tokio::test]
async fn revise_with_multiple_file_sections_issues_a_many_target_edit_task() {
    let executor_port = free_port().await;
    let bridge_port = free_port().await;
    let bridge_url = format!("ws://127.0.0.1:{bridge_port}/ws/supervisor");

    let (exec_inbound_tx, _exec_inbound_rx) = tokio::sync::mpsc::unbounded_channel::<Reply>();
    let executor = spawn_executor(executor_port, exec_inbound_tx).await.unwrap();

    let bridge_listener = TcpListener::bind(("127.0.0.1", bridge_port)).await.unwrap();
    let bridge_config = BridgeLinkConfig {
        url: bridge_url,
        reconnect_initial_secs: 1,
        reconnect_ceiling_secs: 10,
        ping_interval_secs: 20,
        ping_timeout_secs: 20,
        outbound_queue_capacity: 100,
    };
    let (bridge_inbound_tx, _bridge_inbound_rx) = tokio::sync::mpsc::unbounded_channel::<UserMessage>();
    let bridge = spawn_bridge(bridge_config, bridge_inbound_tx);
    let (mut bridge_sink, _bridge_stream) = accept_fake_bridge(bridge_listener).await;

    let edited = "### file_a.py\nprint('a')\n\n### file_b.py\nprint('b')".to_string();
    let ctx = ctx_with_links(executor, bridge, vec![edited]);

    let tab_id = ctx.route_tab(None);
    let py_files = Reply {
        command: "git".to_string(),
        action: "read_py_files".to_string(),
        result: ReplyResult::Success,
        metadata: {
            let mut m = Map::new();
            m.insert("stdout".to_string(), Value::from("print('old')"));
            m
        },
    };
    {
        let mut tabs = ctx.tabs.lock().unwrap();
        let state = tabs.get_mut(tab_id).unwrap();
        state.last_dir_name = Some("repo".to_string());
        state.py_files = Some(py_files.clone());
    }
    let pending = PendingAction::new(PendingKind::GitEditRequest, py_files, tab_id);

    workflow::handlers::handle_git_edit_request_response(ctx.clone(), pending, Intent::Revise, "please fix the bug")
        .await
        .unwrap();

    let addr = format!("127.0.0.1:{executor_port}");
    let task = fake_executor_reply_once(&addr, Map::new()).await;
    assert_eq!(task.action, "edit");
    match task.target {
        Some(Target::Many(targets)) => {
            assert_eq!(targets, vec!["repo/file_a.py".to_string(), "repo/file_b.py".to_string()]);
        }
        other => panic!("expected Target::Many, got {other:?}"),
    }
    let metadata = task.metadata.expect("edit task should carry file contents in metadata");
    assert_eq!(metadata.get("repo/file_a.py").and_then(Value::as_str), Some("print('a')"));
    assert_eq!(metadata.get("repo/file_b.py").and_then(Value::as_str), Some("print('b')"));

    let _ = bridge_sink.send(Message::Close(None)).await;
}

/// An explicit `reset` message clears the adapter's conversation memory
/// and tells the Bridge it happened, the same pair of effects the
/// controller's `user_message` listener performs for a `Reset`-classified
/// event.
#[tokio::test]
async fn reset_clears_conversation_memory_and_notifies_bridge() {
    assert_eq!(normalize_inbound_type("reset"), Some(NormalizedAction::Reset));

    let executor_port = free_port().await;
    let bridge_port = free_port().await;
    let bridge_url = format!("ws://127.0.0.1:{bridge_port}/ws/supervisor");

    let (exec_inbound_tx, _exec_inbound_rx) = tokio::sync::mpsc::unbounded_channel::<Reply>();
    let executor = spawn_executor(executor_port, exec_inbound_tx).await.unwrap();

    let bridge_listener = TcpListener::bind(("127.0.0.1", bridge_port)).await.unwrap();
    let bridge_config = BridgeLinkConfig {
        url: bridge_url,
        reconnect_initial_secs: 1,
        reconnect_ceiling_secs: 10,
        ping_interval_secs: 20,
        ping_timeout_secs: 20,
        outbound_queue_capacity: 100,
    };
    let (bridge_inbound_tx, _bridge_inbound_rx) = tokio::sync::mpsc::unbounded_channel::<UserMessage>();
    let bridge = spawn_bridge(bridge_config, bridge_inbound_tx);
    let (mut bridge_sink, mut bridge_stream) = accept_fake_bridge(bridge_listener).await;

    let ctx = ctx_with_links(executor, bridge, vec!["git".to_string()]);
    let tab_id = ctx.route_tab(None);

    // Give the stub some state an explicit reset should discard.
    ctx.llm.lock().unwrap().generate("sys", "hi", 8).unwrap();

    ctx.reset_llm().unwrap();
    ctx.tell_bridge(OutboundBridgeMessage::text(OutboundKind::System, "LLM memory reset", Some(tab_id)))
        .await;

    let msg = bridge_stream.next().await.unwrap().unwrap();
    let Message::Text(text) = msg else { panic!("expected text frame") };
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["type"], "system");
    assert_eq!(parsed["text"], "LLM memory reset");

    let _ = bridge_sink.send(Message::Close(None)).await;
}
