//! Controller binary: wires together the Executor Link, the Bridge Link,
//! the Workflow Dispatcher, and the pending-first-in-loop Controller Loop.

use std::sync::Arc;

use clap::Parser;
use serde_json::Value;
use tokio::sync::mpsc;

use actl::context::AppContext;
use actl::dispatcher::Dispatcher;
use actl::workflow;
use actl::{sys_error, sys_info, sys_warn};
use actl_config::{load_prompts, ControllerConfig};
use actl_llm::{HttpLlmAdapter, LlmAdapter};
use actl_transport::{BridgeLinkConfig, ExecutorHandle};
use actl_types::{normalize_inbound_type, NormalizedAction, Reply, UserMessage};

/// Command-line overrides for the runtime config file.
#[derive(Debug, Parser)]
#[command(name = "actl-controller")]
struct Cli {
    /// Path to the JSON runtime config file.
    #[arg(long, default_value = "config/controller.json")]
    config: String,

    /// Override the Executor TCP port.
    #[arg(long)]
    executor_port: Option<u16>,

    /// Override the Bridge WebSocket URL.
    #[arg(long)]
    bridge_url: Option<String>,

    /// Override the prompts file path.
    #[arg(long)]
    prompts_path: Option<String>,

    /// Base URL of the HTTP-compatible LLM inference server.
    #[arg(long, default_value = "http://127.0.0.1:8081")]
    llm_endpoint: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mut config = ControllerConfig::load(&cli.config);
    if let Some(port) = cli.executor_port {
        config.executor_port = port;
    }
    if let Some(url) = cli.bridge_url {
        config.bridge_url = url;
    }
    if let Some(path) = cli.prompts_path {
        config.prompts_path = path;
    }

    sys_info!("starting controller (executor_port={}, bridge_url={})", config.executor_port, config.bridge_url);

    let prompts = load_prompts(&config.prompts_path);

    let mut llm: Box<dyn LlmAdapter> = Box::new(HttpLlmAdapter::new(cli.llm_endpoint));
    if let Err(e) = llm.load() {
        sys_warn!("llm backend not ready at startup: {e}");
    }

    let (executor_inbound_tx, mut executor_inbound_rx) = mpsc::unbounded_channel::<Reply>();
    let executor: ExecutorHandle = match actl_transport::spawn_executor(config.executor_port, executor_inbound_tx).await {
        Ok(handle) => handle,
        Err(e) => {
            sys_error!("failed to bind executor port {}: {e}", config.executor_port);
            std::process::exit(1);
        }
    };

    let (bridge_inbound_tx, mut bridge_inbound_rx) = mpsc::unbounded_channel::<UserMessage>();
    let bridge_config = BridgeLinkConfig {
        url: config.bridge_url.clone(),
        reconnect_initial_secs: config.reconnect_initial_secs,
        reconnect_ceiling_secs: config.reconnect_ceiling_secs,
        ping_interval_secs: config.ping_interval_secs,
        ping_timeout_secs: config.ping_timeout_secs,
        outbound_queue_capacity: config.outbound_queue_capacity,
    };
    let bridge = actl_transport::spawn_bridge(bridge_config, bridge_inbound_tx);

    let ctx = Arc::new(AppContext::new(executor, bridge, config, prompts, llm));
    let dispatcher = Arc::new(workflow::build_dispatcher());

    wire_event_emitter(&ctx, &dispatcher);

    // Executor replies are handed to the event emitter in arrival order;
    // the "coder_message" listener registered above fans each one out to
    // the dispatcher independently of the Bridge-driven controller loop
    // below.
    let reply_ctx = ctx.clone();
    tokio::spawn(async move {
        while let Some(reply) = executor_inbound_rx.recv().await {
            match serde_json::to_value(&reply) {
                Ok(payload) => reply_ctx.emitter.emit("coder_message", &payload),
                Err(e) => sys_error!("failed to encode executor reply for the event emitter: {e}"),
            }
        }
    });

    controller_loop(ctx, &mut bridge_inbound_rx).await;
}

/// Subscribe the dispatcher to `coder_message` (Executor replies) and the
/// normal-input workflow to `user_message` (Bridge input), mirroring the
/// `emitter.on(topic, handler)` wiring the Supervisor sets up around its
/// own dispatcher. Listener bodies are synchronous, so each one spawns
/// the actual async handling instead of awaiting inline.
fn wire_event_emitter(ctx: &Arc<AppContext>, dispatcher: &Arc<Dispatcher>) {
    let coder_ctx = ctx.clone();
    let coder_dispatcher = dispatcher.clone();
    ctx.emitter.on(
        "coder_message",
        Arc::new(move |payload: &Value| {
            let reply: Reply = match serde_json::from_value(payload.clone()) {
                Ok(reply) => reply,
                Err(e) => {
                    sys_warn!("{}", actl_types::ControllerError::Decode(e.to_string()));
                    return;
                }
            };
            let ctx = coder_ctx.clone();
            let dispatcher = coder_dispatcher.clone();
            tokio::spawn(async move {
                if let Err(e) = dispatcher.dispatch(ctx, reply).await {
                    sys_error!("dispatch error: {e}");
                }
            });
        }),
    );

    let user_ctx = ctx.clone();
    ctx.emitter.on(
        "user_message",
        Arc::new(move |payload: &Value| {
            let message: UserMessage = match serde_json::from_value(payload.clone()) {
                Ok(message) => message,
                Err(e) => {
                    sys_warn!("{}", actl_types::ControllerError::Decode(e.to_string()));
                    return;
                }
            };
            let ctx = user_ctx.clone();
            tokio::spawn(async move { handle_bridge_user_message(ctx, message).await });
        }),
    );
}

/// What `user_message` subscribers do with a fresh (non-pending) Bridge
/// message: route it to a tab and either kick off the workflow or reset
/// the LLM's conversation memory.
async fn handle_bridge_user_message(ctx: Arc<AppContext>, message: UserMessage) {
    match normalize_inbound_type(&message.kind) {
        Some(NormalizedAction::UserInputNormal) => {
            let tab_id = ctx.route_tab(message.tab_id);
            if let Err(e) = workflow::handlers::handle_user_input_normal(ctx.clone(), tab_id, &message.text).await {
                sys_error!("normal dispatch error: {e}");
            }
        }
        Some(NormalizedAction::Reset) => {
            if let Err(e) = ctx.reset_llm() {
                sys_warn!("llm reset failed: {e}");
            }
            ctx.tell_bridge(actl_types::OutboundBridgeMessage::text(
                actl_types::OutboundKind::System,
                "LLM memory reset",
                message.tab_id,
            ))
            .await;
        }
        _ => {}
    }
}

/// Pending approvals are always flushed before a fresh normal input is
/// accepted, preserving FIFO order across multiple queued approvals. This
/// ordering guarantee is why `user_input_pending` messages are handled
/// directly here rather than through the event emitter: the next loop
/// iteration must not start until this one's response handler has run.
async fn controller_loop(ctx: Arc<AppContext>, bridge_rx: &mut mpsc::UnboundedReceiver<UserMessage>) {
    loop {
        if let Some(pending) = ctx.pending.peek() {
            let message = bridge_rx.recv().await;
            let Some(message) = message else {
                sys_info!("bridge inbound channel closed, shutting down");
                return;
            };
            ctx.pending.remove(pending.id);
            if let Err(e) = workflow::handlers::handle_user_input_pending(ctx.clone(), pending, &message.text).await {
                sys_error!("pending dispatch error: {e}");
            }
            continue;
        }

        let message = match bridge_rx.recv().await {
            Some(message) => message,
            None => {
                sys_info!("bridge inbound channel closed, shutting down");
                return;
            }
        };

        if message.text.trim() == "exit" {
            sys_info!("received exit command, shutting down");
            return;
        }
        match normalize_inbound_type(&message.kind) {
            Some(NormalizedAction::UserInputNormal | NormalizedAction::Reset) => match serde_json::to_value(&message)
            {
                Ok(payload) => ctx.emitter.emit("user_message", &payload),
                Err(e) => sys_error!("failed to encode bridge message for the event emitter: {e}"),
            },
            Some(NormalizedAction::UserInputPending) => {
                sys_warn!("pending_response with no pending item queued, dropping");
            }
            None => {
                sys_warn!("unrecognized bridge message type {:?}, echoing as supervisor_log", message.kind);
                ctx.tell_bridge(actl_types::OutboundBridgeMessage::text(
                    actl_types::OutboundKind::SupervisorLog,
                    format!("unrecognized type: {}", message.kind),
                    message.tab_id,
                ))
                .await;
            }
        }
    }
}
