//! Shared state threaded through every workflow handler: the links to the
//! Executor and Bridge, the pending-approval queue, the event emitter,
//! the per-tab workflow registry, and the config/prompts/LLM triple.

use std::sync::Mutex;

use actl_config::{ControllerConfig, PromptSet};
use actl_llm::{LlmAdapter, LlmError};
use actl_transport::{BridgeHandle, ExecutorHandle};
use actl_types::TabId;

use crate::emitter::EventEmitter;
use crate::pending::PendingQueue;
use crate::workflow::state::TabRegistry;

pub struct AppContext {
    /// `None` only in unit tests that exercise dispatch logic without a
    /// live Executor connection.
    pub executor: Option<ExecutorHandle>,
    /// `None` only in unit tests that exercise dispatch logic without a
    /// live Bridge connection.
    pub bridge: Option<BridgeHandle>,
    pub pending: PendingQueue,
    pub emitter: EventEmitter,
    pub tabs: Mutex<TabRegistry>,
    pub config: ControllerConfig,
    pub prompts: PromptSet,
    /// Behind a lock because `reset` needs `&mut self` and every other
    /// call site only holds `&AppContext`.
    pub llm: Mutex<Box<dyn LlmAdapter>>,
}

impl AppContext {
    pub fn new(
        executor: ExecutorHandle,
        bridge: BridgeHandle,
        config: ControllerConfig,
        prompts: PromptSet,
        llm: Box<dyn LlmAdapter>,
    ) -> Self {
        AppContext {
            executor: Some(executor),
            bridge: Some(bridge),
            pending: PendingQueue::new(),
            emitter: EventEmitter::new(),
            tabs: Mutex::new(TabRegistry::new()),
            config,
            prompts,
            llm: Mutex::new(llm),
        }
    }

    /// Drop whatever context the backend has accumulated for this
    /// conversation so far.
    pub fn reset_llm(&self) -> Result<(), LlmError> {
        self.llm.lock().unwrap().reset()
    }

    /// Route `reply` to the Bridge tab it belongs to, tagging the
    /// message with that tab id.
    pub async fn tell_bridge(&self, message: actl_types::OutboundBridgeMessage) {
        if let Some(bridge) = &self.bridge {
            bridge.send(message).await;
        } else {
            log::warn!("no bridge handle attached, dropping outbound message");
        }
    }

    /// Enqueue a Task for the Executor. Fire-and-forget: the resulting
    /// Reply arrives later through the dispatcher, not as a return value.
    pub async fn send_task(&self, task: actl_types::Task) -> Result<(), actl_types::ControllerError> {
        match &self.executor {
            Some(executor) => executor.send(task).await,
            None => Err(actl_types::ControllerError::Transport(
                "no executor handle attached".to_string(),
            )),
        }
    }

    /// Resolve an inbound message's tab id the same way `TabRegistry`
    /// does: reuse a known id, adopt an unknown explicit one, or fall
    /// back to (allocating, if needed) the active tab.
    pub fn route_tab(&self, incoming_tab_id: Option<TabId>) -> TabId {
        self.tabs.lock().unwrap().route_tab(incoming_tab_id)
    }

    #[cfg(test)]
    pub fn for_test() -> Self {
        AppContext {
            executor: None,
            bridge: None,
            pending: PendingQueue::new(),
            emitter: EventEmitter::new(),
            tabs: Mutex::new(TabRegistry::new()),
            config: ControllerConfig::default(),
            prompts: PromptSet::default(),
            llm: Mutex::new(Box::new(actl_llm::StubLlmAdapter::default())),
        }
    }
}
