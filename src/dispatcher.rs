//! Workflow Dispatcher: a `(command, action) → handler` registry. Every
//! Reply from the Executor, and every normalized inbound Bridge message,
//! is dispatched through here. A miss logs `UnknownDispatch` and is
//! otherwise silently dropped — the workflow is linear per tab, so a miss
//! means either a stale Reply or a handler that was never registered for
//! a (command, action) pair the Executor can actually produce.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use actl_types::{ControllerError, Reply};

use crate::context::AppContext;

pub type BoxFuture = Pin<Box<dyn Future<Output = Result<(), ControllerError>> + Send>>;
pub type Handler = Arc<dyn Fn(Arc<AppContext>, Reply) -> BoxFuture + Send + Sync>;

#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<(String, String), Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, command: impl Into<String>, action: impl Into<String>, handler: Handler) {
        self.handlers.insert((command.into(), action.into()), handler);
    }

    /// Dispatch `reply` to its registered handler. Logs and returns `Ok(())`
    /// on a miss rather than propagating — an unknown dispatch must never
    /// take down the controller loop.
    pub async fn dispatch(&self, ctx: Arc<AppContext>, reply: Reply) -> Result<(), ControllerError> {
        let key = (reply.command.clone(), reply.action.clone());
        match self.handlers.get(&key) {
            Some(handler) => handler(ctx, reply).await,
            None => {
                let err = ControllerError::UnknownDispatch {
                    command: Some(reply.command.clone()),
                    action: reply.action.clone(),
                };
                crate::sys_warn!("{err}");
                Ok(())
            }
        }
    }
}
