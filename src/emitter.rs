//! Event Emitter: a thread-safe topic → listener-list pub/sub that
//! decouples the transport layer from the Workflow Dispatcher. The
//! Executor Link and Bridge Link never call the dispatcher directly —
//! they emit `coder_message`/`user_message` events, and the controller
//! binary subscribes the dispatcher (or a workflow handler) to each
//! topic at startup. Listeners are cloned out of the lock before being
//! invoked, so a listener that re-subscribes or emits another event from
//! inside its callback can't deadlock the emitter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Default)]
pub struct EventEmitter {
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        EventEmitter {
            listeners: Mutex::new(HashMap::new()),
        }
    }

    pub fn on(&self, topic: impl Into<String>, listener: Listener) {
        let mut listeners = self.listeners.lock().unwrap();
        listeners.entry(topic.into()).or_default().push(listener);
    }

    /// Run every listener registered for `topic` with `payload`. The
    /// listener list is cloned out of the lock first (cheap — an `Arc`
    /// bump per listener) so listener bodies never run while holding it.
    pub fn emit(&self, topic: &str, payload: &Value) {
        let snapshot: Vec<Listener> = {
            let listeners = self.listeners.lock().unwrap();
            match listeners.get(topic) {
                Some(list) => list.clone(),
                None => return,
            }
        };
        for listener in snapshot {
            listener(payload);
        }
    }
}
