//! Pending Queue: a FIFO of approval requests gating the workflow on a
//! human response. The controller loop only ever acts on the head of the
//! queue; a `Notify` wakes it the moment a new one is pushed so it never
//! has to poll.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Notify;
use uuid::Uuid;

use actl_types::PendingAction;

#[derive(Default)]
pub struct PendingQueue {
    queue: Mutex<VecDeque<PendingAction>>,
    notify: Notify,
}

impl PendingQueue {
    pub fn new() -> Self {
        PendingQueue {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Push a new pending action and wake anyone waiting on
    /// [`PendingQueue::wait_for_next`].
    pub fn push(&self, action: PendingAction) {
        self.queue.lock().unwrap().push_back(action);
        self.notify.notify_one();
    }

    /// The head of the queue, if any, without removing it.
    pub fn peek(&self) -> Option<PendingAction> {
        self.queue.lock().unwrap().front().cloned()
    }

    /// Remove and return the queued action with id `id`, wherever it sits
    /// in the queue. Used when a `pending_response` arrives tagged with an
    /// id that isn't the current head (out-of-order user input).
    pub fn remove(&self, id: Uuid) -> Option<PendingAction> {
        let mut queue = self.queue.lock().unwrap();
        let index = queue.iter().position(|a| a.id == id)?;
        queue.remove(index)
    }

    /// Remove and return the head of the queue.
    pub fn pop_front(&self) -> Option<PendingAction> {
        self.queue.lock().unwrap().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Block until the queue is non-empty, then return the head.
    pub async fn wait_for_next(&self) -> PendingAction {
        loop {
            if let Some(action) = self.peek() {
                return action;
            }
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actl_types::{PendingKind, Reply, ReplyResult};
    use serde_json::Map;

    fn sample_reply() -> Reply {
        Reply {
            command: "git".to_string(),
            action: "read_py_files".to_string(),
            result: ReplyResult::Success,
            metadata: Map::new(),
        }
    }

    #[test]
    fn push_then_peek_returns_the_same_action() {
        let queue = PendingQueue::new();
        let action = PendingAction::new(PendingKind::ReadPyFiles, sample_reply(), 2);
        let id = action.id;
        queue.push(action);
        assert_eq!(queue.peek().unwrap().id, id);
    }

    #[test]
    fn remove_by_id_pulls_from_the_middle_of_the_queue() {
        let queue = PendingQueue::new();
        let first = PendingAction::new(PendingKind::ReadPyFiles, sample_reply(), 1);
        let second = PendingAction::new(PendingKind::GitEditRequest, sample_reply(), 2);
        let second_id = second.id;
        queue.push(first);
        queue.push(second);

        let removed = queue.remove(second_id).unwrap();
        assert_eq!(removed.id, second_id);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn wait_for_next_resolves_once_something_is_pushed() {
        let queue = std::sync::Arc::new(PendingQueue::new());
        let waiter = queue.clone();
        let handle = tokio::spawn(async move { waiter.wait_for_next().await });

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        queue.push(PendingAction::new(PendingKind::GitEditConfirm, sample_reply(), 3));

        let resolved = tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.kind, PendingKind::GitEditConfirm);
    }
}
