//! Per-tab workflow state and tab id allocation.
//!
//! The Bridge never allocates tab ids itself; it's the controller that
//! decides which tab a user message belongs to, creating one the first
//! time a message arrives with no tab id attached.

use std::collections::HashMap;

use actl_types::{TabId, WorkflowState};

pub struct TabRegistry {
    next_id: TabId,
    active_tab: Option<TabId>,
    states: HashMap<TabId, WorkflowState>,
}

impl TabRegistry {
    pub fn new() -> Self {
        TabRegistry {
            next_id: 1,
            active_tab: None,
            states: HashMap::new(),
        }
    }

    /// Allocate a fresh tab and make it the active one.
    pub fn alloc(&mut self) -> TabId {
        let id = self.next_id;
        self.next_id += 1;
        self.active_tab = Some(id);
        self.states.insert(id, WorkflowState::new(id));
        id
    }

    /// Resolve an incoming message to a tab: reuse `incoming_tab_id` if
    /// it names a tab we already track, adopt it as new state if it
    /// doesn't, or fall back to the active tab (allocating one if none
    /// exists yet) when the message carried no tab id at all.
    pub fn route_tab(&mut self, incoming_tab_id: Option<TabId>) -> TabId {
        match incoming_tab_id {
            Some(id) if self.states.contains_key(&id) => {
                self.active_tab = Some(id);
                id
            }
            Some(id) => {
                self.active_tab = Some(id);
                self.states.insert(id, WorkflowState::new(id));
                id
            }
            None => self.active_tab.unwrap_or_else(|| self.alloc()),
        }
    }

    pub fn get(&self, id: TabId) -> Option<&WorkflowState> {
        self.states.get(&id)
    }

    pub fn get_mut(&mut self, id: TabId) -> Option<&mut WorkflowState> {
        self.states.get_mut(&id)
    }

    pub fn remove(&mut self, id: TabId) -> Option<WorkflowState> {
        if self.active_tab == Some(id) {
            self.active_tab = None;
        }
        self.states.remove(&id)
    }
}

impl Default for TabRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_tab_with_no_id_allocates_on_first_call() {
        let mut registry = TabRegistry::new();
        let id = registry.route_tab(None);
        assert_eq!(id, 1);
        assert!(registry.get(id).is_some());
    }

    #[test]
    fn route_tab_with_no_id_reuses_the_active_tab_afterward() {
        let mut registry = TabRegistry::new();
        let first = registry.route_tab(None);
        let second = registry.route_tab(None);
        assert_eq!(first, second);
    }

    #[test]
    fn route_tab_with_an_unknown_explicit_id_adopts_it() {
        let mut registry = TabRegistry::new();
        let id = registry.route_tab(Some(42));
        assert_eq!(id, 42);
        assert!(registry.get(42).is_some());
    }

    #[test]
    fn remove_clears_the_active_tab_if_it_was_the_one_removed() {
        let mut registry = TabRegistry::new();
        let id = registry.route_tab(None);
        registry.remove(id);
        assert!(registry.get(id).is_none());
        let next = registry.route_tab(None);
        assert_eq!(next, id + 1);
    }
}
