//! Undo/redo history.
//!
//! Snapshot based: every commit appends the full element collection, and
//! undo/redo move a cursor over the list. Snapshots are shared through
//! `Arc`, so an entry is never copied until it is restored.
//!
//! The first entry is the state the workspace started from, so the
//! cursor never moves below it.

use pc_core::ElementMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Entry {
    state: Arc<ElementMap>,
    description: String,
}

/// A snapshot handed back by `undo` / `redo`.
#[derive(Debug, Clone, PartialEq)]
pub struct Restore {
    /// The operation that was undone or redone.
    pub description: String,
    pub elements: ElementMap,
}

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Entry>,
    cursor: usize,
    /// Maximum entries retained (the base state included).
    limit: Option<usize>,
}

impl History {
    pub fn new(initial: ElementMap, limit: Option<usize>) -> Self {
        Self {
            entries: vec![Entry {
                state: Arc::new(initial),
                description: "initial state".to_string(),
            }],
            cursor: 0,
            limit: limit.map(|n| n.max(1)),
        }
    }

    /// Record `state` as the newest entry. Anything beyond the cursor (the
    /// redo branch) is dropped first.
    pub fn commit(&mut self, state: ElementMap, description: &str) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(Entry {
            state: Arc::new(state),
            description: description.to_string(),
        });
        if let Some(limit) = self.limit
            && self.entries.len() > limit
        {
            let excess = self.entries.len() - limit;
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len() - 1;
        log::info!(
            "history: committed `{description}` ({}/{})",
            self.cursor + 1,
            self.entries.len()
        );
    }

    /// Step back one entry. `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<Restore> {
        if !self.can_undo() {
            log::warn!("history: nothing to undo");
            return None;
        }
        let description = self.entries[self.cursor].description.clone();
        self.cursor -= 1;
        Some(self.restore_at_cursor(description))
    }

    /// Step forward one entry. `None` at the newest entry.
    pub fn redo(&mut self) -> Option<Restore> {
        if !self.can_redo() {
            log::warn!("history: nothing to redo");
            return None;
        }
        self.cursor += 1;
        let description = self.entries[self.cursor].description.clone();
        Some(self.restore_at_cursor(description))
    }

    fn restore_at_cursor(&self, description: String) -> Restore {
        log::info!("history: restoring entry {} (`{description}`)", self.cursor + 1);
        Restore {
            description,
            elements: ElementMap::clone(&self.entries[self.cursor].state),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The entry the live state corresponds to.
    pub fn current(&self) -> &ElementMap {
        &self.entries[self.cursor].state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_core::{Element, ElementId, ElementKind};
    use pretty_assertions::assert_eq;

    fn state(ids: &[&str]) -> ElementMap {
        ids.iter()
            .map(|s| {
                let id = ElementId::intern(s);
                (id, Element::new(id, ElementKind::Group))
            })
            .collect()
    }

    #[test]
    fn undo_and_redo_walk_the_log() {
        let mut history = History::new(ElementMap::new(), None);
        history.commit(state(&["h_a"]), "create a");
        history.commit(state(&["h_a", "h_b"]), "create b");

        let undone = history.undo().unwrap();
        assert_eq!(undone.description, "create b");
        assert_eq!(undone.elements, state(&["h_a"]));

        let undone = history.undo().unwrap();
        assert_eq!(undone.description, "create a");
        assert!(undone.elements.is_empty());
        assert!(history.undo().is_none(), "initial state is the floor");

        let redone = history.redo().unwrap();
        assert_eq!(redone.description, "create a");
        assert_eq!(redone.elements, state(&["h_a"]));
    }

    #[test]
    fn commit_discards_the_redo_branch() {
        let mut history = History::new(ElementMap::new(), None);
        history.commit(state(&["r_a"]), "a");
        history.commit(state(&["r_a", "r_b"]), "b");
        history.undo();
        assert!(history.can_redo());

        history.commit(state(&["r_c"]), "c");
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), &state(&["r_c"]));
    }

    #[test]
    fn limit_evicts_oldest_entries() {
        let mut history = History::new(ElementMap::new(), Some(3));
        for (i, name) in ["l_a", "l_b", "l_c", "l_d"].iter().enumerate() {
            history.commit(state(&[name]), &format!("step {i}"));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);

        history.undo();
        history.undo();
        assert!(!history.can_undo());
        assert_eq!(history.current(), &state(&["l_b"]));
    }
}
