//! Flat category store with a derived navigation tree.
//!
//! The flat map keyed by id is the only mutable state. The nested [`NavNode`] view
//! is recomputed from it on demand and memoized against a version counter that every
//! mutation bumps, so the two can never disagree.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Category;

/// Parent id of root categories.
pub const ROOT_ID: i64 = 0;

/// One node of the navigation tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavNode {
    #[serde(flatten)]
    pub record: Category,
    /// Whether the node can be expanded
    pub has_children: bool,
    /// Whether this node's children have been loaded
    pub is_expanded: bool,
    pub children: Vec<NavNode>,
}

impl NavNode {
    pub fn id(&self) -> i64 {
        self.record.id
    }
}

#[derive(Debug, Clone)]
struct Entry {
    record: Category,
    /// First-insertion order, tie-breaker between equal priorities
    seq: u64,
}

#[derive(Default)]
struct Memo {
    version: u64,
    nav: Option<Arc<Vec<NavNode>>>,
    children: HashMap<i64, Arc<Vec<Category>>>,
}

impl Memo {
    fn sync(&mut self, version: u64) {
        if self.version != version {
            self.version = version;
            self.nav = None;
            self.children.clear();
        }
    }
}

/// Client-side category state: flat records, loaded parents and the selection.
#[derive(Default)]
pub struct CategoryTree {
    records: HashMap<i64, Entry>,
    /// Parents whose children have been loaded
    expanded: HashSet<i64>,
    selection: HashSet<i64>,
    next_seq: u64,
    version: u64,
    memo: Mutex<Memo>,
}

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incremented by every mutation of the flat store.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Category> {
        self.records.get(&id).map(|entry| &entry.record)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.records.contains_key(&id)
    }

    pub fn is_expanded(&self, id: i64) -> bool {
        id == ROOT_ID || self.expanded.contains(&id)
    }

    /// Whether `id` is the root or a record whose ancestor chain reaches the root.
    pub fn is_materialized(&self, id: i64) -> bool {
        let mut current = id;
        let mut steps = 0;
        while current != ROOT_ID {
            let Some(entry) = self.records.get(&current) else {
                return false;
            };
            current = entry.record.parent_id;
            steps += 1;
            if steps > self.records.len() {
                return false;
            }
        }
        true
    }

    /// Merge a freshly loaded page of children into the store and mark the parent as
    /// expanded. Returns the number of records merged.
    pub fn load_children(&mut self, parent_id: i64, records: Vec<Category>) -> usize {
        let mut merged = 0;
        for record in records.into_iter().filter(|r| r.id != 0) {
            self.upsert(record);
            merged += 1;
        }
        self.expanded.insert(parent_id);
        self.touch();
        debug!(parent_id, merged, version = self.version, "children loaded");
        merged
    }

    /// Insert a saved record.
    ///
    /// Returns whether the record is visible in the navigation tree, which requires
    /// its parent to be materialized. Unsaved records (id 0) are ignored.
    pub fn add_record(&mut self, record: Category) -> bool {
        if record.id == 0 {
            debug!("ignoring unsaved category");
            return false;
        }
        let parent_id = record.parent_id;
        self.upsert(record);
        self.touch();

        let visible = self.is_materialized(parent_id);
        if !visible {
            debug!(parent_id, "parent not materialized, record hidden until expanded");
        }
        visible
    }

    /// Replace the scalar fields of a known record. Loaded children stay attached.
    ///
    /// Returns false (and changes nothing) for unknown ids.
    pub fn update_record(&mut self, record: Category) -> bool {
        match self.records.get_mut(&record.id) {
            Some(entry) => {
                entry.record = record;
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Remove a record and every loaded descendant.
    ///
    /// Removed ids also leave the selection and the expanded set. Returns the removed
    /// ids, empty when `id` was unknown.
    pub fn delete_record(&mut self, id: i64) -> Vec<i64> {
        if !self.records.contains_key(&id) {
            return Vec::new();
        }

        let mut removed = Vec::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if self.records.remove(&current).is_some() {
                removed.push(current);
            }
            pending.extend(
                self.records
                    .values()
                    .filter(|entry| entry.record.parent_id == current)
                    .map(|entry| entry.record.id),
            );
        }

        for removed_id in &removed {
            self.selection.remove(removed_id);
            self.expanded.remove(removed_id);
        }
        self.touch();
        debug!(id, cascade = removed.len(), "category removed");
        removed
    }

    /// Flip membership of `id` in the selection. Returns whether it is now selected.
    pub fn toggle_selection(&mut self, id: i64) -> bool {
        if self.selection.remove(&id) {
            false
        } else {
            self.selection.insert(id);
            true
        }
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.selection.contains(&id)
    }

    /// Selected ids, ascending.
    pub fn selection(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.selection.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Direct children of `parent_id` in display order.
    pub fn children_of(&self, parent_id: i64) -> Arc<Vec<Category>> {
        let mut memo = self.memo.lock();
        memo.sync(self.version);
        if let Some(children) = memo.children.get(&parent_id) {
            return Arc::clone(children);
        }

        let mut entries: Vec<&Entry> = self
            .records
            .values()
            .filter(|entry| entry.record.parent_id == parent_id)
            .collect();
        entries.sort_by_key(|entry| (entry.record.priority, entry.seq));
        let children = Arc::new(entries.into_iter().map(|e| e.record.clone()).collect());

        memo.children.insert(parent_id, Arc::clone(&children));
        children
    }

    /// The navigation tree rooted at [`ROOT_ID`].
    ///
    /// Repeated calls between mutations return the same snapshot.
    pub fn nav_list(&self) -> Arc<Vec<NavNode>> {
        let mut memo = self.memo.lock();
        memo.sync(self.version);
        if let Some(nav) = &memo.nav {
            return Arc::clone(nav);
        }

        let mut by_parent: HashMap<i64, Vec<&Entry>> = HashMap::new();
        for entry in self.records.values() {
            by_parent
                .entry(entry.record.parent_id)
                .or_default()
                .push(entry);
        }
        for siblings in by_parent.values_mut() {
            siblings.sort_by_key(|entry| (entry.record.priority, entry.seq));
        }

        let nav = Arc::new(self.build_level(ROOT_ID, &by_parent));
        memo.nav = Some(Arc::clone(&nav));
        nav
    }

    fn build_level(&self, parent_id: i64, by_parent: &HashMap<i64, Vec<&Entry>>) -> Vec<NavNode> {
        let Some(siblings) = by_parent.get(&parent_id) else {
            return Vec::new();
        };

        siblings
            .iter()
            .map(|entry| {
                let id = entry.record.id;
                let is_expanded = self.is_expanded(id);
                let has_loaded_children = by_parent.contains_key(&id);
                // The server count is only trusted until the children are loaded
                let has_children = has_loaded_children || (!is_expanded && entry.record.child_count > 0);
                NavNode {
                    record: entry.record.clone(),
                    has_children,
                    is_expanded,
                    children: self.build_level(id, by_parent),
                }
            })
            .collect()
    }

    fn upsert(&mut self, record: Category) {
        match self.records.get_mut(&record.id) {
            Some(entry) => entry.record = record,
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.records.insert(record.id, Entry { record, seq });
            }
        }
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}
