//! Which sidebar nodes are open, persisted across reloads.

use crate::storage::{
    collapsed_sections_key, load_json, save_json, BrowserStorage, KeyValueStore,
    EXPANDED_NOTEBOOKS_KEY, EXPANDED_RECENT_KEY, EXPANDED_SECTIONS_KEY,
    EXPANDED_SHOPPING_LISTS_KEY, EXPANDED_UNASSIGNED_KEY,
};
use crate::tree::TreeState;
use leptos::prelude::*;

/// Id lists keep insertion order, matching what is written to storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ExpansionState {
    pub notebooks: Vec<String>,
    pub sections: Vec<String>,
    pub unassigned: bool,
    pub shopping_lists: bool,
    pub recent: bool,
}

fn toggle_id(ids: &mut Vec<String>, id: &str) {
    // Stored lists may carry duplicates; collapsing drops every copy.
    if ids.iter().any(|x| x == id) {
        ids.retain(|x| x != id);
    } else {
        ids.push(id.to_string());
    }
}

/// Returns false if the id was already there.
fn insert_id(ids: &mut Vec<String>, id: &str) -> bool {
    if ids.iter().any(|x| x == id) {
        return false;
    }
    ids.push(id.to_string());
    true
}

impl ExpansionState {
    /// Missing or unreadable keys fall back to collapsed.
    pub fn load(store: &impl KeyValueStore) -> Self {
        Self {
            notebooks: load_json(store, EXPANDED_NOTEBOOKS_KEY).unwrap_or_default(),
            sections: load_json(store, EXPANDED_SECTIONS_KEY).unwrap_or_default(),
            unassigned: load_json(store, EXPANDED_UNASSIGNED_KEY).unwrap_or_default(),
            shopping_lists: load_json(store, EXPANDED_SHOPPING_LISTS_KEY).unwrap_or_default(),
            recent: load_json(store, EXPANDED_RECENT_KEY).unwrap_or_default(),
        }
    }

    pub fn is_notebook_expanded(&self, notebook_id: &str) -> bool {
        self.notebooks.iter().any(|x| x == notebook_id)
    }

    pub fn is_section_expanded(&self, section_id: &str) -> bool {
        self.sections.iter().any(|x| x == section_id)
    }

    pub fn toggle_notebook(&mut self, store: &impl KeyValueStore, notebook_id: &str) {
        toggle_id(&mut self.notebooks, notebook_id);
        save_json(store, EXPANDED_NOTEBOOKS_KEY, &self.notebooks);
    }

    pub fn toggle_section(&mut self, store: &impl KeyValueStore, section_id: &str) {
        toggle_id(&mut self.sections, section_id);
        save_json(store, EXPANDED_SECTIONS_KEY, &self.sections);
    }

    pub fn toggle_unassigned(&mut self, store: &impl KeyValueStore) {
        self.unassigned = !self.unassigned;
        save_json(store, EXPANDED_UNASSIGNED_KEY, &self.unassigned);
    }

    pub fn toggle_shopping_lists(&mut self, store: &impl KeyValueStore) {
        self.shopping_lists = !self.shopping_lists;
        save_json(store, EXPANDED_SHOPPING_LISTS_KEY, &self.shopping_lists);
    }

    pub fn toggle_recent(&mut self, store: &impl KeyValueStore) {
        self.recent = !self.recent;
        save_json(store, EXPANDED_RECENT_KEY, &self.recent);
    }

    /// The `expand_*` calls never collapse and never write when nothing
    /// changed. They return whether anything changed.
    pub fn expand_notebook(&mut self, store: &impl KeyValueStore, notebook_id: &str) -> bool {
        let changed = insert_id(&mut self.notebooks, notebook_id);
        if changed {
            save_json(store, EXPANDED_NOTEBOOKS_KEY, &self.notebooks);
        }
        changed
    }

    pub fn expand_section(&mut self, store: &impl KeyValueStore, section_id: &str) -> bool {
        let changed = insert_id(&mut self.sections, section_id);
        if changed {
            save_json(store, EXPANDED_SECTIONS_KEY, &self.sections);
        }
        changed
    }

    pub fn expand_unassigned(&mut self, store: &impl KeyValueStore) -> bool {
        if self.unassigned {
            return false;
        }
        self.unassigned = true;
        save_json(store, EXPANDED_UNASSIGNED_KEY, &true);
        true
    }

    /// Notebooks and sections only; the fixed groups keep their state.
    pub fn collapse_all(&mut self, store: &impl KeyValueStore) {
        self.notebooks.clear();
        self.sections.clear();
        save_json(store, EXPANDED_NOTEBOOKS_KEY, &self.notebooks);
        save_json(store, EXPANDED_SECTIONS_KEY, &self.sections);
    }

    pub fn expand_all(
        &mut self,
        store: &impl KeyValueStore,
        notebook_ids: Vec<String>,
        section_ids: Vec<String>,
    ) {
        self.notebooks = notebook_ids;
        self.sections = section_ids;
        save_json(store, EXPANDED_NOTEBOOKS_KEY, &self.notebooks);
        save_json(store, EXPANDED_SECTIONS_KEY, &self.sections);
    }

    /// True when every notebook and section of a non-empty tree is open.
    pub fn all_expanded(&self, tree: &TreeState) -> bool {
        !tree.is_empty()
            && tree.notebooks.iter().all(|nb| {
                self.is_notebook_expanded(&nb.id)
                    && nb.sections.iter().all(|s| self.is_section_expanded(&s.id))
            })
    }
}

/// Every notebook and section id in display order, for `expand_all`.
pub(crate) fn all_node_ids(tree: &TreeState) -> (Vec<String>, Vec<String>) {
    let notebooks = tree.notebooks.iter().map(|nb| nb.id.clone()).collect();
    let sections = tree
        .notebooks
        .iter()
        .flat_map(|nb| nb.sections.iter().map(|s| s.id.clone()))
        .collect();
    (notebooks, sections)
}

/// Section key for a notebook's unsectioned bucket.
pub(crate) const UNSECTIONED_ID: &str = "unsectioned";

/// Sections the user folded on a notebook page. Storage is read on every
/// call, so two views of the same notebook agree without sharing state.
#[derive(Clone, Debug)]
pub(crate) struct CollapsedSections<S: KeyValueStore> {
    key: String,
    store: S,
}

impl<S: KeyValueStore> CollapsedSections<S> {
    pub fn new(notebook_id: &str, store: S) -> Self {
        Self {
            key: collapsed_sections_key(notebook_id),
            store,
        }
    }

    fn read(&self) -> Vec<String> {
        load_json(&self.store, &self.key).unwrap_or_default()
    }

    pub fn is_collapsed(&self, section_id: &str) -> bool {
        self.read().iter().any(|x| x == section_id)
    }

    pub fn toggle(&self, section_id: &str) {
        let mut ids = self.read();
        toggle_id(&mut ids, section_id);
        save_json(&self.store, &self.key, &ids);
    }
}

/// Reactive expansion state backed by localStorage.
#[derive(Clone, Copy)]
pub(crate) struct ExpansionStore {
    pub state: RwSignal<ExpansionState>,
}

impl ExpansionStore {
    pub fn new() -> Self {
        Self {
            state: RwSignal::new(ExpansionState::load(&BrowserStorage)),
        }
    }

    pub fn is_notebook_expanded(&self, notebook_id: &str) -> bool {
        self.state.with(|s| s.is_notebook_expanded(notebook_id))
    }

    pub fn is_section_expanded(&self, section_id: &str) -> bool {
        self.state.with(|s| s.is_section_expanded(section_id))
    }

    pub fn toggle_notebook(&self, notebook_id: &str) {
        self.state
            .update(|s| s.toggle_notebook(&BrowserStorage, notebook_id));
    }

    pub fn toggle_section(&self, section_id: &str) {
        self.state
            .update(|s| s.toggle_section(&BrowserStorage, section_id));
    }

    pub fn toggle_unassigned(&self) {
        self.state.update(|s| s.toggle_unassigned(&BrowserStorage));
    }

    pub fn toggle_shopping_lists(&self) {
        self.state
            .update(|s| s.toggle_shopping_lists(&BrowserStorage));
    }

    pub fn toggle_recent(&self) {
        self.state.update(|s| s.toggle_recent(&BrowserStorage));
    }

    pub fn expand_notebook(&self, notebook_id: &str) {
        self.state
            .maybe_update(|s| s.expand_notebook(&BrowserStorage, notebook_id));
    }

    pub fn expand_section(&self, section_id: &str) {
        self.state
            .maybe_update(|s| s.expand_section(&BrowserStorage, section_id));
    }

    pub fn expand_unassigned(&self) {
        self.state
            .maybe_update(|s| s.expand_unassigned(&BrowserStorage));
    }

    /// Header toggle: collapse everything if all is open, else open all.
    pub fn toggle_all(&self, tree: &TreeState) {
        self.state.update(|s| {
            if s.all_expanded(tree) {
                s.collapse_all(&BrowserStorage);
            } else {
                let (notebooks, sections) = all_node_ids(tree);
                s.expand_all(&BrowserStorage, notebooks, sections);
            }
        });
    }
}

impl Default for ExpansionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::tree::fixtures::sample_tree;

    #[test]
    fn test_load_defaults_on_empty_storage() {
        let state = ExpansionState::load(&MemoryStorage::new());
        assert_eq!(state, ExpansionState::default());
    }

    #[test]
    fn test_load_defaults_on_corrupted_storage() {
        let store = MemoryStorage::with_items([
            (EXPANDED_NOTEBOOKS_KEY, "[\"nb1\""),
            (EXPANDED_SECTIONS_KEY, "{}"),
            (EXPANDED_UNASSIGNED_KEY, "yes"),
            (EXPANDED_RECENT_KEY, "true"),
        ]);
        let state = ExpansionState::load(&store);
        assert!(state.notebooks.is_empty());
        assert!(state.sections.is_empty());
        assert!(!state.unassigned);
        assert!(state.recent);
    }

    #[test]
    fn test_toggle_notebook_persists_round_trip() {
        let store = MemoryStorage::new();
        let mut state = ExpansionState::load(&store);
        state.toggle_notebook(&store, "nb1");
        state.toggle_notebook(&store, "nb2");
        state.toggle_section(&store, "s1");
        state.toggle_unassigned(&store);

        let restored = ExpansionState::load(&store);
        assert_eq!(restored, state);
        assert_eq!(restored.notebooks, vec!["nb1", "nb2"]);
        assert!(restored.is_section_expanded("s1"));
        assert!(restored.unassigned);
    }

    #[test]
    fn test_toggle_twice_collapses() {
        let store = MemoryStorage::new();
        let mut state = ExpansionState::default();
        state.toggle_notebook(&store, "nb1");
        state.toggle_notebook(&store, "nb1");
        assert!(!state.is_notebook_expanded("nb1"));
        assert_eq!(store.get(EXPANDED_NOTEBOOKS_KEY).as_deref(), Some("[]"));
    }

    #[test]
    fn test_toggle_collapses_duplicated_stored_ids() {
        let store = MemoryStorage::with_items([(EXPANDED_NOTEBOOKS_KEY, r#"["nb1","nb1"]"#)]);
        let mut state = ExpansionState::load(&store);
        assert!(state.is_notebook_expanded("nb1"));

        state.toggle_notebook(&store, "nb1");
        assert!(!state.is_notebook_expanded("nb1"));
        assert_eq!(store.get(EXPANDED_NOTEBOOKS_KEY).as_deref(), Some("[]"));
    }

    #[test]
    fn test_expand_is_idempotent_and_skips_writes() {
        let store = MemoryStorage::new();
        let mut state = ExpansionState::default();

        assert!(state.expand_notebook(&store, "nb1"));
        store.remove(EXPANDED_NOTEBOOKS_KEY);
        assert!(!state.expand_notebook(&store, "nb1"));
        assert_eq!(state.notebooks, vec!["nb1"]);
        assert!(store.get(EXPANDED_NOTEBOOKS_KEY).is_none());

        assert!(state.expand_unassigned(&store));
        assert!(!state.expand_unassigned(&store));
        assert!(state.unassigned);
    }

    #[test]
    fn test_collapse_all_keeps_fixed_groups() {
        let store = MemoryStorage::new();
        let mut state = ExpansionState::default();
        state.expand_notebook(&store, "nb1");
        state.expand_section(&store, "s1");
        state.toggle_recent(&store);

        state.collapse_all(&store);

        assert!(state.notebooks.is_empty());
        assert!(state.sections.is_empty());
        assert!(state.recent);
        assert_eq!(ExpansionState::load(&store), state);
    }

    #[test]
    fn test_expand_all_and_all_expanded() {
        let store = MemoryStorage::new();
        let tree = sample_tree();
        let mut state = ExpansionState::default();
        assert!(!state.all_expanded(&tree));

        let (notebooks, sections) = all_node_ids(&tree);
        assert_eq!(notebooks, vec!["nb1", "nb2"]);
        assert_eq!(sections, vec!["s1", "s2"]);
        state.expand_all(&store, notebooks, sections);

        assert!(state.all_expanded(&tree));
        state.toggle_section(&store, "s2");
        assert!(!state.all_expanded(&tree));
        assert!(!state.all_expanded(&TreeState::default()));
    }

    #[test]
    fn test_collapsed_sections_per_notebook() {
        let store = MemoryStorage::new();
        let nb1 = CollapsedSections::new("nb1", store.clone());
        let nb1_again = CollapsedSections::new("nb1", store.clone());
        let nb2 = CollapsedSections::new("nb2", store.clone());

        nb1.toggle("s1");
        nb1.toggle(UNSECTIONED_ID);

        assert!(nb1_again.is_collapsed("s1"));
        assert!(nb1_again.is_collapsed(UNSECTIONED_ID));
        assert!(!nb2.is_collapsed("s1"));

        nb1_again.toggle("s1");
        assert!(!nb1.is_collapsed("s1"));
    }

    #[test]
    fn test_collapsed_sections_tolerate_garbage() {
        let store = MemoryStorage::with_items([("collapsed-sections-nb1", "oops")]);
        let nb1 = CollapsedSections::new("nb1", store);
        assert!(!nb1.is_collapsed("s1"));
        nb1.toggle("s1");
        assert!(nb1.is_collapsed("s1"));
    }
}
