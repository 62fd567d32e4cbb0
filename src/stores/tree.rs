use super::{begin_request, is_current};
use crate::api::TreeRemote;
use crate::models::{NoteRef, NotebookNode, Section};
use crate::tree::TreeState;
use leptos::prelude::*;

pub(crate) const FETCH_TREE_ERROR: &str = "Failed to load notebooks";

#[derive(Clone, Copy)]
pub(crate) struct TreeStore {
    pub tree: RwSignal<TreeState>,
    pub loading: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
    request_id: RwSignal<u64>,
}

impl TreeStore {
    pub fn new() -> Self {
        Self {
            tree: RwSignal::new(TreeState::default()),
            loading: RwSignal::new(false),
            error: RwSignal::new(None),
            request_id: RwSignal::new(0),
        }
    }

    /// Replaces the whole tree. On failure the previous tree stays so the
    /// sidebar does not flash empty.
    pub async fn fetch_tree(&self, remote: &impl TreeRemote) {
        let req_id = begin_request(self.request_id);
        self.loading.set(true);
        self.error.set(None);

        let result = remote.fetch_tree().await;

        // Ignore stale responses.
        if !is_current(self.request_id, req_id) {
            return;
        }

        match result {
            Ok(snapshot) => {
                tracing::debug!(notebooks = snapshot.notebooks.len(), "notebook tree loaded");
                let tree = TreeState::from(snapshot);
                for (note_id, locations) in tree.misplaced_notes() {
                    tracing::warn!(note_id, ?locations, "note is placed more than once");
                }
                self.tree.try_set(tree);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load notebook tree");
                self.error.try_set(Some(FETCH_TREE_ERROR.to_string()));
            }
        }
        self.loading.try_set(false);
    }

    pub fn update_note_title(&self, note_id: &str, title: &str) {
        self.tree.update(|t| t.update_note_title(note_id, title));
    }

    pub fn add_note_to_tree(&self, note: NoteRef) {
        self.tree.update(|t| t.add_note_to_tree(note));
    }

    pub fn delete_note(&self, note_id: &str) {
        self.tree.update(|t| t.delete_note(note_id));
    }

    /// Looks the note up locally (unassigned first, then notebooks) and falls
    /// back to the remote when the local tree is stale. If the remote cannot
    /// identify it either, nothing happens.
    ///
    /// The move is applied to whatever the tree is once the lookup resolves.
    pub async fn move_note_to_notebook(
        &self,
        remote: &impl TreeRemote,
        note_id: &str,
        notebook_id: &str,
        section_id: Option<&str>,
    ) {
        let known = self.tree.with_untracked(|t| t.find_note(note_id).cloned());
        let note = match known {
            Some(note) => note,
            None => match remote.fetch_note(note_id).await {
                Ok(detail) => NoteRef::from(&detail),
                Err(e) => {
                    tracing::debug!(note_id, error = %e, "move abandoned, note unknown");
                    return;
                }
            },
        };

        self.tree
            .try_update(|t| t.place_note(note, notebook_id, section_id));
    }

    pub fn remove_note_from_notebook(&self, note_id: &str, notebook_id: &str) {
        self.tree
            .update(|t| t.remove_note_from_notebook(note_id, notebook_id));
    }

    pub fn move_note_to_section(&self, note_id: &str, notebook_id: &str, section_id: Option<&str>) {
        self.tree
            .update(|t| t.move_note_to_section(note_id, notebook_id, section_id));
    }

    pub fn add_notebook(&self, notebook: NotebookNode) {
        self.tree.update(|t| t.add_notebook(notebook));
    }

    pub fn rename_notebook(&self, notebook_id: &str, name: &str) {
        self.tree.update(|t| t.rename_notebook(notebook_id, name));
    }

    pub fn delete_notebook(&self, notebook_id: &str) {
        self.tree.update(|t| t.delete_notebook(notebook_id));
    }

    pub fn add_section(&self, notebook_id: &str, section: &Section) {
        self.tree.update(|t| t.add_section(notebook_id, section));
    }

    pub fn rename_section(&self, section_id: &str, name: &str) {
        self.tree.update(|t| t.rename_section(section_id, name));
    }

    pub fn delete_section(&self, section_id: &str) {
        self.tree.update(|t| t.delete_section(section_id));
    }
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::models::{NoteLocation, TreeSnapshot};
    use crate::stores::fake::{note_detail, FakeRemote};
    use crate::tree::fixtures::*;

    fn snapshot(t: TreeState) -> TreeSnapshot {
        TreeSnapshot {
            notebooks: t.notebooks,
            unassigned: t.unassigned,
        }
    }

    fn loaded_store() -> TreeStore {
        let store = TreeStore::new();
        store.tree.set(sample_tree());
        store
    }

    #[tokio::test]
    async fn test_fetch_tree_replaces_state() {
        let store = TreeStore::new();
        let remote = FakeRemote {
            tree: Some(snapshot(sample_tree())),
            ..Default::default()
        };

        store.fetch_tree(&remote).await;

        assert_eq!(store.tree.get_untracked(), sample_tree());
        assert!(!store.loading.get_untracked());
        assert_eq!(store.error.get_untracked(), None);
    }

    #[tokio::test]
    async fn test_fetch_tree_failure_keeps_prior_state() {
        let store = loaded_store();
        let remote = FakeRemote::default();

        store.fetch_tree(&remote).await;

        assert_eq!(store.tree.get_untracked(), sample_tree());
        assert_eq!(store.error.get_untracked().as_deref(), Some(FETCH_TREE_ERROR));
        assert!(!store.loading.get_untracked());
    }

    #[tokio::test]
    async fn test_fetch_tree_ignores_stale_response() {
        let store = TreeStore::new();
        let slow = FakeRemote {
            tree: Some(snapshot(sample_tree())),
            delay: 3,
            ..Default::default()
        };
        let fresh_tree = TreeState {
            notebooks: vec![notebook("fresh", vec![], vec![])],
            unassigned: vec![],
        };
        let fast = FakeRemote {
            tree: Some(snapshot(fresh_tree.clone())),
            ..Default::default()
        };

        tokio::join!(store.fetch_tree(&slow), store.fetch_tree(&fast));

        assert_eq!(store.tree.get_untracked(), fresh_tree);
        assert!(!store.loading.get_untracked());
    }

    #[tokio::test]
    async fn test_move_known_note_skips_remote() {
        let store = loaded_store();
        let remote = FakeRemote::default();

        store.move_note_to_notebook(&remote, "n3", "nb1", Some("s2")).await;

        assert!(remote.calls().is_empty());
        let tree = store.tree.get_untracked();
        assert_eq!(
            tree.find_note_location("n3"),
            Some(NoteLocation::Section {
                notebook_id: "nb1".to_string(),
                section_id: "s2".to_string()
            })
        );
        assert_at_most_once(&tree, "n3");
    }

    #[tokio::test]
    async fn test_move_unknown_note_uses_remote_title() {
        let store = loaded_store();
        let remote = FakeRemote {
            notes: vec![note_detail("n9", "From server")],
            ..Default::default()
        };

        store.move_note_to_notebook(&remote, "n9", "nb2", None).await;

        assert_eq!(remote.calls(), vec!["fetch_note n9".to_string()]);
        let tree = store.tree.get_untracked();
        assert_eq!(
            tree.notebooks[1].unsectioned,
            vec![note("n4", "Four"), note("n9", "From server")]
        );
    }

    #[tokio::test]
    async fn test_move_abandoned_when_remote_lookup_fails() {
        let store = loaded_store();
        let remote = FakeRemote::default();

        store.move_note_to_notebook(&remote, "n9", "nb2", None).await;

        assert_eq!(store.tree.get_untracked(), sample_tree());
    }

    #[tokio::test]
    async fn test_move_applies_to_latest_tree() {
        let store = loaded_store();
        let remote = FakeRemote {
            notes: vec![note_detail("n9", "Late")],
            delay: 2,
            ..Default::default()
        };

        let rename = async {
            tokio::task::yield_now().await;
            store.rename_notebook("nb1", "Renamed while waiting");
        };
        tokio::join!(store.move_note_to_notebook(&remote, "n9", "nb1", None), rename);

        let tree = store.tree.get_untracked();
        assert_eq!(tree.notebooks[0].title, "Renamed while waiting");
        assert_eq!(
            tree.find_note_location("n9"),
            Some(NoteLocation::Unsectioned {
                notebook_id: "nb1".to_string()
            })
        );
    }

    #[test]
    fn test_sync_operations_keep_single_location() {
        let store = loaded_store();

        store.move_note_to_section("n2", "nb1", Some("s1"));
        store.remove_note_from_notebook("n1", "nb1");
        store.delete_note("n4");
        store.update_note_title("n1", "Loose now");

        let tree = store.tree.get_untracked();
        for id in ["n1", "n2", "n3", "n4"] {
            assert_at_most_once(&tree, id);
        }
        assert_eq!(tree.unassigned, vec![note("n3", "Three"), note("n1", "Loose now")]);
        assert_eq!(tree.notebooks[0].sections[0].notes, vec![note("n2", "Two")]);
    }
}
