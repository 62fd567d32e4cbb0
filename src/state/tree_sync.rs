use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult, TreeRemote};
use crate::models::{NoteRef, NotebookNode};
use crate::state::AppContext;
use crate::tree::moves::{plan_drag_end, plan_note_move, DragItem, DragPlan, DropTarget, MovePlan, MoveTarget};
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Runs tree edits against the backend and mirrors them into the stores.
///
/// Local state changes only after the server accepted the edit. Moves and
/// reorders are followed by a full refetch so server-side positions win.
#[derive(Clone, Copy)]
pub(crate) struct TreeSyncController {
    app_state: AppContext,

    /// Connectivity state to backend API.
    backend_online: RwSignal<bool>,
    last_error: RwSignal<Option<String>>,
}

impl TreeSyncController {
    pub fn new(app_state: AppContext) -> Self {
        Self {
            app_state,
            backend_online: RwSignal::new(true),
            last_error: RwSignal::new(None),
        }
    }

    pub fn is_backend_online(&self) -> bool {
        self.backend_online.get()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.get()
    }

    pub fn clear_error(&self) {
        self.last_error.set(None);
    }

    fn mark_backend_online(&self) {
        self.backend_online.try_set(true);
    }

    fn record_failure(&self, what: &str, e: &ApiError) {
        tracing::warn!(error = %e, kind = ?e.kind, "{what} failed");
        if e.kind == ApiErrorKind::Network {
            self.backend_online.try_set(false);
        }
        self.last_error.try_set(Some(format!("{what} failed: {e}")));
    }

    fn api(&self) -> ApiClient {
        self.app_state.0.api_client.get_untracked()
    }

    /// Spawns `op`; on success marks the backend online, otherwise records
    /// the error under `what`.
    fn run<F>(&self, what: &'static str, op: F)
    where
        F: std::future::Future<Output = ApiResult<()>> + 'static,
    {
        let s2 = *self;
        spawn_local(async move {
            match op.await {
                Ok(()) => s2.mark_backend_online(),
                Err(e) => s2.record_failure(what, &e),
            }
        });
    }

    /// Tree, recent notes and shopping lists, as on first mount.
    pub fn load_sidebar(&self) {
        let api = self.api();
        let state = self.app_state.0;
        spawn_local(async move {
            state.tree.fetch_tree(&api).await;
            state
                .recent_notes
                .fetch_recent_notes(&api, state.recent_notes_limit)
                .await;
            state.shopping_lists.fetch_shopping_lists(&api).await;
        });
    }

    pub fn refresh_tree(&self) {
        let api = self.api();
        let tree = self.app_state.0.tree;
        spawn_local(async move {
            tree.fetch_tree(&api).await;
        });
    }

    pub fn move_note(&self, note_id: String, target: MoveTarget) {
        let current = self
            .app_state
            .0
            .tree
            .tree
            .with_untracked(|t| t.find_note_location(&note_id));
        let Some(plan) = plan_note_move(current.as_ref(), &target) else {
            return;
        };

        let s2 = *self;
        self.run("Moving note", async move { s2.apply_move(&note_id, plan).await });
    }

    async fn apply_move(&self, note_id: &str, plan: MovePlan) -> ApiResult<()> {
        let api = self.api();
        let tree = self.app_state.0.tree;

        match plan {
            MovePlan::Detach { notebook_id } => {
                api.remove_note_from_notebook(&notebook_id, note_id).await?;
                tree.remove_note_from_notebook(note_id, &notebook_id);
            }
            MovePlan::WithinNotebook {
                notebook_id,
                section_id,
            } => {
                api.assign_note_to_section(note_id, &notebook_id, section_id.as_deref())
                    .await?;
                tree.move_note_to_section(note_id, &notebook_id, section_id.as_deref());
            }
            MovePlan::AcrossNotebooks {
                from_notebook_id,
                notebook_id,
                section_id,
            } => {
                api.add_note_to_notebook(&notebook_id, note_id).await?;
                api.assign_note_to_section(note_id, &notebook_id, section_id.as_deref())
                    .await?;
                if let Some(from) = from_notebook_id.as_deref() {
                    api.remove_note_from_notebook(from, note_id).await?;
                }
                tree.move_note_to_notebook(&api, note_id, &notebook_id, section_id.as_deref())
                    .await;
            }
        }

        tracing::info!(note_id, "note moved");
        tree.fetch_tree(&api).await;
        Ok(())
    }

    pub fn handle_drop(&self, active: DragItem, over: DropTarget) {
        let plan = self
            .app_state
            .0
            .tree
            .tree
            .with_untracked(|t| plan_drag_end(t, &active, &over));
        let Some(plan) = plan else {
            return;
        };

        let api = self.api();
        let tree = self.app_state.0.tree;
        match plan {
            DragPlan::ReorderSection {
                section_id,
                position,
            } => self.run("Reordering sections", async move {
                api.update_section_position(&section_id, position).await?;
                tree.fetch_tree(&api).await;
                Ok(())
            }),
            DragPlan::ReorderNote {
                note_id,
                notebook_id,
                position,
            } => self.run("Reordering notes", async move {
                api.update_note_position(&note_id, &notebook_id, position)
                    .await?;
                tree.fetch_tree(&api).await;
                Ok(())
            }),
            DragPlan::Move { note_id, plan } => {
                let s2 = *self;
                self.run("Moving note", async move { s2.apply_move(&note_id, plan).await });
            }
        }
    }

    pub fn create_notebook(&self, name: String) {
        let name = name.trim().to_string();
        if name.is_empty() {
            return;
        }

        let api = self.api();
        let state = self.app_state.0;
        self.run("Creating notebook", async move {
            let nb = api.create_notebook(&name).await?;
            state.tree.add_notebook(NotebookNode {
                id: nb.id.clone(),
                title: nb.name,
                sections: vec![],
                unsectioned: vec![],
            });
            state.expansion.expand_notebook(&nb.id);
            state.tree.fetch_tree(&api).await;
            Ok(())
        });
    }

    pub fn rename_notebook(&self, notebook_id: String, name: String) {
        let api = self.api();
        let tree = self.app_state.0.tree;
        self.run("Renaming notebook", async move {
            let nb = api.rename_notebook(&notebook_id, &name).await?;
            tree.rename_notebook(&notebook_id, &nb.name);
            Ok(())
        });
    }

    pub fn delete_notebook(&self, notebook_id: String, on_deleted: impl FnOnce() + 'static) {
        let api = self.api();
        let tree = self.app_state.0.tree;
        self.run("Deleting notebook", async move {
            api.delete_notebook(&notebook_id).await?;
            tree.delete_notebook(&notebook_id);
            on_deleted();
            Ok(())
        });
    }

    pub fn create_section(&self, notebook_id: String, name: String) {
        let name = name.trim().to_string();
        if name.is_empty() {
            return;
        }

        let api = self.api();
        let state = self.app_state.0;
        self.run("Creating section", async move {
            let section = api.create_section(&notebook_id, &name).await?;
            state.tree.add_section(&notebook_id, &section);
            state.expansion.expand_notebook(&notebook_id);
            Ok(())
        });
    }

    pub fn rename_section(&self, section_id: String, name: String) {
        let api = self.api();
        let tree = self.app_state.0.tree;
        self.run("Renaming section", async move {
            api.rename_section(&section_id, &name).await?;
            tree.rename_section(&section_id, &name);
            Ok(())
        });
    }

    pub fn delete_section(&self, section_id: String) {
        let api = self.api();
        let tree = self.app_state.0.tree;
        self.run("Deleting section", async move {
            api.delete_section(&section_id).await?;
            tree.delete_section(&section_id);
            Ok(())
        });
    }

    /// Creates an empty note filed under the section, then hands its id to
    /// `on_created` (usually a navigation).
    pub fn create_note_in_section(
        &self,
        notebook_id: String,
        section_id: Option<String>,
        on_created: impl FnOnce(String) + 'static,
    ) {
        let api = self.api();
        let tree = self.app_state.0.tree;
        self.run("Creating note", async move {
            let detail = api.create_note("Untitled").await?;
            let note = NoteRef::from(&detail);
            api.add_note_to_notebook(&notebook_id, &note.id).await?;
            api.assign_note_to_section(&note.id, &notebook_id, section_id.as_deref())
                .await?;
            let note_id = note.id.clone();
            tree.add_note_to_tree(note);
            tree.move_note_to_notebook(&api, &note_id, &notebook_id, section_id.as_deref())
                .await;
            on_created(note_id);
            Ok(())
        });
    }

    pub fn rename_note(&self, note_id: String, title: String) {
        let title = title.trim().to_string();
        if title.is_empty() {
            return;
        }

        let api = self.api();
        let state = self.app_state.0;
        self.run("Renaming note", async move {
            let current = api.fetch_note(&note_id).await?;
            let saved = api.update_note_title(&current, &title).await?;
            state.tree.update_note_title(&saved.id, &saved.title);
            state
                .recent_notes
                .update_recent_note_title(&saved.id, &saved.title);
            Ok(())
        });
    }

    pub fn delete_note(&self, note_id: String, on_deleted: impl FnOnce() + 'static) {
        let api = self.api();
        let state = self.app_state.0;
        self.run("Deleting note", async move {
            api.delete_note(&note_id).await?;
            state.tree.delete_note(&note_id);
            on_deleted();
            // The note may have been listed as recent or as a shopping list.
            state
                .recent_notes
                .fetch_recent_notes(&api, state.recent_notes_limit)
                .await;
            state.shopping_lists.fetch_shopping_lists(&api).await;
            Ok(())
        });
    }

    pub fn enable_shopping_list(&self, note_id: String) {
        let api = self.api();
        let lists = self.app_state.0.shopping_lists;
        self.run("Converting to shopping list", async move {
            let list = api.enable_shopping_list(&note_id).await?;
            lists.add_shopping_list(list);
            Ok(())
        });
    }

    pub fn disable_shopping_list(&self, note_id: String) {
        let api = self.api();
        let lists = self.app_state.0.shopping_lists;
        self.run("Removing shopping list", async move {
            let list = api.fetch_note_shopping_list(&note_id).await?;
            api.disable_shopping_list(&note_id).await?;
            lists.delete_shopping_list(&list.id);
            Ok(())
        });
    }

    /// Picks up a title changed elsewhere since the sidebar was loaded.
    pub fn refresh_shopping_list(&self, list_id: String) {
        let api = self.api();
        let lists = self.app_state.0.shopping_lists;
        self.run("Loading shopping list", async move {
            let list = api.fetch_shopping_list(&list_id).await?;
            lists.update_shopping_list_title(&list.id, &list.title);
            Ok(())
        });
    }

    pub fn remove_recent_note(&self, note_id: String) {
        let api = self.api();
        let recent = self.app_state.0.recent_notes;
        self.run("Removing recent note", async move {
            recent.remove_recent_note(&api, &note_id).await
        });
    }
}
