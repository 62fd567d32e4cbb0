use super::{begin_request, is_current};
use crate::api::{ApiResult, TreeRemote};
use crate::models::NoteRef;
use crate::storage::upsert_lru_by_key;
use leptos::prelude::*;

pub(crate) const FETCH_RECENT_ERROR: &str = "Failed to load recent notes";
pub(crate) const REMOVE_RECENT_ERROR: &str = "Failed to remove recent note";

/// Most-recent-first list of visited notes, unique by id.
#[derive(Clone, Copy)]
pub(crate) struct RecentNotesStore {
    pub notes: RwSignal<Vec<NoteRef>>,
    pub loading: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
    request_id: RwSignal<u64>,
}

impl RecentNotesStore {
    pub fn new() -> Self {
        Self {
            notes: RwSignal::new(vec![]),
            loading: RwSignal::new(false),
            error: RwSignal::new(None),
            request_id: RwSignal::new(0),
        }
    }

    pub async fn fetch_recent_notes(&self, remote: &impl TreeRemote, limit: usize) {
        let req_id = begin_request(self.request_id);
        self.loading.set(true);
        self.error.set(None);

        let result = remote.fetch_recent_notes(limit).await;
        if !is_current(self.request_id, req_id) {
            return;
        }

        match result {
            Ok(notes) => {
                self.notes.try_set(notes);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load recent notes");
                self.error.try_set(Some(FETCH_RECENT_ERROR.to_string()));
            }
        }
        self.loading.try_set(false);
    }

    /// Re-adding a known id moves it to the front with the new title.
    pub fn add_recent_note(&self, note: NoteRef, limit: usize) {
        self.notes.update(|notes| {
            *notes = upsert_lru_by_key(std::mem::take(notes), note, |a, b| a.id == b.id, limit);
        });
    }

    pub fn update_recent_note_title(&self, note_id: &str, title: &str) {
        self.notes.update(|notes| {
            if let Some(n) = notes.iter_mut().find(|n| n.id == note_id) {
                n.title = title.to_string();
            }
        });
    }

    /// The local entry goes only after the server confirmed the delete.
    pub async fn remove_recent_note(&self, remote: &impl TreeRemote, note_id: &str) -> ApiResult<()> {
        match remote.delete_recent_note(note_id).await {
            Ok(()) => {
                self.notes.try_update(|notes| notes.retain(|n| n.id != note_id));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(note_id, error = %e, "failed to remove recent note");
                self.error.try_set(Some(REMOVE_RECENT_ERROR.to_string()));
                Err(e)
            }
        }
    }
}

impl Default for RecentNotesStore {
    fn default() -> Self {
        Self::new()
    }
}
