//! Reactive stores shared through context.
//!
//! Each store is a bundle of `RwSignal`s and therefore `Copy`. Async
//! operations take the remote as an argument and are driven by the caller
//! (usually `spawn_local`), so they can be awaited directly in tests.

mod recent_notes;
mod shopping_lists;
mod tree;

pub(crate) use recent_notes::RecentNotesStore;
pub(crate) use shopping_lists::ShoppingListStore;
pub(crate) use tree::TreeStore;

use leptos::prelude::*;

/// Starts a new request and returns its id. A response is applied only if
/// its id is still the current one.
fn begin_request(request_id: RwSignal<u64>) -> u64 {
    let id = request_id.get_untracked().saturating_add(1);
    request_id.set(id);
    id
}

/// False once a newer request started or the signal was disposed.
fn is_current(request_id: RwSignal<u64>, id: u64) -> bool {
    request_id.try_get_untracked() == Some(id)
}

#[cfg(all(test, not(target_arch = "wasm32")))]
pub(crate) mod fake {
    use crate::api::{ApiError, ApiErrorKind, ApiResult, TreeRemote};
    use crate::models::{NoteDetail, NoteRef, ShoppingListSummary, TreeSnapshot};
    use std::cell::RefCell;

    pub fn offline() -> ApiError {
        ApiError {
            kind: ApiErrorKind::Network,
            message: "offline".to_string(),
        }
    }

    /// Scripted remote. `None` responses fail with a network error.
    #[derive(Default)]
    pub struct FakeRemote {
        pub tree: Option<TreeSnapshot>,
        pub notes: Vec<NoteDetail>,
        pub recent: Option<Vec<NoteRef>>,
        pub shopping_lists: Option<Vec<ShoppingListSummary>>,
        pub fail_delete: bool,
        /// Scheduler yields before answering.
        pub delay: usize,
        pub calls: RefCell<Vec<String>>,
    }

    impl FakeRemote {
        async fn answer<T: Clone>(&self, call: String, value: Option<&T>) -> ApiResult<T> {
            self.calls.borrow_mut().push(call);
            for _ in 0..self.delay {
                tokio::task::yield_now().await;
            }
            value.cloned().ok_or_else(offline)
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl TreeRemote for FakeRemote {
        async fn fetch_tree(&self) -> ApiResult<TreeSnapshot> {
            self.answer("fetch_tree".to_string(), self.tree.as_ref()).await
        }

        async fn fetch_note(&self, note_id: &str) -> ApiResult<NoteDetail> {
            let note = self.notes.iter().find(|n| n.id == note_id);
            self.answer(format!("fetch_note {note_id}"), note).await
        }

        async fn fetch_recent_notes(&self, limit: usize) -> ApiResult<Vec<NoteRef>> {
            let res = self
                .answer(format!("fetch_recent_notes {limit}"), self.recent.as_ref())
                .await?;
            Ok(res.into_iter().take(limit).collect())
        }

        async fn delete_recent_note(&self, note_id: &str) -> ApiResult<()> {
            let ok = (!self.fail_delete).then_some(());
            self.answer(format!("delete_recent_note {note_id}"), ok.as_ref())
                .await
        }

        async fn fetch_shopping_lists(&self, limit: usize) -> ApiResult<Vec<ShoppingListSummary>> {
            let res = self
                .answer(
                    format!("fetch_shopping_lists {limit}"),
                    self.shopping_lists.as_ref(),
                )
                .await?;
            Ok(res.into_iter().take(limit).collect())
        }
    }

    pub fn note_detail(id: &str, title: &str) -> NoteDetail {
        NoteDetail {
            id: id.to_string(),
            title: title.to_string(),
            extra: Default::default(),
        }
    }
}
