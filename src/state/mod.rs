pub(crate) mod tree_sync;

use crate::api::ApiClient;
use crate::config::EnvConfig;
use crate::expansion::ExpansionStore;
use crate::stores::{RecentNotesStore, ShoppingListStore, TreeStore};
use leptos::prelude::*;

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,

    /// From `window.ENV.RECENT_NOTES_LIMIT`.
    pub recent_notes_limit: usize,

    pub tree: TreeStore,
    pub recent_notes: RecentNotesStore,
    pub shopping_lists: ShoppingListStore,

    /// Sidebar open/closed state, restored from localStorage.
    pub expansion: ExpansionStore,
}

impl AppState {
    pub fn new(cfg: &EnvConfig) -> Self {
        Self {
            api_client: RwSignal::new(ApiClient::new(cfg.api_url.clone())),
            recent_notes_limit: cfg.recent_notes_limit,
            tree: TreeStore::new(),
            recent_notes: RecentNotesStore::new(),
            shopping_lists: ShoppingListStore::new(),
            expansion: ExpansionStore::new(),
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);
