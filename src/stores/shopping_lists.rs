use super::{begin_request, is_current};
use crate::api::TreeRemote;
use crate::config::SHOPPING_LIST_LIMIT;
use crate::models::ShoppingListSummary;
use leptos::prelude::*;

pub(crate) const FETCH_SHOPPING_LISTS_ERROR: &str = "Failed to load shopping lists";

/// Newest-first shopping lists shown in the sidebar, capped at
/// [`SHOPPING_LIST_LIMIT`].
#[derive(Clone, Copy)]
pub(crate) struct ShoppingListStore {
    pub lists: RwSignal<Vec<ShoppingListSummary>>,
    pub loading: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
    request_id: RwSignal<u64>,
}

impl ShoppingListStore {
    pub fn new() -> Self {
        Self {
            lists: RwSignal::new(vec![]),
            loading: RwSignal::new(false),
            error: RwSignal::new(None),
            request_id: RwSignal::new(0),
        }
    }

    pub async fn fetch_shopping_lists(&self, remote: &impl TreeRemote) {
        let req_id = begin_request(self.request_id);
        self.loading.set(true);
        self.error.set(None);

        let result = remote.fetch_shopping_lists(SHOPPING_LIST_LIMIT).await;
        if !is_current(self.request_id, req_id) {
            return;
        }

        match result {
            Ok(lists) => {
                self.lists.try_set(lists);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load shopping lists");
                self.error
                    .try_set(Some(FETCH_SHOPPING_LISTS_ERROR.to_string()));
            }
        }
        self.loading.try_set(false);
    }

    /// Ids are fresh from the server, so there is nothing to de-dup.
    pub fn add_shopping_list(&self, list: ShoppingListSummary) {
        self.lists.update(|lists| {
            lists.insert(0, list);
            lists.truncate(SHOPPING_LIST_LIMIT);
        });
    }

    pub fn update_shopping_list_title(&self, list_id: &str, title: &str) {
        self.lists.update(|lists| {
            if let Some(l) = lists.iter_mut().find(|l| l.id == list_id) {
                l.title = title.to_string();
            }
        });
    }

    /// Local only; the caller has already deleted it remotely.
    pub fn delete_shopping_list(&self, list_id: &str) {
        self.lists.update(|lists| lists.retain(|l| l.id != list_id));
    }
}

impl Default for ShoppingListStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(id: &str) -> ShoppingListSummary {
        ShoppingListSummary {
            id: id.to_string(),
            title: format!("List {id}"),
        }
    }

    #[test]
    fn test_add_shopping_list_caps_at_five_newest_first() {
        let store = ShoppingListStore::new();
        for id in ["l1", "l2", "l3", "l4", "l5", "l6"] {
            store.add_shopping_list(list(id));
        }

        let ids: Vec<String> = store.lists.get_untracked().into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec!["l6", "l5", "l4", "l3", "l2"]);
    }

    #[test]
    fn test_update_and_delete_are_local() {
        let store = ShoppingListStore::new();
        store.add_shopping_list(list("l1"));
        store.add_shopping_list(list("l2"));

        store.update_shopping_list_title("l1", "Groceries");
        store.delete_shopping_list("l2");
        store.delete_shopping_list("missing");

        assert_eq!(
            store.lists.get_untracked(),
            vec![ShoppingListSummary {
                id: "l1".to_string(),
                title: "Groceries".to_string()
            }]
        );
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[tokio::test]
    async fn test_fetch_shopping_lists_uses_cap_and_keeps_state_on_error() {
        use crate::stores::fake::FakeRemote;

        let store = ShoppingListStore::new();
        let remote = FakeRemote {
            shopping_lists: Some(vec![list("l1"), list("l2")]),
            ..Default::default()
        };
        store.fetch_shopping_lists(&remote).await;
        assert_eq!(store.lists.get_untracked().len(), 2);
        assert_eq!(remote.calls(), vec!["fetch_shopping_lists 5".to_string()]);

        store.fetch_shopping_lists(&FakeRemote::default()).await;
        assert_eq!(store.lists.get_untracked().len(), 2);
        assert_eq!(
            store.error.get_untracked().as_deref(),
            Some(FETCH_SHOPPING_LISTS_ERROR)
        );
    }
}
