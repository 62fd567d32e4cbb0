mod notebook_tree;

pub(crate) use notebook_tree::NotebookTree;

use leptos::prelude::*;
use leptos_router::NavigateOptions;

/// Navigates unless the owner of `navigate` has been disposed in the
/// meantime. Returns whether navigation happened.
///
/// For callbacks that run after awaited API calls.
pub(crate) fn navigate_to<N>(navigate: StoredValue<N>, path: &str) -> bool
where
    N: Fn(&str, NavigateOptions) + Send + Sync + 'static,
{
    let done = navigate.try_with_value(|nav| nav(path, NavigateOptions::default()));
    if done.is_none() {
        tracing::debug!(path, "navigation skipped, view is gone");
    }
    done.is_some()
}
