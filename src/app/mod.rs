use crate::config::EnvConfig;
use crate::pages::{AppLayout, HomePage, NotePage, NotebookPage, ShoppingListPage};
use crate::state::tree_sync::TreeSyncController;
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    let cfg = EnvConfig::from_window();
    let ctx = AppContext(AppState::new(&cfg));
    provide_context(ctx);
    let sync = TreeSyncController::new(ctx);
    provide_context(sync);
    sync.load_sidebar();

    // Router hooks (location, params) need the <Router> context.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("notes/:id") view=move || view! {
                    <AppLayout>
                        <NotePage />
                    </AppLayout>
                } />
                <Route path=path!("notebooks/:id") view=move || view! {
                    <AppLayout>
                        <NotebookPage />
                    </AppLayout>
                } />
                <Route path=path!("shopping-lists/:id") view=move || view! {
                    <AppLayout>
                        <ShoppingListPage />
                    </AppLayout>
                } />
                <Route path=path!("") view=move || view! {
                    <AppLayout>
                        <HomePage />
                    </AppLayout>
                } />
            </Routes>
        </Router>
    }
}
