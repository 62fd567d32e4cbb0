use super::navigate_to;
use crate::auto_expand::{AutoExpandAction, AutoExpandController, RouteTarget};
use crate::models::{NoteLocation, NoteRef, NotebookNode, SectionNode};
use crate::state::tree_sync::TreeSyncController;
use crate::state::AppContext;
use crate::tree::moves::{DragItem, DropTarget, DRAG_MIME};
use icons::{ChevronDown, ChevronRight, Loader};
use leptos::prelude::*;
use leptos_router::hooks::{use_location, use_navigate};
use leptos_router::NavigateOptions;

type Navigate = Box<dyn Fn(&str, NavigateOptions) + Send + Sync>;

/// Router navigation owned by the whole tree, not by one row. Rows are
/// rebuilt whenever the tree changes, which can happen while a row's
/// request is still in flight.
#[derive(Clone, Copy)]
struct TreeNavigate(StoredValue<Navigate>);

fn start_drag(ev: &web_sys::DragEvent, item: &DragItem) {
    ev.stop_propagation();
    if let Some(dt) = ev.data_transfer() {
        let _ = dt.set_data(DRAG_MIME, &item.encode());
        dt.set_effect_allowed("move");
    }
}

fn allow_drop(ev: &web_sys::DragEvent) {
    ev.prevent_default();
    if let Some(dt) = ev.data_transfer() {
        dt.set_drop_effect("move");
    }
}

fn drop_on(ev: &web_sys::DragEvent, sync: TreeSyncController, target: DropTarget) {
    ev.prevent_default();
    ev.stop_propagation();

    let dragged = ev
        .data_transfer()
        .and_then(|dt| dt.get_data(DRAG_MIME).ok())
        .and_then(|raw| DragItem::decode(&raw));
    if let Some(item) = dragged {
        sync.handle_drop(item, target);
    }
}

fn note_href(note_id: &str) -> String {
    format!("/notes/{}", urlencoding::encode(note_id))
}

#[component]
fn Chevron(open: Signal<bool>) -> impl IntoView {
    view! {
        <Show
            when=move || open.get()
            fallback=|| view! { <ChevronRight class="size-4 text-muted-foreground" /> }
        >
            <ChevronDown class="size-4 text-muted-foreground" />
        </Show>
    }
}

#[component]
fn GroupHeader(label: &'static str, open: Signal<bool>, on_toggle: Callback<()>) -> impl IntoView {
    view! {
        <button
            type="button"
            class="flex w-full items-center gap-1 rounded-md px-1 py-1 text-xs font-medium uppercase text-muted-foreground hover:bg-surface-hover"
            on:click=move |_| on_toggle.run(())
        >
            <Chevron open=open />
            <span>{label}</span>
        </button>
    }
}

#[component]
fn NoteItem(note: NoteRef, container: NoteLocation) -> impl IntoView {
    let sync = expect_context::<TreeSyncController>();
    let location = use_location();

    let note_id = note.id.clone();
    let is_active =
        move || RouteTarget::parse(&location.pathname.get()) == RouteTarget::Note(note_id.clone());

    let notebook_id = container.notebook_id().map(str::to_string);
    let section_id = container.section_id().map(str::to_string);
    let drag_item = DragItem::Note {
        id: note.id.clone(),
        notebook_id: notebook_id.clone(),
        section_id: section_id.clone(),
    };
    let target = DropTarget::Note {
        id: note.id.clone(),
        notebook_id,
        section_id,
    };

    view! {
        <a
            href=note_href(&note.id)
            draggable="true"
            class=move || {
                if is_active() {
                    "block truncate rounded-md bg-surface-hover px-2 py-0.5 font-medium"
                } else {
                    "block truncate rounded-md px-2 py-0.5 hover:bg-surface-hover"
                }
            }
            on:dragstart=move |ev: web_sys::DragEvent| start_drag(&ev, &drag_item)
            on:dragover=move |ev: web_sys::DragEvent| allow_drop(&ev)
            on:drop=move |ev: web_sys::DragEvent| drop_on(&ev, sync, target.clone())
        >
            {note.title}
        </a>
    }
}

#[component]
fn SectionItem(notebook_id: String, section: SectionNode) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let sync = expect_context::<TreeSyncController>();
    let expansion = app_state.0.expansion;
    let navigate = expect_context::<TreeNavigate>().0;

    let section_id = StoredValue::new(section.id.clone());
    let open = Signal::derive(move || section_id.with_value(|id| expansion.is_section_expanded(id)));

    let drag_item = DragItem::Section {
        id: section.id.clone(),
        notebook_id: notebook_id.clone(),
    };
    let target = DropTarget::Section {
        id: section.id.clone(),
        notebook_id: notebook_id.clone(),
    };
    let container = NoteLocation::Section {
        notebook_id: notebook_id.clone(),
        section_id: section.id.clone(),
    };
    let notes = section.notes;

    let create_note = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        sync.create_note_in_section(
            notebook_id.clone(),
            Some(section_id.get_value()),
            move |note_id| {
                navigate_to(navigate, &note_href(&note_id));
            },
        );
    };

    view! {
        <div>
            <div
                class="group flex items-center gap-1 rounded-md px-1 py-0.5 hover:bg-surface-hover"
                draggable="true"
                on:dragstart=move |ev: web_sys::DragEvent| start_drag(&ev, &drag_item)
                on:dragover=move |ev: web_sys::DragEvent| allow_drop(&ev)
                on:drop=move |ev: web_sys::DragEvent| drop_on(&ev, sync, target.clone())
            >
                <button
                    type="button"
                    class="shrink-0"
                    on:click=move |_| section_id.with_value(|id| expansion.toggle_section(id))
                >
                    <Chevron open=open />
                </button>
                <span class="min-w-0 flex-1 truncate text-muted-foreground">{section.title}</span>
                <button
                    type="button"
                    class="hidden h-5 w-5 shrink-0 rounded text-xs text-muted-foreground hover:bg-background group-hover:block"
                    title="New note in section"
                    on:click=create_note
                >
                    "+"
                </button>
            </div>
            <Show when=move || open.get()>
                <div class="ml-4 space-y-0.5">
                    {notes
                        .iter()
                        .cloned()
                        .map(|note| view! { <NoteItem note=note container=container.clone() /> })
                        .collect_view()}
                </div>
            </Show>
        </div>
    }
}

#[component]
fn NotebookItem(notebook: NotebookNode) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let sync = expect_context::<TreeSyncController>();
    let expansion = app_state.0.expansion;

    let id = StoredValue::new(notebook.id.clone());
    let open = Signal::derive(move || id.with_value(|id| expansion.is_notebook_expanded(id)));
    let target = DropTarget::Notebook {
        id: notebook.id.clone(),
    };
    let href = format!("/notebooks/{}", urlencoding::encode(&notebook.id));
    let NotebookNode {
        id: notebook_id,
        title,
        sections,
        unsectioned,
    } = notebook;

    view! {
        <div>
            <div
                class="group flex items-center gap-1 rounded-md px-1 py-1 hover:bg-surface-hover"
                on:dragover=move |ev: web_sys::DragEvent| allow_drop(&ev)
                on:drop=move |ev: web_sys::DragEvent| drop_on(&ev, sync, target.clone())
            >
                <button
                    type="button"
                    class="shrink-0"
                    on:click=move |_| id.with_value(|id| expansion.toggle_notebook(id))
                >
                    <Chevron open=open />
                </button>
                <a href=href class="min-w-0 flex-1 truncate">{title}</a>
            </div>
            <Show when=move || open.get()>
                <div class="ml-4 space-y-0.5">
                    {sections
                        .iter()
                        .cloned()
                        .map(|section| {
                            view! { <SectionItem notebook_id=notebook_id.clone() section=section /> }
                        })
                        .collect_view()}
                    {unsectioned
                        .iter()
                        .cloned()
                        .map(|note| {
                            let container = NoteLocation::Unsectioned {
                                notebook_id: notebook_id.clone(),
                            };
                            view! { <NoteItem note=note container=container /> }
                        })
                        .collect_view()}
                </div>
            </Show>
        </div>
    }
}

/// Sidebar tree: notebooks, unassigned notes, recent notes and shopping
/// lists. Opens the branch holding the current page when the route changes.
#[component]
pub fn NotebookTree() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let sync = expect_context::<TreeSyncController>();
    let tree = app_state.0.tree;
    let expansion = app_state.0.expansion;
    let recent = app_state.0.recent_notes;
    let recent_limit = app_state.0.recent_notes_limit;
    let shopping_lists = app_state.0.shopping_lists;
    let location = use_location();
    let navigate: Navigate = Box::new(use_navigate());
    provide_context(TreeNavigate(StoredValue::new(navigate)));

    // The controller lives in the effect so its memo survives re-runs.
    let mut auto_expand = AutoExpandController::new(tree.tree.with_untracked(|t| t.unassigned_count()));
    Effect::new(move |_| {
        let route = RouteTarget::parse(&location.pathname.get());
        let loading = tree.loading.get();
        let actions = tree.tree.with(|t| auto_expand.evaluate(&route, t, loading));

        for action in actions {
            tracing::debug!(?action, "auto-expand");
            match action {
                AutoExpandAction::AddRecent(note) => recent.add_recent_note(note, recent_limit),
                AutoExpandAction::ExpandNotebook(id) => expansion.expand_notebook(&id),
                AutoExpandAction::ExpandSection(id) => expansion.expand_section(&id),
                AutoExpandAction::ExpandUnassigned => expansion.expand_unassigned(),
            }
        }
    });

    let new_notebook: RwSignal<String> = RwSignal::new(String::new());
    let submit_notebook = move || {
        let name = new_notebook.get_untracked();
        if name.trim().is_empty() {
            return;
        }
        sync.create_notebook(name);
        new_notebook.set(String::new());
    };

    let all_open = move || tree.tree.with(|t| expansion.state.with(|s| s.all_expanded(t)));

    view! {
        <nav class="space-y-3 text-sm">
            <div class="flex items-center justify-between">
                <span class="text-xs font-medium uppercase text-muted-foreground">"Notebooks"</span>
                <div class="flex items-center gap-1">
                    <Show when=move || tree.loading.get()>
                        <Loader
                            class="size-3 animate-spin text-muted-foreground"
                            attr:role="status"
                            attr:aria-label="Loading"
                        />
                    </Show>
                    <button
                        type="button"
                        class="rounded px-1 text-xs text-muted-foreground hover:bg-surface-hover"
                        on:click=move |_| tree.tree.with_untracked(|t| expansion.toggle_all(t))
                    >
                        {move || if all_open() { "Collapse all" } else { "Expand all" }}
                    </button>
                    <button
                        type="button"
                        class="rounded px-1 text-xs text-muted-foreground hover:bg-surface-hover"
                        title="Reload"
                        on:click=move |_| sync.refresh_tree()
                    >
                        "↻"
                    </button>
                </div>
            </div>

            <Show when=move || !sync.is_backend_online()>
                <div class="text-[11px] text-muted-foreground">"Offline. Changes are not being saved."</div>
            </Show>
            {move || tree.error.get().map(|e| view! { <div class="text-[11px] text-destructive">{e}</div> })}
            {move || {
                sync.last_error()
                    .map(|e| {
                        view! {
                            <div class="flex items-center justify-between gap-2 text-[11px] text-destructive">
                                <span class="min-w-0 truncate">{e}</span>
                                <button type="button" on:click=move |_| sync.clear_error()>
                                    "Dismiss"
                                </button>
                            </div>
                        }
                    })
            }}

            <input
                class="h-8 w-full rounded-md border border-border bg-background px-2 text-sm"
                placeholder="New notebook"
                prop:value=move || new_notebook.get()
                on:input=move |ev| new_notebook.set(event_target_value(&ev))
                on:keydown=move |ev: web_sys::KeyboardEvent| {
                    if ev.key() == "Enter" {
                        ev.prevent_default();
                        submit_notebook();
                    }
                }
            />

            <div class="space-y-0.5">
                {move || {
                    tree.tree
                        .with(|t| t.notebooks.clone())
                        .into_iter()
                        .map(|notebook| view! { <NotebookItem notebook=notebook /> })
                        .collect_view()
                }}
            </div>

            <div
                on:dragover=move |ev: web_sys::DragEvent| allow_drop(&ev)
                on:drop=move |ev: web_sys::DragEvent| drop_on(&ev, sync, DropTarget::Unassigned)
            >
                <GroupHeader
                    label="Unassigned"
                    open=Signal::derive(move || expansion.state.with(|s| s.unassigned))
                    on_toggle=Callback::new(move |_| expansion.toggle_unassigned())
                />
                <Show when=move || expansion.state.with(|s| s.unassigned)>
                    <div class="ml-4 space-y-0.5">
                        {move || {
                            tree.tree
                                .with(|t| t.unassigned.clone())
                                .into_iter()
                                .map(|note| view! { <NoteItem note=note container=NoteLocation::Unassigned /> })
                                .collect_view()
                        }}
                    </div>
                </Show>
            </div>

            <div>
                <GroupHeader
                    label="Recent"
                    open=Signal::derive(move || expansion.state.with(|s| s.recent))
                    on_toggle=Callback::new(move |_| expansion.toggle_recent())
                />
                <Show when=move || expansion.state.with(|s| s.recent)>
                    <div class="ml-4 space-y-0.5">
                        {move || {
                            recent
                                .notes
                                .get()
                                .into_iter()
                                .map(|note| {
                                    let id = note.id.clone();
                                    view! {
                                        <div class="group flex items-center gap-1">
                                            <a
                                                href=note_href(&note.id)
                                                class="min-w-0 flex-1 truncate rounded-md px-2 py-0.5 hover:bg-surface-hover"
                                            >
                                                {note.title}
                                            </a>
                                            <button
                                                type="button"
                                                class="hidden shrink-0 px-1 text-xs text-muted-foreground group-hover:block"
                                                title="Remove from recent"
                                                on:click=move |_| sync.remove_recent_note(id.clone())
                                            >
                                                "×"
                                            </button>
                                        </div>
                                    }
                                })
                                .collect_view()
                        }}
                        {move || recent.error.get().map(|e| view! { <div class="text-[11px] text-destructive">{e}</div> })}
                    </div>
                </Show>
            </div>

            <div>
                <GroupHeader
                    label="Shopping lists"
                    open=Signal::derive(move || expansion.state.with(|s| s.shopping_lists))
                    on_toggle=Callback::new(move |_| expansion.toggle_shopping_lists())
                />
                <Show when=move || expansion.state.with(|s| s.shopping_lists)>
                    <div class="ml-4 space-y-0.5">
                        {move || {
                            shopping_lists
                                .lists
                                .get()
                                .into_iter()
                                .map(|list| {
                                    view! {
                                        <a
                                            href=format!("/shopping-lists/{}", urlencoding::encode(&list.id))
                                            class="block truncate rounded-md px-2 py-0.5 hover:bg-surface-hover"
                                        >
                                            {list.title}
                                        </a>
                                    }
                                })
                                .collect_view()
                        }}
                        {move || shopping_lists.error.get().map(|e| view! { <div class="text-[11px] text-destructive">{e}</div> })}
                    </div>
                </Show>
            </div>
        </nav>
    }
}
