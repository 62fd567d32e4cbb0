use crate::components::{navigate_to, NotebookTree};
use crate::expansion::{CollapsedSections, UNSECTIONED_ID};
use crate::models::{NoteLocation, NoteRef, SectionNode};
use crate::state::tree_sync::TreeSyncController;
use crate::state::AppContext;
use crate::storage::BrowserStorage;
use crate::tree::moves::{move_targets, MoveTarget};
use crate::tree::TreeState;
use leptos::prelude::*;
use leptos_router::hooks::{use_navigate, use_params};
use leptos_router::params::Params;

/// Sidebar plus page content.
#[component]
pub fn AppLayout(children: Children) -> impl IntoView {
    view! {
        <div class="min-h-screen bg-background text-foreground">
            <div class="mx-auto flex min-h-screen w-full max-w-5xl gap-4 px-4 py-6">
                <aside class="w-64 shrink-0">
                    <div class="sticky top-6 space-y-4">
                        <a href="/" class="text-sm font-medium text-foreground">"Sigil"</a>
                        <NotebookTree />
                    </div>
                </aside>
                <main class="min-w-0 flex-1">{children()}</main>
            </div>
        </div>
    }
}

#[component]
pub fn HomePage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let tree = app_state.0.tree;

    view! {
        <div class="space-y-2 py-8">
            <h1 class="text-lg font-medium">"Notebooks"</h1>
            <p class="text-sm text-muted-foreground">
                {move || {
                    tree.tree
                        .with(|t| {
                            format!(
                                "{} notebooks, {} notes, {} unassigned",
                                t.notebooks.len(),
                                t.all_note_ids().len(),
                                t.unassigned_count(),
                            )
                        })
                }}
            </p>
        </div>
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct IdRouteParams {
    pub id: Option<String>,
}

type RouteParams = Memo<Result<IdRouteParams, leptos_router::params::ParamsError>>;

fn route_id(params: RouteParams) -> String {
    params.get().ok().and_then(|p| p.id).unwrap_or_default()
}

// For event handlers.
fn route_id_untracked(params: RouteParams) -> String {
    params.get_untracked().ok().and_then(|p| p.id).unwrap_or_default()
}

fn location_label(loc: Option<&NoteLocation>, titles: impl Fn(&str, Option<&str>) -> String) -> String {
    match loc {
        None => "Not in the tree".to_string(),
        Some(NoteLocation::Unassigned) => "Unassigned".to_string(),
        Some(NoteLocation::Unsectioned { notebook_id }) => titles(notebook_id, None),
        Some(NoteLocation::Section {
            notebook_id,
            section_id,
        }) => titles(notebook_id, Some(section_id)),
    }
}

/// Title of the routed note, or "Untitled" when it is not in the tree.
fn note_title_memo(
    tree: RwSignal<TreeState>,
    note_id: impl Fn() -> String + Send + Sync + 'static,
) -> Memo<String> {
    Memo::new(move |_| {
        let id = note_id();
        tree.with(|t| t.find_note(&id).map(|n| n.title.clone()))
            .unwrap_or_else(|| "Untitled".to_string())
    })
}

#[component]
pub fn NotePage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let sync = expect_context::<TreeSyncController>();
    let tree = app_state.0.tree;
    let params = use_params::<IdRouteParams>();
    let note_id = move || route_id(params);

    let title = note_title_memo(tree.tree, note_id);

    let location = move || {
        let id = note_id();
        tree.tree.with(|t| {
            location_label(t.find_note_location(&id).as_ref(), |nb, section| {
                let Some(notebook) = t.notebook(nb) else {
                    return String::new();
                };
                match section.and_then(|sid| notebook.sections.iter().find(|s| s.id == sid)) {
                    Some(s) => format!("{} / {}", notebook.title, s.title),
                    None => notebook.title.clone(),
                }
            })
        })
    };

    // Index into `move_targets`; the current location is preselected.
    let selected = move || {
        let id = note_id();
        tree.tree.with(|t| {
            let current = t.find_note_location(&id).map(|l| MoveTarget::from_location(&l));
            move_targets(t)
                .iter()
                .position(|(_, target)| Some(target) == current.as_ref())
                .map(|i| i.to_string())
                .unwrap_or_default()
        })
    };

    let on_move = move |ev: web_sys::Event| {
        let Ok(index) = event_target_value(&ev).parse::<usize>() else {
            return;
        };
        let target = tree
            .tree
            .with_untracked(|t| move_targets(t).into_iter().nth(index).map(|(_, target)| target));
        if let Some(target) = target {
            sync.move_note(route_id_untracked(params), target);
        }
    };

    let navigate = StoredValue::new(use_navigate());
    let title_value: RwSignal<String> = RwSignal::new(String::new());
    // Only a changed title resets the input; other tree edits keep the draft.
    Effect::new(move |_| title_value.set(title.get()));

    let submit_title = move || {
        sync.rename_note(route_id_untracked(params), title_value.get_untracked());
    };
    let on_delete = move |_| {
        sync.delete_note(route_id_untracked(params), move || {
            navigate_to(navigate, "/");
        });
    };

    view! {
        <div class="space-y-4 py-8">
            <input
                class="h-9 w-full rounded-md border border-border bg-background px-2 text-lg font-medium"
                prop:value=move || title_value.get()
                on:input=move |ev| title_value.set(event_target_value(&ev))
                on:keydown=move |ev: web_sys::KeyboardEvent| {
                    if ev.key() == "Enter" {
                        ev.prevent_default();
                        submit_title();
                    }
                }
            />
            <div class="text-xs text-muted-foreground">{location}</div>
            <label class="flex items-center gap-2 text-sm">
                <span class="text-muted-foreground">"Move to"</span>
                <select
                    class="h-8 rounded-md border border-border bg-background px-2 text-sm"
                    prop:value=selected
                    on:change=on_move
                >
                    <option value="" disabled=true>"Choose a location"</option>
                    {move || {
                        tree.tree
                            .with(move_targets)
                            .into_iter()
                            .enumerate()
                            .map(|(i, (label, _))| view! { <option value=i.to_string()>{label}</option> })
                            .collect_view()
                    }}
                </select>
            </label>
            <div class="flex items-center gap-2 text-xs">
                <button
                    type="button"
                    class="rounded px-2 py-1 text-muted-foreground hover:bg-surface-hover"
                    on:click=move |_| sync.enable_shopping_list(route_id_untracked(params))
                >
                    "Use as shopping list"
                </button>
                <button
                    type="button"
                    class="rounded px-2 py-1 text-muted-foreground hover:bg-surface-hover"
                    on:click=move |_| sync.disable_shopping_list(route_id_untracked(params))
                >
                    "Stop using as shopping list"
                </button>
                <button
                    type="button"
                    class="rounded px-2 py-1 text-destructive hover:bg-surface-hover"
                    on:click=on_delete
                >
                    "Delete note"
                </button>
            </div>
        </div>
    }
}

#[component]
fn NotebookSection(
    notebook_id: String,
    section_key: String,
    title: String,
    notes: Vec<NoteRef>,
    #[prop(optional)] section: Option<SectionNode>,
) -> impl IntoView {
    let sync = expect_context::<TreeSyncController>();
    let collapsed = StoredValue::new(CollapsedSections::new(&notebook_id, BrowserStorage));
    let key = StoredValue::new(section_key);
    // Storage is not reactive; bump to re-read it after a toggle.
    let version: RwSignal<u32> = RwSignal::new(0);

    let is_collapsed = move || {
        version.track();
        collapsed.with_value(|c| key.with_value(|k| c.is_collapsed(k)))
    };
    let toggle = move |_| {
        collapsed.with_value(|c| key.with_value(|k| c.toggle(k)));
        version.update(|v| *v = v.wrapping_add(1));
    };

    let rename_value: RwSignal<String> = RwSignal::new(title.clone());
    let section_id = section.map(|s| s.id);
    let actions = section_id.map(|sid| {
        let sid = StoredValue::new(sid);
        view! {
            <div class="flex items-center gap-1">
                <input
                    class="h-7 w-40 rounded-md border border-border bg-background px-2 text-xs"
                    prop:value=move || rename_value.get()
                    on:input=move |ev| rename_value.set(event_target_value(&ev))
                    on:keydown=move |ev: web_sys::KeyboardEvent| {
                        if ev.key() == "Enter" {
                            ev.prevent_default();
                            let name = rename_value.get_untracked();
                            if !name.trim().is_empty() {
                                sync.rename_section(sid.get_value(), name.trim().to_string());
                            }
                        }
                    }
                />
                <button
                    type="button"
                    class="rounded px-2 text-xs text-destructive hover:bg-surface-hover"
                    on:click=move |_| sync.delete_section(sid.get_value())
                >
                    "Delete"
                </button>
            </div>
        }
    });

    view! {
        <section class="rounded-md border border-border p-3">
            <div class="flex items-center justify-between gap-2">
                <button type="button" class="text-sm font-medium" on:click=toggle>
                    {move || if is_collapsed() { "▸ " } else { "▾ " }}
                    {title}
                </button>
                {actions}
            </div>
            <Show when=move || !is_collapsed()>
                <ul class="mt-2 space-y-1 text-sm">
                    {notes
                        .iter()
                        .map(|n| {
                            view! {
                                <li>
                                    <a
                                        href=format!("/notes/{}", urlencoding::encode(&n.id))
                                        class="hover:underline"
                                    >
                                        {n.title.clone()}
                                    </a>
                                </li>
                            }
                        })
                        .collect_view()}
                </ul>
            </Show>
        </section>
    }
}

#[component]
pub fn NotebookPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let sync = expect_context::<TreeSyncController>();
    let tree = app_state.0.tree;
    let params = use_params::<IdRouteParams>();
    let navigate = StoredValue::new(use_navigate());
    let notebook_id = move || route_id(params);

    let notebook = move || {
        let id = notebook_id();
        tree.tree.with(|t| t.notebook(&id).cloned())
    };

    let rename_value: RwSignal<String> = RwSignal::new(String::new());
    let new_section: RwSignal<String> = RwSignal::new(String::new());

    Effect::new(move |_| {
        if let Some(nb) = notebook() {
            rename_value.set(nb.title);
        }
    });

    let submit_rename = move || {
        let name = rename_value.get_untracked();
        if name.trim().is_empty() {
            return;
        }
        sync.rename_notebook(route_id_untracked(params), name.trim().to_string());
    };

    let submit_section = move || {
        let name = new_section.get_untracked();
        if name.trim().is_empty() {
            return;
        }
        sync.create_section(route_id_untracked(params), name);
        new_section.set(String::new());
    };

    // Leave the page only once the server has deleted the notebook.
    let on_delete = move |_| {
        sync.delete_notebook(route_id_untracked(params), move || {
            navigate_to(navigate, "/");
        });
    };

    view! {
        <div class="space-y-4 py-8">
            <Show
                when=move || notebook().is_some()
                fallback=move || {
                    view! {
                        <div class="text-sm text-muted-foreground">
                            {move || if tree.loading.get() { "Loading…" } else { "Notebook not found" }}
                        </div>
                    }
                }
            >
                <div class="flex items-center gap-2">
                    <input
                        class="h-9 min-w-0 flex-1 rounded-md border border-border bg-background px-2 text-lg font-medium"
                        prop:value=move || rename_value.get()
                        on:input=move |ev| rename_value.set(event_target_value(&ev))
                        on:keydown=move |ev: web_sys::KeyboardEvent| {
                            if ev.key() == "Enter" {
                                ev.prevent_default();
                                submit_rename();
                            }
                        }
                    />
                    <button
                        type="button"
                        class="rounded px-2 text-xs text-destructive hover:bg-surface-hover"
                        on:click=on_delete
                    >
                        "Delete notebook"
                    </button>
                </div>

                <input
                    class="h-8 w-full rounded-md border border-border bg-background px-2 text-sm"
                    placeholder="New section"
                    prop:value=move || new_section.get()
                    on:input=move |ev| new_section.set(event_target_value(&ev))
                    on:keydown=move |ev: web_sys::KeyboardEvent| {
                        if ev.key() == "Enter" {
                            ev.prevent_default();
                            submit_section();
                        }
                    }
                />

                <div class="space-y-3">
                    {move || {
                        notebook()
                            .map(|nb| {
                                let sections = nb
                                    .sections
                                    .into_iter()
                                    .map(|s| {
                                        let section_key = s.id.clone();
                                        let title = s.title.clone();
                                        let notes = s.notes.clone();
                                        view! {
                                            <NotebookSection
                                                notebook_id=nb.id.clone()
                                                section_key
                                                title
                                                notes
                                                section=s
                                            />
                                        }
                                    })
                                    .collect_view();
                                view! {
                                    {sections}
                                    <NotebookSection
                                        notebook_id=nb.id.clone()
                                        section_key=UNSECTIONED_ID.to_string()
                                        title="Unsectioned".to_string()
                                        notes=nb.unsectioned
                                    />
                                }
                            })
                    }}
                </div>
            </Show>
        </div>
    }
}

#[component]
pub fn ShoppingListPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let sync = expect_context::<TreeSyncController>();
    let lists = app_state.0.shopping_lists;
    let params = use_params::<IdRouteParams>();

    Effect::new(move |_| {
        let id = route_id(params);
        if !id.is_empty() {
            sync.refresh_shopping_list(id);
        }
    });

    let title = move || {
        let id = route_id(params);
        lists
            .lists
            .with(|ls| ls.iter().find(|l| l.id == id).map(|l| l.title.clone()))
            .unwrap_or_else(|| "Shopping list".to_string())
    };

    view! {
        <div class="py-8">
            <h1 class="text-lg font-medium">{title}</h1>
        </div>
    }
}
