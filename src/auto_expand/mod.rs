//! Route-driven side effects on the sidebar: register visited notes as
//! recent and open the notebook/section that contains the current page.
//!
//! Each effect fires once per distinct id, so a notebook the user folds by
//! hand stays folded until they navigate somewhere else.

use crate::models::{NoteLocation, NoteRef};
use crate::tree::TreeState;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RouteTarget {
    Note(String),
    Notebook(String),
    /// Any other page; carries the id segment if the route has one.
    Other(Option<String>),
}

impl RouteTarget {
    pub fn parse(pathname: &str) -> Self {
        let mut parts = pathname.trim_matches('/').split('/');
        let head = parts.next().unwrap_or_default();
        let id = parts
            .next()
            .filter(|s| !s.is_empty())
            .map(|s| {
                urlencoding::decode(s)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| s.to_string())
            });

        match (head, id) {
            ("notes", Some(id)) => Self::Note(id),
            ("notebooks", Some(id)) => Self::Notebook(id),
            (_, id) => Self::Other(id),
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Note(id) | Self::Notebook(id) => Some(id),
            Self::Other(id) => id.as_deref(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum AutoExpandAction {
    AddRecent(NoteRef),
    ExpandNotebook(String),
    ExpandSection(String),
    ExpandUnassigned,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct AutoExpandController {
    last_recent_id: Option<String>,
    last_auto_expanded_id: Option<String>,
    prev_unassigned_count: usize,
}

impl AutoExpandController {
    /// `unassigned_count` is the count at mount; only later growth from
    /// zero opens the unassigned group.
    pub fn new(unassigned_count: usize) -> Self {
        Self {
            prev_unassigned_count: unassigned_count,
            ..Default::default()
        }
    }

    /// Called on every change of route, tree or loading flag.
    pub fn evaluate(
        &mut self,
        route: &RouteTarget,
        tree: &TreeState,
        loading: bool,
    ) -> Vec<AutoExpandAction> {
        let mut actions = Vec::new();
        self.track_recent(route, tree, &mut actions);
        self.track_unassigned(tree.unassigned_count(), &mut actions);
        self.track_expansion(route, tree, loading, &mut actions);
        actions
    }

    fn track_recent(&mut self, route: &RouteTarget, tree: &TreeState, out: &mut Vec<AutoExpandAction>) {
        let RouteTarget::Note(id) = route else {
            return;
        };
        if self.last_recent_id.as_deref() == Some(id.as_str()) {
            return;
        }
        // Not in the tree yet: try again once it loads.
        if let Some(note) = tree.find_note(id) {
            self.last_recent_id = Some(id.clone());
            out.push(AutoExpandAction::AddRecent(note.clone()));
        }
    }

    fn track_unassigned(&mut self, count: usize, out: &mut Vec<AutoExpandAction>) {
        if self.prev_unassigned_count == 0 && count > 0 {
            out.push(AutoExpandAction::ExpandUnassigned);
        }
        self.prev_unassigned_count = count;
    }

    fn track_expansion(
        &mut self,
        route: &RouteTarget,
        tree: &TreeState,
        loading: bool,
        out: &mut Vec<AutoExpandAction>,
    ) {
        let Some(id) = route.id() else {
            return;
        };
        if loading || tree.is_empty() || self.last_auto_expanded_id.as_deref() == Some(id) {
            return;
        }
        self.last_auto_expanded_id = Some(id.to_string());

        match route {
            RouteTarget::Note(note_id) => {
                match tree.notebooks.iter().find_map(|nb| nb.locate(note_id)) {
                    Some(NoteLocation::Unsectioned { notebook_id }) => {
                        out.push(AutoExpandAction::ExpandNotebook(notebook_id));
                    }
                    Some(NoteLocation::Section {
                        notebook_id,
                        section_id,
                    }) => {
                        out.push(AutoExpandAction::ExpandNotebook(notebook_id));
                        out.push(AutoExpandAction::ExpandSection(section_id));
                    }
                    Some(NoteLocation::Unassigned) | None => {}
                }
            }
            RouteTarget::Notebook(notebook_id) => {
                if tree.contains_notebook(notebook_id) {
                    out.push(AutoExpandAction::ExpandNotebook(notebook_id.clone()));
                }
            }
            RouteTarget::Other(_) => {}
        }
    }
}
