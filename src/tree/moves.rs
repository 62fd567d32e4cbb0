//! Turning "move this note there" and drag-and-drop gestures into the API
//! calls and store mutations that realize them.
//!
//! Planning is pure; `state::tree_sync` executes the plans.

use super::TreeState;
use crate::models::NoteLocation;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum MoveTarget {
    Unassigned,
    Notebook {
        notebook_id: String,
        section_id: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum MovePlan {
    /// Remove from the notebook; the note falls back to unassigned.
    Detach { notebook_id: String },
    /// Reassign to another section (or unsectioned) of the same notebook.
    WithinNotebook {
        notebook_id: String,
        section_id: Option<String>,
    },
    /// Add to the target notebook, then drop the old membership if any.
    AcrossNotebooks {
        from_notebook_id: Option<String>,
        notebook_id: String,
        section_id: Option<String>,
    },
}

fn is_current_location(current: Option<&NoteLocation>, target: &MoveTarget) -> bool {
    match (current, target) {
        (Some(NoteLocation::Unassigned), MoveTarget::Unassigned) => true,
        (Some(NoteLocation::Unassigned), _) | (None, _) => false,
        (Some(_), MoveTarget::Unassigned) => false,
        (
            Some(loc),
            MoveTarget::Notebook {
                notebook_id,
                section_id,
            },
        ) => loc.notebook_id() == Some(notebook_id) && loc.section_id() == section_id.as_deref(),
    }
}

/// `None` means there is nothing to do: the note is already there, or it is
/// asked to leave a notebook it is not known to be in.
pub(crate) fn plan_note_move(current: Option<&NoteLocation>, target: &MoveTarget) -> Option<MovePlan> {
    if is_current_location(current, target) {
        return None;
    }

    let from_notebook_id = current.and_then(|c| c.notebook_id()).map(|s| s.to_string());

    match target {
        MoveTarget::Unassigned => from_notebook_id.map(|notebook_id| MovePlan::Detach { notebook_id }),
        MoveTarget::Notebook {
            notebook_id,
            section_id,
        } => {
            if from_notebook_id.as_deref() == Some(notebook_id.as_str()) {
                Some(MovePlan::WithinNotebook {
                    notebook_id: notebook_id.clone(),
                    section_id: section_id.clone(),
                })
            } else {
                Some(MovePlan::AcrossNotebooks {
                    from_notebook_id,
                    notebook_id: notebook_id.clone(),
                    section_id: section_id.clone(),
                })
            }
        }
    }
}

/// Every place a note can be moved to, labelled for a picker: unassigned,
/// then each notebook's unsectioned bucket followed by its sections.
pub(crate) fn move_targets(tree: &TreeState) -> Vec<(String, MoveTarget)> {
    let mut out = vec![("Unassigned".to_string(), MoveTarget::Unassigned)];
    for nb in &tree.notebooks {
        out.push((
            format!("{} / Unsectioned", nb.title),
            MoveTarget::Notebook {
                notebook_id: nb.id.clone(),
                section_id: None,
            },
        ));
        for s in &nb.sections {
            out.push((
                format!("{} / {}", nb.title, s.title),
                MoveTarget::Notebook {
                    notebook_id: nb.id.clone(),
                    section_id: Some(s.id.clone()),
                },
            ));
        }
    }
    out
}

impl MoveTarget {
    /// The target matching where the note is now.
    pub fn from_location(loc: &NoteLocation) -> Self {
        match loc {
            NoteLocation::Unassigned => Self::Unassigned,
            NoteLocation::Unsectioned { notebook_id } => Self::Notebook {
                notebook_id: notebook_id.clone(),
                section_id: None,
            },
            NoteLocation::Section {
                notebook_id,
                section_id,
            } => Self::Notebook {
                notebook_id: notebook_id.clone(),
                section_id: Some(section_id.clone()),
            },
        }
    }
}

/// What is being dragged. Serialized into the drag event's `DataTransfer`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum DragItem {
    Section {
        id: String,
        notebook_id: String,
    },
    Note {
        id: String,
        notebook_id: Option<String>,
        section_id: Option<String>,
    },
}

pub(crate) const DRAG_MIME: &str = "application/x-sigil-tree";

impl DragItem {
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// Where it was dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DropTarget {
    Notebook {
        id: String,
    },
    Section {
        id: String,
        notebook_id: String,
    },
    Note {
        id: String,
        notebook_id: Option<String>,
        section_id: Option<String>,
    },
    Unassigned,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DragPlan {
    ReorderSection {
        section_id: String,
        position: usize,
    },
    ReorderNote {
        note_id: String,
        notebook_id: String,
        position: usize,
    },
    Move {
        note_id: String,
        plan: MovePlan,
    },
}

fn index_of<T>(items: &[T], pred: impl Fn(&T) -> bool) -> Option<usize> {
    items.iter().position(pred)
}

pub(crate) fn plan_drag_end(tree: &TreeState, active: &DragItem, over: &DropTarget) -> Option<DragPlan> {
    match (active, over) {
        (
            DragItem::Section { id, notebook_id },
            DropTarget::Section {
                id: over_id,
                notebook_id: over_nb,
            },
        ) => {
            if id == over_id || notebook_id != over_nb {
                return None;
            }
            let nb = tree.notebook(notebook_id)?;
            index_of(&nb.sections, |s| &s.id == id)?;
            let position = index_of(&nb.sections, |s| &s.id == over_id)?;
            Some(DragPlan::ReorderSection {
                section_id: id.clone(),
                position,
            })
        }
        (DragItem::Section { .. }, _) => None,

        (
            DragItem::Note {
                id,
                notebook_id,
                section_id,
            },
            DropTarget::Note {
                id: over_id,
                notebook_id: over_nb,
                section_id: over_section,
            },
        ) => {
            // Only reordering inside one container is supported.
            if id == over_id || section_id != over_section || notebook_id != over_nb {
                return None;
            }
            let nb = tree.notebook(notebook_id.as_deref()?)?;
            let notes = match section_id {
                None => &nb.unsectioned,
                Some(sid) => &nb.sections.iter().find(|s| &s.id == sid)?.notes,
            };
            index_of(notes, |n| &n.id == id)?;
            let position = index_of(notes, |n| &n.id == over_id)?;
            Some(DragPlan::ReorderNote {
                note_id: id.clone(),
                notebook_id: nb.id.clone(),
                position,
            })
        }

        (DragItem::Note { id, .. }, target) => {
            let target = match target {
                DropTarget::Notebook { id } => MoveTarget::Notebook {
                    notebook_id: id.clone(),
                    section_id: None,
                },
                DropTarget::Section { id, notebook_id } => MoveTarget::Notebook {
                    notebook_id: notebook_id.clone(),
                    section_id: Some(id.clone()),
                },
                DropTarget::Unassigned => MoveTarget::Unassigned,
                DropTarget::Note { .. } => return None,
            };
            let current = tree.find_note_location(id);
            plan_note_move(current.as_ref(), &target).map(|plan| DragPlan::Move {
                note_id: id.clone(),
                plan,
            })
        }
    }
}
