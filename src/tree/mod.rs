//! In-memory notebook tree.
//!
//! A note id lives in at most one place: the root `unassigned` list, some
//! notebook's `unsectioned` list, or some section's `notes`. Every mutation
//! here keeps that true, except [`TreeState::add_note_to_tree`] whose caller
//! guarantees the note is new.

pub(crate) mod moves;

use crate::models::{NoteLocation, NoteRef, NotebookNode, Section, SectionNode, TreeSnapshot};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct TreeState {
    pub notebooks: Vec<NotebookNode>,
    pub unassigned: Vec<NoteRef>,
}

impl From<TreeSnapshot> for TreeState {
    fn from(s: TreeSnapshot) -> Self {
        Self {
            notebooks: s.notebooks,
            unassigned: s.unassigned,
        }
    }
}

fn position_of(notes: &[NoteRef], note_id: &str) -> Option<usize> {
    notes.iter().position(|n| n.id == note_id)
}

impl NotebookNode {
    /// Where the note sits inside this notebook, if anywhere.
    pub(crate) fn locate(&self, note_id: &str) -> Option<NoteLocation> {
        if position_of(&self.unsectioned, note_id).is_some() {
            return Some(NoteLocation::Unsectioned {
                notebook_id: self.id.clone(),
            });
        }
        self.sections
            .iter()
            .find(|s| position_of(&s.notes, note_id).is_some())
            .map(|s| NoteLocation::Section {
                notebook_id: self.id.clone(),
                section_id: s.id.clone(),
            })
    }

    fn find_note(&self, note_id: &str) -> Option<&NoteRef> {
        self.unsectioned
            .iter()
            .chain(self.sections.iter().flat_map(|s| s.notes.iter()))
            .find(|n| n.id == note_id)
    }

    fn contains_note(&self, note_id: &str) -> bool {
        self.find_note(note_id).is_some()
    }

    /// Drops the note from the unsectioned bucket and every section.
    fn remove_note(&mut self, note_id: &str) {
        self.unsectioned.retain(|n| n.id != note_id);
        for section in self.sections.iter_mut() {
            section.notes.retain(|n| n.id != note_id);
        }
    }

    /// Appends to the unsectioned bucket (`None`) or the named section.
    /// Returns false when the section does not exist.
    fn insert_note(&mut self, note: NoteRef, section_id: Option<&str>) -> bool {
        match section_id {
            None => {
                self.unsectioned.push(note);
                true
            }
            Some(sid) => match self.sections.iter_mut().find(|s| s.id == sid) {
                Some(section) => {
                    section.notes.push(note);
                    true
                }
                None => false,
            },
        }
    }
}

impl TreeState {
    pub fn is_empty(&self) -> bool {
        self.notebooks.is_empty()
    }

    pub fn notebook(&self, notebook_id: &str) -> Option<&NotebookNode> {
        self.notebooks.iter().find(|nb| nb.id == notebook_id)
    }

    fn notebook_mut(&mut self, notebook_id: &str) -> Option<&mut NotebookNode> {
        self.notebooks.iter_mut().find(|nb| nb.id == notebook_id)
    }

    pub fn contains_notebook(&self, notebook_id: &str) -> bool {
        self.notebook(notebook_id).is_some()
    }

    /// Search order: unassigned first, then notebooks in display order.
    pub fn find_note_location(&self, note_id: &str) -> Option<NoteLocation> {
        if position_of(&self.unassigned, note_id).is_some() {
            return Some(NoteLocation::Unassigned);
        }
        self.notebooks.iter().find_map(|nb| nb.locate(note_id))
    }

    /// Same search order as [`Self::find_note_location`].
    pub fn find_note(&self, note_id: &str) -> Option<&NoteRef> {
        self.unassigned
            .iter()
            .find(|n| n.id == note_id)
            .or_else(|| self.notebooks.iter().find_map(|nb| nb.find_note(note_id)))
    }

    /// Every location the note occupies. Longer than one only if the
    /// at-most-one-location invariant has been broken.
    pub fn note_locations(&self, note_id: &str) -> Vec<NoteLocation> {
        let mut out = Vec::new();
        let count = |notes: &[NoteRef]| notes.iter().filter(|n| n.id == note_id).count();

        for _ in 0..count(&self.unassigned) {
            out.push(NoteLocation::Unassigned);
        }
        for nb in &self.notebooks {
            for _ in 0..count(&nb.unsectioned) {
                out.push(NoteLocation::Unsectioned {
                    notebook_id: nb.id.clone(),
                });
            }
            for s in &nb.sections {
                for _ in 0..count(&s.notes) {
                    out.push(NoteLocation::Section {
                        notebook_id: nb.id.clone(),
                        section_id: s.id.clone(),
                    });
                }
            }
        }
        out
    }

    fn in_any_notebook(&self, note_id: &str) -> bool {
        self.notebooks.iter().any(|nb| nb.contains_note(note_id))
    }

    /// Ids in search order. Duplicates appear only if the invariant broke.
    pub fn all_note_ids(&self) -> Vec<&str> {
        self.unassigned
            .iter()
            .chain(self.notebooks.iter().flat_map(|nb| {
                nb.unsectioned
                    .iter()
                    .chain(nb.sections.iter().flat_map(|s| s.notes.iter()))
            }))
            .map(|n| n.id.as_str())
            .collect()
    }

    /// Notes placed more than once, each with every place it occupies.
    /// Empty for any tree the backend serves correctly.
    pub fn misplaced_notes(&self) -> Vec<(String, Vec<NoteLocation>)> {
        let mut seen = std::collections::HashSet::new();
        let mut reported = std::collections::HashSet::new();
        let mut out = Vec::new();
        for id in self.all_note_ids() {
            if !seen.insert(id) && reported.insert(id) {
                out.push((id.to_string(), self.note_locations(id)));
            }
        }
        out
    }

    pub fn unassigned_count(&self) -> usize {
        self.unassigned.len()
    }

    pub fn update_note_title(&mut self, note_id: &str, title: &str) {
        let notes = self.unassigned.iter_mut().chain(self.notebooks.iter_mut().flat_map(|nb| {
            nb.unsectioned
                .iter_mut()
                .chain(nb.sections.iter_mut().flat_map(|s| s.notes.iter_mut()))
        }));
        for note in notes.filter(|n| n.id == note_id) {
            note.title = title.to_string();
        }
    }

    pub fn add_note_to_tree(&mut self, note: NoteRef) {
        self.unassigned.push(note);
    }

    pub fn delete_note(&mut self, note_id: &str) {
        for nb in self.notebooks.iter_mut() {
            nb.remove_note(note_id);
        }
        self.unassigned.retain(|n| n.id != note_id);
    }

    /// Second half of a move: strip `note` from wherever it is and append it
    /// at the target.
    ///
    /// A missing target notebook or section still strips the note, so the
    /// note disappears from view until the next refetch.
    pub fn place_note(&mut self, note: NoteRef, notebook_id: &str, section_id: Option<&str>) {
        self.delete_note(&note.id);

        let Some(nb) = self.notebook_mut(notebook_id) else {
            tracing::debug!(note_id = %note.id, notebook_id, "move target notebook not in tree");
            return;
        };
        let note_id = note.id.clone();
        if !nb.insert_note(note, section_id) {
            tracing::debug!(%note_id, notebook_id, ?section_id, "move target section not in tree");
        }
    }

    /// Detaches the note from one notebook. If that leaves it in no
    /// notebook at all it becomes unassigned, so it never vanishes.
    pub fn remove_note_from_notebook(&mut self, note_id: &str, notebook_id: &str) {
        let Some(nb) = self.notebook_mut(notebook_id) else {
            return;
        };
        let removed = nb.find_note(note_id).cloned();
        nb.remove_note(note_id);

        if let Some(note) = removed {
            if !self.in_any_notebook(note_id) {
                self.unassigned.push(note);
            }
        }
    }

    pub fn move_note_to_section(
        &mut self,
        note_id: &str,
        notebook_id: &str,
        section_id: Option<&str>,
    ) {
        let Some(nb) = self.notebook_mut(notebook_id) else {
            return;
        };
        let Some(note) = nb.find_note(note_id).cloned() else {
            return;
        };
        nb.remove_note(note_id);
        nb.insert_note(note, section_id);
    }

    pub fn add_notebook(&mut self, notebook: NotebookNode) {
        self.notebooks.push(notebook);
    }

    pub fn rename_notebook(&mut self, notebook_id: &str, name: &str) {
        if let Some(nb) = self.notebook_mut(notebook_id) {
            nb.title = name.to_string();
        }
    }

    /// Contained notes go with the notebook; they are not moved to
    /// unassigned. See DESIGN.md, open question 1.
    pub fn delete_notebook(&mut self, notebook_id: &str) {
        self.notebooks.retain(|nb| nb.id != notebook_id);
    }

    pub fn add_section(&mut self, notebook_id: &str, section: &Section) {
        if let Some(nb) = self.notebook_mut(notebook_id) {
            nb.sections.push(SectionNode {
                id: section.id.clone(),
                title: section.name.clone(),
                notes: vec![],
            });
        }
    }

    pub fn rename_section(&mut self, section_id: &str, name: &str) {
        for section in self
            .notebooks
            .iter_mut()
            .flat_map(|nb| nb.sections.iter_mut())
            .filter(|s| s.id == section_id)
        {
            section.title = name.to_string();
        }
    }

    /// The server unsections the notes; locally they are dropped until the
    /// next refetch.
    pub fn delete_section(&mut self, section_id: &str) {
        for nb in self.notebooks.iter_mut() {
            nb.sections.retain(|s| s.id != section_id);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_find_note_location_each_bucket() {
        let t = sample_tree();
        assert_eq!(
            t.find_note_location("n1"),
            Some(NoteLocation::Section {
                notebook_id: "nb1".to_string(),
                section_id: "s1".to_string()
            })
        );
        assert_eq!(
            t.find_note_location("n2"),
            Some(NoteLocation::Unsectioned {
                notebook_id: "nb1".to_string()
            })
        );
        assert_eq!(t.find_note_location("n3"), Some(NoteLocation::Unassigned));
        assert_eq!(t.find_note_location("missing"), None);
    }

    #[test]
    fn test_all_note_ids_in_search_order() {
        let t = sample_tree();
        assert_eq!(t.all_note_ids(), vec!["n3", "n2", "n1", "n4"]);
    }

    #[test]
    fn test_misplaced_notes_reports_each_duplicate_once() {
        let mut t = sample_tree();
        assert!(t.misplaced_notes().is_empty());

        t.unassigned.push(note("n1", "Dup"));
        t.notebooks[1].unsectioned.push(note("n1", "Dup"));

        let misplaced = t.misplaced_notes();
        assert_eq!(misplaced.len(), 1);
        assert_eq!(misplaced[0].0, "n1");
        assert_eq!(misplaced[0].1.len(), 3);
        assert_eq!(misplaced[0].1[0], NoteLocation::Unassigned);
    }

    #[test]
    fn test_update_note_title_across_tree_and_unassigned() {
        let mut t = sample_tree();
        t.update_note_title("n1", "Updated 1");
        t.update_note_title("n2", "Updated 2");
        t.update_note_title("n3", "Updated 3");

        assert_eq!(t.notebooks[0].sections[0].notes[0].title, "Updated 1");
        assert_eq!(t.notebooks[0].unsectioned[0].title, "Updated 2");
        assert_eq!(t.unassigned[0].title, "Updated 3");
    }

    #[test]
    fn test_update_note_title_missing_is_noop() {
        let mut t = sample_tree();
        let before = t.clone();
        t.update_note_title("missing", "x");
        assert_eq!(t, before);
    }

    #[test]
    fn test_add_note_to_tree_appends_unassigned() {
        let mut t = TreeState::default();
        t.add_note_to_tree(note("n1", "New Note"));
        assert_eq!(t.unassigned, vec![note("n1", "New Note")]);
    }

    #[test]
    fn test_delete_note_from_every_location() {
        let mut t = sample_tree();
        t.delete_note("n1");
        t.delete_note("n3");

        assert!(t.notebooks[0].sections[0].notes.is_empty());
        assert_eq!(t.notebooks[0].unsectioned.len(), 1);
        assert!(t.unassigned.is_empty());
    }

    #[test]
    fn test_delete_note_is_idempotent() {
        let mut once = sample_tree();
        once.delete_note("n2");
        let mut twice = once.clone();
        twice.delete_note("n2");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_place_note_from_unassigned_into_section() {
        let mut t = sample_tree();
        let n3 = t.find_note("n3").cloned().expect("n3 present");
        t.place_note(n3, "nb1", Some("s2"));

        assert!(t.unassigned.is_empty());
        assert_eq!(t.notebooks[0].sections[1].notes, vec![note("n3", "Three")]);
        assert_at_most_once(&t, "n3");
    }

    #[test]
    fn test_place_note_across_notebooks_to_unsectioned() {
        let mut t = sample_tree();
        let n1 = t.find_note("n1").cloned().expect("n1 present");
        t.place_note(n1, "nb2", None);

        assert!(t.notebooks[0].sections[0].notes.is_empty());
        assert_eq!(
            t.notebooks[1].unsectioned,
            vec![note("n4", "Four"), note("n1", "One")]
        );
    }

    #[test]
    fn test_place_note_missing_target_strips_note() {
        let mut t = sample_tree();
        let n2 = t.find_note("n2").cloned().expect("n2 present");
        t.place_note(n2, "nope", None);
        assert_eq!(t.find_note_location("n2"), None);
    }

    #[test]
    fn test_remove_note_from_only_notebook_promotes_to_unassigned() {
        let mut t = TreeState {
            notebooks: vec![notebook("N1", vec![], vec![note("n1", "Note")])],
            unassigned: vec![],
        };
        t.remove_note_from_notebook("n1", "N1");

        assert!(t.notebooks[0].unsectioned.is_empty());
        assert_eq!(t.unassigned, vec![note("n1", "Note")]);
    }

    #[test]
    fn test_remove_note_still_in_other_notebook_is_not_promoted() {
        let mut t = TreeState {
            notebooks: vec![
                notebook("N1", vec![], vec![note("n1", "Note")]),
                notebook("N2", vec![], vec![note("n1", "Note")]),
            ],
            unassigned: vec![],
        };
        t.remove_note_from_notebook("n1", "N1");

        assert!(t.notebooks[0].unsectioned.is_empty());
        assert_eq!(t.notebooks[1].unsectioned.len(), 1);
        assert!(t.unassigned.is_empty());
    }

    #[test]
    fn test_remove_note_from_section_promotes() {
        let mut t = sample_tree();
        t.remove_note_from_notebook("n1", "nb1");
        assert_eq!(t.find_note_location("n1"), Some(NoteLocation::Unassigned));
        assert_at_most_once(&t, "n1");
    }

    #[test]
    fn test_remove_note_not_in_notebook_is_noop() {
        let mut t = sample_tree();
        let before = t.clone();
        t.remove_note_from_notebook("n4", "nb1");
        t.remove_note_from_notebook("n1", "missing");
        assert_eq!(t, before);
    }

    #[test]
    fn test_move_note_to_section_within_notebook() {
        let mut t = sample_tree();
        t.move_note_to_section("n2", "nb1", Some("s2"));
        assert!(t.notebooks[0].unsectioned.is_empty());
        assert_eq!(t.notebooks[0].sections[1].notes, vec![note("n2", "Two")]);

        t.move_note_to_section("n2", "nb1", None);
        assert_eq!(t.notebooks[0].unsectioned, vec![note("n2", "Two")]);
        assert!(t.notebooks[0].sections[1].notes.is_empty());
    }

    #[test]
    fn test_move_note_to_section_ignores_other_notebooks() {
        let mut t = sample_tree();
        let before = t.clone();
        t.move_note_to_section("n4", "nb1", Some("s1"));
        assert_eq!(t, before);
    }

    #[test]
    fn test_notebook_crud() {
        let mut t = TreeState::default();
        t.add_notebook(notebook("nb1", vec![], vec![]));
        t.rename_notebook("nb1", "New");
        assert_eq!(t.notebooks[0].title, "New");

        t.delete_notebook("nb1");
        assert!(t.notebooks.is_empty());
    }

    #[test]
    fn test_delete_notebook_does_not_relocate_notes() {
        let mut t = sample_tree();
        t.delete_notebook("nb1");
        assert_eq!(t.find_note_location("n1"), None);
        assert_eq!(t.find_note_location("n2"), None);
        assert_eq!(t.unassigned, vec![note("n3", "Three")]);
    }

    #[test]
    fn test_section_crud() {
        let mut t = sample_tree();
        t.add_section(
            "nb2",
            &Section {
                id: "s9".to_string(),
                name: "Fresh".to_string(),
            },
        );
        assert_eq!(t.notebooks[1].sections[0].title, "Fresh");
        assert!(t.notebooks[1].sections[0].notes.is_empty());

        t.rename_section("s1", "Renamed");
        assert_eq!(t.notebooks[0].sections[0].title, "Renamed");

        t.delete_section("s1");
        assert_eq!(t.notebooks[0].sections.len(), 1);
        assert_eq!(t.notebooks[0].sections[0].id, "s2");
        assert_eq!(t.find_note_location("n1"), None);
    }

    #[test]
    fn test_invariant_holds_over_mixed_sequence() {
        let mut t = sample_tree();
        let ids = ["n1", "n2", "n3", "n4"];

        let n3 = t.find_note("n3").cloned().expect("n3 present");
        t.place_note(n3, "nb1", Some("s1"));
        t.move_note_to_section("n3", "nb1", None);
        t.remove_note_from_notebook("n3", "nb1");
        let n1 = t.find_note("n1").cloned().expect("n1 present");
        t.place_note(n1, "nb2", None);
        t.remove_note_from_notebook("n4", "nb2");
        t.move_note_to_section("n2", "nb1", Some("s2"));
        t.delete_note("n2");
        let n4 = t.find_note("n4").cloned().expect("n4 present");
        t.place_note(n4, "nb1", Some("s2"));

        for id in ids {
            assert_at_most_once(&t, id);
        }
        assert_eq!(t.find_note_location("n3"), Some(NoteLocation::Unassigned));
        assert_eq!(t.find_note_location("n2"), None);
    }
}
