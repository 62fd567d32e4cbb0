use serde::{Deserialize, Serialize};

/// Lightweight projection of a note used for tree display.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct NoteRef {
    pub id: String,
    pub title: String,
}

impl NoteRef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct SectionNode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub notes: Vec<NoteRef>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct NotebookNode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub sections: Vec<SectionNode>,
    #[serde(default)]
    pub unsectioned: Vec<NoteRef>,
}

/// Response of `GET tree`.
///
/// The backend sends `null` instead of `[]` for empty lists in a few places,
/// so every list is defaulted.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct TreeSnapshot {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notebooks: Vec<NotebookNode>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub unassigned: Vec<NoteRef>,
}

fn null_as_empty<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}

/// Where a note currently lives in the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum NoteLocation {
    Unassigned,
    Unsectioned { notebook_id: String },
    Section { notebook_id: String, section_id: String },
}

impl NoteLocation {
    pub fn notebook_id(&self) -> Option<&str> {
        match self {
            Self::Unassigned => None,
            Self::Unsectioned { notebook_id } | Self::Section { notebook_id, .. } => {
                Some(notebook_id)
            }
        }
    }

    pub fn section_id(&self) -> Option<&str> {
        match self {
            Self::Section { section_id, .. } => Some(section_id),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct Notebook {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct Section {
    pub id: String,
    pub name: String,
}

/// Full note as returned by `GET notes/{id}`. Only the fields the tree
/// needs are typed; the rest is kept opaque.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct NoteDetail {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl From<&NoteDetail> for NoteRef {
    fn from(n: &NoteDetail) -> Self {
        NoteRef::new(n.id.clone(), n.title.clone())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ShoppingListSummary {
    pub id: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_snapshot_contract_deserialize() {
        let json = r#"{
            "notebooks": [{
                "id": "nb1",
                "title": "Cooking",
                "sections": [{"id": "s1", "title": "Soups", "notes": [{"id": "n1", "title": "Pho"}]}],
                "unsectioned": [{"id": "n2", "title": "Bread"}]
            }],
            "unassigned": [{"id": "n3", "title": "Loose"}]
        }"#;
        let parsed: TreeSnapshot = serde_json::from_str(json).expect("tree should parse");
        assert_eq!(parsed.notebooks.len(), 1);
        assert_eq!(parsed.notebooks[0].sections[0].notes[0].title, "Pho");
        assert_eq!(parsed.notebooks[0].unsectioned[0].id, "n2");
        assert_eq!(parsed.unassigned[0].id, "n3");
    }

    #[test]
    fn test_tree_snapshot_accepts_null_lists() {
        let json = r#"{"notebooks": null, "unassigned": null}"#;
        let parsed: TreeSnapshot = serde_json::from_str(json).expect("tree should parse");
        assert!(parsed.notebooks.is_empty());
        assert!(parsed.unassigned.is_empty());
    }

    #[test]
    fn test_note_detail_keeps_extra_fields() {
        let json = r#"{"id": "n1", "title": "T", "content": "body", "published": false}"#;
        let parsed: NoteDetail = serde_json::from_str(json).expect("note should parse");
        assert_eq!(NoteRef::from(&parsed), NoteRef::new("n1", "T"));
        assert_eq!(parsed.extra["content"], "body");
    }

    #[test]
    fn test_note_location_accessors() {
        let loc = NoteLocation::Section {
            notebook_id: "nb".to_string(),
            section_id: "s".to_string(),
        };
        assert_eq!(loc.notebook_id(), Some("nb"));
        assert_eq!(loc.section_id(), Some("s"));
        assert_eq!(NoteLocation::Unassigned.notebook_id(), None);
    }
}
