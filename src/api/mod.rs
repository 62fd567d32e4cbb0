use crate::models::{
    NoteDetail, NoteRef, Notebook, Section, ShoppingListSummary, TreeSnapshot,
};
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// The remote reads the stores depend on.
///
/// [`ApiClient`] is the only production implementation; store tests swap in
/// a fake.
pub(crate) trait TreeRemote {
    async fn fetch_tree(&self) -> ApiResult<TreeSnapshot>;
    async fn fetch_note(&self, note_id: &str) -> ApiResult<NoteDetail>;
    async fn fetch_recent_notes(&self, limit: usize) -> ApiResult<Vec<NoteRef>>;
    async fn delete_recent_note(&self, note_id: &str) -> ApiResult<()>;
    async fn fetch_shopping_lists(&self, limit: usize) -> ApiResult<Vec<ShoppingListSummary>>;
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CreateNotebookRequest {
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct RenameNotebookRequest {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CreateSectionRequest {
    pub notebook_id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct AssignSectionRequest {
    /// `null` moves the note to the notebook's unsectioned bucket.
    pub section_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct PositionRequest {
    pub position: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UpsertNoteRequest {
    pub title: String,
    pub content: String,
}

fn seg(s: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(s)
}

/// JSON client for the Sigil backend.
///
/// Authentication is the browser session cookie; every request is sent with
/// `credentials: include`.
#[derive(Clone, Debug)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<reqwest::Response> {
        let client = reqwest::Client::new();
        let mut req = client
            .request(method.clone(), self.url(path))
            .header("Accept", "application/json");

        #[cfg(target_arch = "wasm32")]
        {
            req = req.fetch_credentials_include();
        }

        if let Some(b) = body {
            req = req.json(&b);
        }

        let res = req.send().await.map_err(|e| {
            tracing::debug!(%method, path, error = %e, "request failed to send");
            ApiError::network(e)
        })?;

        let status = res.status();
        if status.is_success() {
            Ok(res)
        } else if status.as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, &format!("{method} {path}")))
        }
    }

    async fn request_json<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<T> {
        let res = self.send(method, path, body).await?;
        res.json().await.map_err(ApiError::parse)
    }

    async fn request_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<()> {
        self.send(method, path, body).await.map(|_| ())
    }

    fn to_body(value: &impl Serialize) -> ApiResult<Option<serde_json::Value>> {
        serde_json::to_value(value).map(Some).map_err(ApiError::parse)
    }

    pub async fn create_notebook(&self, name: &str) -> ApiResult<Notebook> {
        let body = Self::to_body(&CreateNotebookRequest {
            name: name.to_string(),
        })?;
        self.request_json(Method::POST, "notebooks", body).await
    }

    /// The backend upserts on `POST notebooks` when an id is present.
    pub async fn rename_notebook(&self, notebook_id: &str, name: &str) -> ApiResult<Notebook> {
        let body = Self::to_body(&RenameNotebookRequest {
            id: notebook_id.to_string(),
            name: name.to_string(),
        })?;
        self.request_json(Method::POST, "notebooks", body).await
    }

    pub async fn delete_notebook(&self, notebook_id: &str) -> ApiResult<()> {
        self.request_empty(Method::DELETE, &format!("notebooks/{}", seg(notebook_id)), None)
            .await
    }

    pub async fn create_section(&self, notebook_id: &str, name: &str) -> ApiResult<Section> {
        let body = Self::to_body(&CreateSectionRequest {
            notebook_id: notebook_id.to_string(),
            name: name.to_string(),
        })?;
        self.request_json(Method::POST, "sections", body).await
    }

    pub async fn rename_section(&self, section_id: &str, name: &str) -> ApiResult<()> {
        self.request_empty(
            Method::PATCH,
            &format!("sections/{}", seg(section_id)),
            Some(serde_json::json!({ "name": name })),
        )
        .await
    }

    /// Server-side the section's notes become unsectioned.
    pub async fn delete_section(&self, section_id: &str) -> ApiResult<()> {
        self.request_empty(Method::DELETE, &format!("sections/{}", seg(section_id)), None)
            .await
    }

    pub async fn update_section_position(&self, section_id: &str, position: usize) -> ApiResult<()> {
        let body = Self::to_body(&PositionRequest { position })?;
        self.request_empty(
            Method::PUT,
            &format!("sections/{}/position", seg(section_id)),
            body,
        )
        .await
    }

    pub async fn add_note_to_notebook(&self, notebook_id: &str, note_id: &str) -> ApiResult<()> {
        self.request_empty(
            Method::PUT,
            &format!("notebooks/{}/notes/{}", seg(notebook_id), seg(note_id)),
            None,
        )
        .await
    }

    pub async fn remove_note_from_notebook(
        &self,
        notebook_id: &str,
        note_id: &str,
    ) -> ApiResult<()> {
        self.request_empty(
            Method::DELETE,
            &format!("notebooks/{}/notes/{}", seg(notebook_id), seg(note_id)),
            None,
        )
        .await
    }

    pub async fn assign_note_to_section(
        &self,
        note_id: &str,
        notebook_id: &str,
        section_id: Option<&str>,
    ) -> ApiResult<()> {
        let body = Self::to_body(&AssignSectionRequest {
            section_id: section_id.map(|s| s.to_string()),
        })?;
        self.request_empty(
            Method::PUT,
            &format!("notes/{}/notebooks/{}/section", seg(note_id), seg(notebook_id)),
            body,
        )
        .await
    }

    pub async fn update_note_position(
        &self,
        note_id: &str,
        notebook_id: &str,
        position: usize,
    ) -> ApiResult<()> {
        let body = Self::to_body(&PositionRequest { position })?;
        self.request_empty(
            Method::PUT,
            &format!("notes/{}/notebooks/{}/position", seg(note_id), seg(notebook_id)),
            body,
        )
        .await
    }

    pub async fn create_note(&self, title: &str) -> ApiResult<NoteDetail> {
        let body = Self::to_body(&UpsertNoteRequest {
            title: title.to_string(),
            content: String::new(),
        })?;
        self.request_json(Method::POST, "notes", body).await
    }

    /// `POST notes` upserts by id, so the rest of the note goes back as it
    /// was fetched.
    pub async fn update_note_title(&self, note: &NoteDetail, title: &str) -> ApiResult<NoteDetail> {
        let mut note = note.clone();
        note.title = title.to_string();
        let body = Self::to_body(&note)?;
        self.request_json(Method::POST, "notes", body).await
    }

    pub async fn delete_note(&self, note_id: &str) -> ApiResult<()> {
        self.request_empty(Method::DELETE, &format!("notes/{}", seg(note_id)), None)
            .await
    }

    pub async fn fetch_note_shopping_list(&self, note_id: &str) -> ApiResult<ShoppingListSummary> {
        self.request_json(
            Method::GET,
            &format!("notes/{}/shopping-list", seg(note_id)),
            None,
        )
        .await
    }

    pub async fn enable_shopping_list(&self, note_id: &str) -> ApiResult<ShoppingListSummary> {
        self.request_json(
            Method::PUT,
            &format!("notes/{}/shopping-list", seg(note_id)),
            None,
        )
        .await
    }

    pub async fn disable_shopping_list(&self, note_id: &str) -> ApiResult<()> {
        self.request_empty(
            Method::DELETE,
            &format!("notes/{}/shopping-list", seg(note_id)),
            None,
        )
        .await
    }

    pub async fn fetch_shopping_list(&self, list_id: &str) -> ApiResult<ShoppingListSummary> {
        self.request_json(Method::GET, &format!("shopping-list/{}", seg(list_id)), None)
            .await
    }
}

impl TreeRemote for ApiClient {
    async fn fetch_tree(&self) -> ApiResult<TreeSnapshot> {
        self.request_json(Method::GET, "tree", None).await
    }

    async fn fetch_note(&self, note_id: &str) -> ApiResult<NoteDetail> {
        self.request_json(Method::GET, &format!("notes/{}", seg(note_id)), None)
            .await
    }

    async fn fetch_recent_notes(&self, limit: usize) -> ApiResult<Vec<NoteRef>> {
        let notes: Vec<NoteDetail> = self
            .request_json(Method::GET, &format!("notes/recent?limit={limit}"), None)
            .await?;
        Ok(notes.iter().map(NoteRef::from).collect())
    }

    async fn delete_recent_note(&self, note_id: &str) -> ApiResult<()> {
        self.request_empty(Method::DELETE, &format!("notes/recent/{}", seg(note_id)), None)
            .await
    }

    async fn fetch_shopping_lists(&self, limit: usize) -> ApiResult<Vec<ShoppingListSummary>> {
        self.request_json(Method::GET, &format!("shopping-lists?limit={limit}"), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_new_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:8080/api/");
        assert_eq!(client.base_url, "http://localhost:8080/api");
    }

    #[test]
    fn test_url_joins_path() {
        let client = ApiClient::new("http://localhost:8080/api");
        assert_eq!(client.url("tree"), "http://localhost:8080/api/tree");
        assert_eq!(client.url("/tree"), "http://localhost:8080/api/tree");
    }

    #[test]
    fn test_path_segments_are_encoded() {
        assert_eq!(seg("a b/c"), "a%20b%2Fc");
    }

    #[test]
    fn test_assign_section_request_serializes_null_for_unsectioned() {
        let v = serde_json::to_value(AssignSectionRequest { section_id: None })
            .expect("should serialize");
        assert!(v["section_id"].is_null());

        let v = serde_json::to_value(AssignSectionRequest {
            section_id: Some("s1".to_string()),
        })
        .expect("should serialize");
        assert_eq!(v["section_id"], "s1");
    }

    #[test]
    fn test_section_response_contract_deserialize() {
        let json = r#"{"id": "s1", "name": "Soups", "notebook_id": "nb1", "position": 2,
                       "created_at": "2024-01-01T00:00:00Z"}"#;
        let parsed: Section = serde_json::from_str(json).expect("section should parse");
        assert_eq!(parsed.id, "s1");
        assert_eq!(parsed.name, "Soups");
    }

    #[test]
    fn test_shopping_list_summary_ignores_items() {
        let json = r#"[{"id": "l1", "title": "Weekly", "items": [], "contentHash": "x"}]"#;
        let parsed: Vec<ShoppingListSummary> =
            serde_json::from_str(json).expect("lists should parse");
        assert_eq!(parsed[0].title, "Weekly");
    }

    #[test]
    fn test_api_error_display_is_message() {
        let e = ApiError::unauthorized();
        assert_eq!(e.to_string(), "Unauthorized");
        assert_eq!(e.kind, ApiErrorKind::Unauthorized);
    }

    #[test]
    fn test_note_upsert_body_keeps_untyped_fields() {
        let json = r#"{"id": "n1", "title": "Old", "content": "- milk", "published": true}"#;
        let mut note: NoteDetail = serde_json::from_str(json).expect("note should parse");
        note.title = "New".to_string();

        let body = ApiClient::to_body(&note)
            .expect("should serialize")
            .expect("body should be present");
        assert_eq!(body["title"], "New");
        assert_eq!(body["content"], "- milk");
        assert_eq!(body["published"], true);
    }
}
