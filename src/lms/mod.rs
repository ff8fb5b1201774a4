//! Read-only client for the upstream LMS REST API.

mod models;

pub use models::{
    CompletionRequirement, Course, FileMetadata, ItemKind, Module, ModuleItem, Term,
};

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    config::LmsConfig,
    error::{BridgeError, Result},
};

use models::{RawCourse, RawModule};

/// Catalog state a course must be in to be listed.
pub const AVAILABLE_STATE: &str = "available";

/// Upper bound on listed courses. Upstream pagination is not followed; whether
/// the cap should become real paging is an open policy decision.
pub const MAX_COURSES: usize = 20;

/// Authenticated LMS client. Cheap to clone.
#[derive(Clone)]
pub struct LmsClient {
    http: Client,
    config: LmsConfig,
}

struct Credentials<'a> {
    base_url: &'a str,
    token: &'a str,
}

impl LmsClient {
    pub fn new(config: LmsConfig) -> Self {
        Self::with_http(Client::new(), config)
    }

    pub fn with_http(http: Client, config: LmsConfig) -> Self {
        Self { http, config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Active-enrollment courses in the `available` state, capped to [`MAX_COURSES`].
    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        let raw: Vec<RawCourse> = self
            .get_json(
                "courses",
                &[("enrollment_state", "active"), ("include[]", "term")],
            )
            .await?;

        Ok(available_courses(raw.into_iter().map(Course::from)))
    }

    pub async fn list_modules(&self, course_id: u64) -> Result<Vec<Module>> {
        let raw: Vec<RawModule> = self
            .get_json(&format!("courses/{course_id}/modules"), &[])
            .await?;
        Ok(raw.into_iter().map(Module::from).collect())
    }

    pub async fn list_items(&self, course_id: u64, module_id: u64) -> Result<Vec<ModuleItem>> {
        self.get_json(
            &format!("courses/{course_id}/modules/{module_id}/items"),
            &[],
        )
        .await
    }

    pub async fn file_metadata(&self, file_id: u64) -> Result<FileMetadata> {
        self.get_json(&format!("files/{file_id}"), &[]).await
    }

    /// Start downloading the content behind `metadata`, returning the open response.
    ///
    /// The access token is only attached when the content URL lives on the LMS
    /// origin; signed download URLs on other hosts are fetched anonymously.
    pub async fn open_content(&self, metadata: &FileMetadata) -> Result<Response> {
        let creds = self.credentials()?;
        let raw_url = metadata
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                BridgeError::download(format!("file {} has no content URL", metadata.id))
            })?;
        let url = Url::parse(raw_url)
            .map_err(|err| BridgeError::download(format!("invalid content URL: {err}")))?;

        let mut request = self.http.get(url.clone());
        if same_origin(&url, creds.base_url) {
            request = request.bearer_auth(creds.token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| BridgeError::download(format!("content request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(file_id = metadata.id, %status, "file content download rejected");
            return Err(BridgeError::download(format!(
                "content request returned {status}"
            )));
        }

        Ok(response)
    }

    fn credentials(&self) -> Result<Credentials<'_>> {
        match (&self.config.base_url, &self.config.access_token) {
            (Some(base_url), Some(token)) => Ok(Credentials {
                base_url: base_url.as_str(),
                token: token.as_str(),
            }),
            _ => Err(BridgeError::UpstreamUnavailable),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let creds = self.credentials()?;
        let url = join_url(creds.base_url, path);
        debug!(%url, "LMS request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(creds.token)
            .query(query)
            .send()
            .await
            .map_err(BridgeError::upstream_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::upstream_status(
                status,
                format!("LMS request to /{path} failed with status {status}"),
            ));
        }

        response.json::<T>().await.map_err(|err| BridgeError::Upstream {
            status: Some(status),
            message: format!("failed to decode LMS response for /{path}: {err}"),
        })
    }
}

/// Keep `available` courses in upstream order, capped to [`MAX_COURSES`].
pub fn available_courses(courses: impl IntoIterator<Item = Course>) -> Vec<Course> {
    courses
        .into_iter()
        .filter(|course| course.workflow_state == AVAILABLE_STATE)
        .take(MAX_COURSES)
        .collect()
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn same_origin(url: &Url, base: &str) -> bool {
    match Url::parse(base) {
        Ok(base) => url.origin() == base.origin(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> LmsClient {
        LmsClient::new(LmsConfig::new(format!("{}/api/v1", server.uri()), "secret"))
    }

    fn course_json(id: u64, state: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "name": format!("Course {id}"),
            "course_code": format!("C{id}"),
            "workflow_state": state,
            "enrollment_term_id": 1,
            "term": { "id": 1, "name": "Fall" }
        })
    }

    #[tokio::test]
    async fn list_courses_filters_available_and_caps_to_twenty() {
        let server = MockServer::start().await;

        let courses: Vec<_> = (1..=25)
            .map(|id| {
                let state = if matches!(id, 3 | 7 | 11) {
                    "unpublished"
                } else {
                    "available"
                };
                course_json(id, state)
            })
            .collect();

        Mock::given(method("GET"))
            .and(path("/api/v1/courses"))
            .and(query_param("enrollment_state", "active"))
            .and(query_param("include[]", "term"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&courses))
            .mount(&server)
            .await;

        let listed = client_for(&server).list_courses().await.unwrap();

        assert_eq!(listed.len(), MAX_COURSES);
        assert!(listed.iter().all(|c| c.workflow_state == AVAILABLE_STATE));
        let ids: Vec<u64> = listed.iter().map(|c| c.id).collect();
        let expected: Vec<u64> = (1..=25)
            .filter(|id| !matches!(id, 3 | 7 | 11))
            .take(20)
            .collect();
        assert_eq!(ids, expected);
        assert_eq!(listed[0].code, "C1");
        assert_eq!(listed[0].term.as_ref().and_then(|t| t.name.as_deref()), Some("Fall"));
    }

    #[tokio::test]
    async fn missing_configuration_fails_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let client = LmsClient::new(LmsConfig {
            base_url: Some(server.uri()),
            access_token: None,
        });

        let err = client.list_courses().await.unwrap_err();
        assert!(matches!(err, BridgeError::UpstreamUnavailable));
        let err = client.list_modules(1).await.unwrap_err();
        assert!(matches!(err, BridgeError::UpstreamUnavailable));
    }

    #[tokio::test]
    async fn non_success_status_surfaces_as_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/courses/10/modules"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client_for(&server).list_modules(10).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn list_items_maps_module_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/courses/10/modules/55/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": 1, "module_id": 55, "title": "Welcome", "type": "Page",
                    "page_url": "welcome", "position": 1, "indent": 0, "published": true
                },
                {
                    "id": 2, "module_id": 55, "title": "Slides", "type": "File",
                    "content_id": 777, "position": 2, "indent": 1,
                    "completion_requirement": { "type": "must_view", "completed": false }
                }
            ])))
            .mount(&server)
            .await;

        let items = client_for(&server).list_items(10, 55).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, ItemKind::Page);
        assert_eq!(items[1].relay_id(), Some(777));
        assert_eq!(
            items[1]
                .completion_requirement
                .as_ref()
                .map(|r| r.kind.as_str()),
            Some("must_view")
        );
    }

    #[tokio::test]
    async fn content_token_only_sent_to_lms_origin() {
        let lms = MockServer::start().await;
        let cdn = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/files/9/download"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"inside".to_vec()))
            .expect(1)
            .mount(&lms)
            .await;
        Mock::given(method("GET"))
            .and(path("/signed/9"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"outside".to_vec()))
            .expect(1)
            .mount(&cdn)
            .await;

        let client = client_for(&lms);
        let mut meta = FileMetadata {
            id: 9,
            filename: "a.txt".into(),
            display_name: "a.txt".into(),
            content_type: None,
            size: None,
            url: Some(format!("{}/files/9/download", lms.uri())),
        };
        let body = client.open_content(&meta).await.unwrap().bytes().await.unwrap();
        assert_eq!(&body[..], b"inside");

        meta.url = Some(format!("{}/signed/9", cdn.uri()));
        let response = client.open_content(&meta).await.unwrap();
        let requests = cdn.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
        assert_eq!(&response.bytes().await.unwrap()[..], b"outside");
    }

    #[tokio::test]
    async fn content_without_url_is_a_download_error() {
        let client = LmsClient::new(LmsConfig::new("http://127.0.0.1:9", "secret"));
        let meta = FileMetadata {
            id: 4,
            filename: "a.txt".into(),
            display_name: "a.txt".into(),
            content_type: None,
            size: None,
            url: None,
        };
        let err = client.open_content(&meta).await.unwrap_err();
        assert!(matches!(err, BridgeError::Download(_)));
    }
}
