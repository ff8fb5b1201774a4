//! Fetch one LMS file, stage it locally and hand it to the ingestion pipeline.

mod staging;

pub use staging::{StagedFile, StagingArea};

use reqwest::{Response, header};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    error::Result,
    ingest::{Destination, IngestionOutcome, IngestionPipeline, to_ingestion_request},
    lms::{FileMetadata, LmsClient},
};

/// Identity of the LMS file a relay started from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalFile {
    pub id: u64,
    pub filename: String,
    pub display_name: String,
}

impl From<&FileMetadata> for OriginalFile {
    fn from(metadata: &FileMetadata) -> Self {
        Self {
            id: metadata.id,
            filename: metadata.filename.clone(),
            display_name: metadata.display_name.clone(),
        }
    }
}

/// Response body of a successful relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayOutcome {
    #[serde(flatten)]
    pub ingestion: IngestionOutcome,
    #[serde(rename = "originalFile")]
    pub original_file: OriginalFile,
    pub message: String,
}

impl RelayOutcome {
    fn compose(
        ingestion: IngestionOutcome,
        metadata: &FileMetadata,
        destination: &Destination,
    ) -> Self {
        let original_file = OriginalFile::from(metadata);
        let label = if original_file.display_name.is_empty() {
            &original_file.filename
        } else {
            &original_file.display_name
        };
        let message = format!(
            "{label} was uploaded to {} ({}).",
            destination.endpoint, destination.resource_kind
        );

        Self {
            ingestion,
            original_file,
            message,
        }
    }
}

/// Stateless relay from the LMS into an [`IngestionPipeline`].
pub struct RelayPipeline<I> {
    lms: LmsClient,
    ingestion: I,
    staging: StagingArea,
}

impl<I: IngestionPipeline> RelayPipeline<I> {
    pub fn new(lms: LmsClient, ingestion: I, staging: StagingArea) -> Self {
        Self {
            lms,
            ingestion,
            staging,
        }
    }

    /// Relay LMS file `file_id` into `destination` on behalf of `owner_session`.
    ///
    /// The staged copy is removed before this returns, whatever the outcome.
    pub async fn relay(
        &self,
        file_id: u64,
        destination: &Destination,
        owner_session: &str,
    ) -> Result<RelayOutcome> {
        let metadata = self.lms.file_metadata(file_id).await.inspect_err(|err| {
            error!(?err, file_id, "failed to load file metadata");
        })?;

        let response = self.lms.open_content(&metadata).await.inspect_err(|err| {
            error!(?err, file_id, "failed to download file content");
        })?;

        let content_type = resolve_content_type(&metadata, &response);
        let mut staged = self
            .staging
            .allocate(owner_session, metadata.original_filename(), &content_type)
            .await
            .inspect_err(|err| {
                error!(?err, file_id, "failed to allocate staging space");
            })?;

        let result = self.ingest_staged(&mut staged, response, destination).await;
        staged.discard().await;

        let ingestion = result.inspect_err(|err| {
            error!(?err, file_id, %destination, "relay failed");
        })?;
        info!(file_id, %destination, ingested = %ingestion.file_id, "relay completed");

        Ok(RelayOutcome::compose(ingestion, &metadata, destination))
    }

    async fn ingest_staged(
        &self,
        staged: &mut StagedFile,
        response: Response,
        destination: &Destination,
    ) -> Result<IngestionOutcome> {
        staged.fill_from(response).await?;
        self.ingestion
            .ingest(to_ingestion_request(staged, destination))
            .await
    }
}

/// Prefer the LMS-declared type, then the download's header, then a binary default.
fn resolve_content_type(metadata: &FileMetadata, response: &Response) -> String {
    let declared = metadata
        .content_type
        .as_deref()
        .and_then(|value| value.parse::<mime::Mime>().ok());
    let served = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok());

    declared
        .or(served)
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.essence_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::LmsConfig, error::BridgeError, ingest::IngestionRequest};
    use reqwest::StatusCode;
    use std::{
        path::{Path, PathBuf},
        sync::Mutex,
    };
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records what it was handed and whether the staged file was readable then.
    #[derive(Default)]
    struct RecordingIngestion {
        fail: bool,
        block_cleanup: bool,
        seen: Mutex<Vec<(IngestionRequest, Option<Vec<u8>>)>>,
    }

    impl RecordingIngestion {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        /// Swaps the call directory for a plain file so it cannot be removed.
        fn blocking_cleanup() -> Self {
            Self {
                block_cleanup: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(IngestionRequest, Option<Vec<u8>>)> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl IngestionPipeline for RecordingIngestion {
        async fn ingest(&self, request: IngestionRequest) -> Result<IngestionOutcome> {
            let contents = std::fs::read(&request.path).ok();
            self.seen.lock().unwrap().push((request.clone(), contents));
            if self.block_cleanup {
                let call_dir = request.path.parent().unwrap();
                std::fs::remove_dir_all(call_dir).unwrap();
                std::fs::write(call_dir, b"blocker").unwrap();
            }
            if self.fail {
                return Err(BridgeError::ingestion("rejected by pipeline"));
            }
            Ok(IngestionOutcome {
                file_id: "file-xyz".to_string(),
                filename: request.filename,
                bytes: request.size,
                purpose: "assistants".to_string(),
                status: Some("processed".to_string()),
                vector_store_id: None,
                vector_store_file_status: None,
            })
        }
    }

    async fn mount_file(server: &MockServer, id: u64, body: &'static [u8]) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/files/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": id,
                "filename": "week1-slides.pdf",
                "display_name": "Week 1 Slides.pdf",
                "content-type": "application/pdf",
                "size": body.len(),
                "url": format!("{}/download/{id}", server.uri())
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/download/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(server)
            .await;
    }

    fn pipeline(
        server: &MockServer,
        staging_root: &Path,
        ingestion: RecordingIngestion,
    ) -> RelayPipeline<RecordingIngestion> {
        let lms = LmsClient::new(LmsConfig::new(format!("{}/api/v1", server.uri()), "secret"));
        RelayPipeline::new(lms, ingestion, StagingArea::new(staging_root))
    }

    fn staged_files(root: &Path) -> Vec<PathBuf> {
        fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, out);
                } else {
                    out.push(path);
                }
            }
        }
        let mut out = Vec::new();
        walk(root, &mut out);
        out
    }

    #[tokio::test]
    async fn successful_relay_composes_outcome_and_cleans_up() {
        let server = MockServer::start().await;
        mount_file(&server, 777, b"slide-bytes").await;
        let root = tempdir().expect("temp dir");
        let relay = pipeline(&server, root.path(), RecordingIngestion::default());

        let outcome = relay
            .relay(777, &Destination::default(), "session-1")
            .await
            .unwrap();

        assert_eq!(outcome.original_file.id, 777);
        assert_eq!(outcome.original_file.filename, "week1-slides.pdf");
        assert_eq!(outcome.original_file.display_name, "Week 1 Slides.pdf");
        assert_eq!(outcome.ingestion.file_id, "file-xyz");
        assert!(outcome.message.contains("Week 1 Slides.pdf"));

        let calls = relay.ingestion.calls();
        assert_eq!(calls.len(), 1);
        let (request, contents) = &calls[0];
        assert_eq!(contents.as_deref(), Some(&b"slide-bytes"[..]));
        assert_eq!(request.content_type, "application/pdf");
        assert_eq!(request.size, 11);
        assert_eq!(request.destination, Destination::default());
        assert!(!request.path.exists());
        assert!(staged_files(root.path()).is_empty());

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["originalFile"]["id"], 777);
        assert_eq!(json["file_id"], "file-xyz");
    }

    #[tokio::test]
    async fn metadata_not_found_never_stages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/files/999"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let root = tempdir().expect("temp dir");
        let relay = pipeline(&server, root.path(), RecordingIngestion::default());

        let err = relay
            .relay(999, &Destination::default(), "session-1")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(relay.ingestion.calls().is_empty());
        assert!(std::fs::read_dir(root.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn download_failure_is_reported_as_download_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/files/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 5,
                "filename": "a.txt",
                "display_name": "a.txt",
                "url": format!("{}/download/5", server.uri())
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/download/5"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let root = tempdir().expect("temp dir");
        let relay = pipeline(&server, root.path(), RecordingIngestion::default());

        let err = relay
            .relay(5, &Destination::default(), "session-1")
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::Download(_)));
        assert!(relay.ingestion.calls().is_empty());
        assert!(staged_files(root.path()).is_empty());
    }

    #[tokio::test]
    async fn ingestion_failure_still_removes_staged_file() {
        let server = MockServer::start().await;
        mount_file(&server, 12, b"data").await;
        let root = tempdir().expect("temp dir");
        let relay = pipeline(&server, root.path(), RecordingIngestion::failing());

        let err = relay
            .relay(12, &Destination::default(), "session-1")
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::Ingestion(_)));
        let calls = relay.ingestion.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.as_deref(), Some(&b"data"[..]));
        assert!(!calls[0].0.path.exists());
        assert!(staged_files(root.path()).is_empty());
    }

    #[tokio::test]
    async fn cleanup_failure_does_not_mask_the_outcome() {
        let server = MockServer::start().await;
        mount_file(&server, 21, b"data").await;
        let root = tempdir().expect("temp dir");
        let relay = pipeline(&server, root.path(), RecordingIngestion::blocking_cleanup());

        let outcome = relay
            .relay(21, &Destination::default(), "session-1")
            .await
            .unwrap();

        assert_eq!(outcome.original_file.id, 21);
        assert_eq!(outcome.ingestion.file_id, "file-xyz");
        let calls = relay.ingestion.calls();
        let call_dir = calls[0].0.path.parent().unwrap();
        assert!(call_dir.is_file());
    }

    #[tokio::test]
    async fn concurrent_relays_stage_separately() {
        let server = MockServer::start().await;
        mount_file(&server, 1, b"one").await;
        mount_file(&server, 2, b"two").await;
        let root = tempdir().expect("temp dir");
        let relay = pipeline(&server, root.path(), RecordingIngestion::default());
        let destination = Destination::default();

        let (a, b) = tokio::join!(
            relay.relay(1, &destination, "session-a"),
            relay.relay(2, &destination, "session-a"),
        );
        assert_eq!(a.unwrap().original_file.id, 1);
        assert_eq!(b.unwrap().original_file.id, 2);

        let calls = relay.ingestion.calls();
        assert_eq!(calls.len(), 2);
        assert_ne!(calls[0].0.path, calls[1].0.path);
        assert!(staged_files(root.path()).is_empty());
    }
}
