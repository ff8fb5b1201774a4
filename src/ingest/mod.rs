//! Seam to the internal ingestion pipeline, plus the OpenAI-backed implementation.

use std::{fmt, future::Future, path::PathBuf};

use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    config::IngestionConfig,
    error::{BridgeError, Result},
    relay::StagedFile,
};

pub const DEFAULT_ENDPOINT: &str = "openAI";
pub const DEFAULT_RESOURCE_KIND: &str = "file_search";

const FILE_PURPOSE: &str = "assistants";

/// Where a relayed file should end up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub endpoint: String,
    pub resource_kind: String,
}

impl Default for Destination {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            resource_kind: DEFAULT_RESOURCE_KIND.to_string(),
        }
    }
}

impl Destination {
    /// Fill unspecified or blank parts with the defaults.
    pub fn from_parts(endpoint: Option<String>, resource_kind: Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            endpoint: endpoint
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.endpoint),
            resource_kind: resource_kind
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.resource_kind),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.endpoint, self.resource_kind)
    }
}

/// Input accepted by an [`IngestionPipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionRequest {
    pub path: PathBuf,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub destination: Destination,
}

/// Build the ingestion input for a staged file.
pub fn to_ingestion_request(staged: &StagedFile, destination: &Destination) -> IngestionRequest {
    IngestionRequest {
        path: staged.local_path().to_path_buf(),
        filename: staged.original_filename().to_string(),
        content_type: staged.content_type().to_string(),
        size: staged.size(),
        destination: destination.clone(),
    }
}

/// Result reported by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionOutcome {
    pub file_id: String,
    pub filename: String,
    pub bytes: u64,
    pub purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_store_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_store_file_status: Option<String>,
}

/// Consumes a staged file and turns it into a retrievable artifact.
pub trait IngestionPipeline: Send + Sync {
    fn ingest(
        &self,
        request: IngestionRequest,
    ) -> impl Future<Output = Result<IngestionOutcome>> + Send;
}

/// Supported resource kinds for the `openAI` endpoint.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ResourceKind {
    FileSearch,
    Files,
}

impl ResourceKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "file_search" => Some(ResourceKind::FileSearch),
            "files" => Some(ResourceKind::Files),
            _ => None,
        }
    }
}

/// Uploads staged files to an OpenAI-compatible Files API and, for
/// `file_search`, attaches them to the configured vector store.
#[derive(Clone)]
pub struct OpenAiIngestion {
    http: Client,
    config: IngestionConfig,
}

impl OpenAiIngestion {
    pub fn new(config: IngestionConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn upload_file(&self, api_key: &str, request: &IngestionRequest) -> Result<UploadedFile> {
        let bytes = tokio::fs::read(&request.path).await.map_err(|err| {
            BridgeError::ingestion(format!(
                "failed to read staged file {}: {err}",
                request.path.display()
            ))
        })?;

        let part = Part::bytes(bytes)
            .file_name(request.filename.clone())
            .mime_str(&request.content_type)
            .map_err(|err| BridgeError::ingestion(format!("invalid content type: {err}")))?;
        let form = Form::new()
            .text("purpose", FILE_PURPOSE)
            .part("file", part);

        let response = self
            .http
            .post(self.endpoint("files"))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|err| BridgeError::ingestion(format!("file upload request failed: {err}")))?;

        decode_response(response, "file upload").await
    }

    async fn attach_to_vector_store(
        &self,
        api_key: &str,
        vector_store_id: &str,
        file_id: &str,
    ) -> Result<VectorStoreFile> {
        let response = self
            .http
            .post(self.endpoint(&format!("vector_stores/{vector_store_id}/files")))
            .bearer_auth(api_key)
            .json(&serde_json::json!({ "file_id": file_id }))
            .send()
            .await
            .map_err(|err| {
                BridgeError::ingestion(format!("vector store attach request failed: {err}"))
            })?;

        decode_response(response, "vector store attach").await
    }
}

impl IngestionPipeline for OpenAiIngestion {
    async fn ingest(&self, request: IngestionRequest) -> Result<IngestionOutcome> {
        if !request.destination.endpoint.eq_ignore_ascii_case(DEFAULT_ENDPOINT) {
            return Err(BridgeError::ingestion(format!(
                "unsupported ingestion endpoint `{}`",
                request.destination.endpoint
            )));
        }
        let kind = ResourceKind::parse(&request.destination.resource_kind).ok_or_else(|| {
            BridgeError::ingestion(format!(
                "unsupported resource kind `{}`",
                request.destination.resource_kind
            ))
        })?;
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(BridgeError::ingestion(
                "OPENAI_API_KEY is not configured but required for ingestion",
            ));
        };

        let uploaded = self.upload_file(api_key, &request).await?;
        info!(file_id = %uploaded.id, filename = %uploaded.filename, "file uploaded for ingestion");

        let mut outcome = IngestionOutcome {
            file_id: uploaded.id,
            filename: uploaded.filename,
            bytes: uploaded.bytes,
            purpose: uploaded.purpose,
            status: uploaded.status,
            vector_store_id: None,
            vector_store_file_status: None,
        };

        if kind == ResourceKind::FileSearch {
            match self.config.vector_store_id.as_deref() {
                Some(store_id) => {
                    let attached = self
                        .attach_to_vector_store(api_key, store_id, &outcome.file_id)
                        .await?;
                    outcome.vector_store_id = Some(
                        attached
                            .vector_store_id
                            .unwrap_or_else(|| store_id.to_string()),
                    );
                    outcome.vector_store_file_status = attached.status;
                }
                None => {
                    warn!(
                        file_id = %outcome.file_id,
                        "no vector store configured; file uploaded without attachment"
                    );
                }
            }
        }

        Ok(outcome)
    }
}

async fn decode_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation: &str,
) -> Result<T> {
    let status = response.status();
    let text = response.text().await.map_err(|err| {
        BridgeError::ingestion(format!("failed to read {operation} response: {err}"))
    })?;

    if !status.is_success() {
        let preview = if text.chars().count() > 500 {
            format!("{}...", text.chars().take(500).collect::<String>())
        } else {
            text
        };
        return Err(BridgeError::ingestion(format!(
            "{operation} failed with status {status}: {preview}"
        )));
    }

    serde_json::from_str(&text).map_err(|err| {
        BridgeError::ingestion(format!("unexpected {operation} response payload: {err}"))
    })
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: String,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    bytes: u64,
    #[serde(default)]
    purpose: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VectorStoreFile {
    #[serde(default)]
    vector_store_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}
