//! Error taxonomy shared by the catalog client, the relay pipeline and the
//! browse-side clients.

use std::path::PathBuf;

use reqwest::StatusCode;

/// Top-level error type for browse and relay operations.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// LMS base URL or access token is not configured.
    #[error("LMS integration is not configured")]
    UpstreamUnavailable,

    /// An LMS call failed, either with a non-2xx status or in transport.
    #[error("{message}")]
    Upstream {
        status: Option<StatusCode>,
        message: String,
    },

    /// The file content could not be fetched.
    #[error("download failed: {0}")]
    Download(String),

    /// Writing the fetched content to the staging area failed.
    #[error("failed to stage file at {path:?}: {source}")]
    Staging {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The ingestion pipeline rejected the file.
    #[error("ingestion failed: {0}")]
    Ingestion(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    pub fn upstream_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Upstream {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn upstream_transport(err: reqwest::Error) -> Self {
        Self::Upstream {
            status: None,
            message: format!("LMS request failed: {err}"),
        }
    }

    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    pub fn ingestion(msg: impl Into<String>) -> Self {
        Self::Ingestion(msg.into())
    }

    pub fn staging(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Staging {
            path: path.into(),
            source,
        }
    }

    /// Upstream status code carried by the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Upstream { status, .. } => *status,
            _ => None,
        }
    }

    /// Stable label for the error kind, used in logs and response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::Upstream { .. } => "upstream_error",
            Self::Download(_) => "download_error",
            Self::Staging { .. } => "staging_error",
            Self::Ingestion(_) => "ingestion_error",
        }
    }
}
