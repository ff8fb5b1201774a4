use std::{env, path::PathBuf};

use anyhow::{Context, Result};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_STAGING_DIR: &str = "storage/relay";
const DEFAULT_PORT: u16 = 8080;

/// Process configuration, assembled once at startup and injected into clients.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub lms: LmsConfig,
    pub ingestion: IngestionConfig,
    pub staging_root: PathBuf,
    pub port: u16,
}

/// Connection settings for the upstream LMS.
#[derive(Clone, Debug, Default)]
pub struct LmsConfig {
    pub base_url: Option<String>,
    pub access_token: Option<String>,
}

impl LmsConfig {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            access_token: Some(access_token.into()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.access_token.is_some()
    }
}

/// Connection settings for the OpenAI-compatible ingestion service.
#[derive(Clone, Debug)]
pub struct IngestionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub vector_store_id: Option<String>,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            vector_store_id: None,
        }
    }
}

impl AppConfig {
    /// Build the configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = match non_empty_var("PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got {raw:?}"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            lms: LmsConfig {
                base_url: non_empty_var("CANVAS_API_URL"),
                access_token: non_empty_var("CANVAS_ACCESS_TOKEN"),
            },
            ingestion: IngestionConfig {
                api_key: non_empty_var("OPENAI_API_KEY"),
                base_url: non_empty_var("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                vector_store_id: non_empty_var("OPENAI_VECTOR_STORE_ID"),
            },
            staging_root: non_empty_var("RELAY_STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR)),
            port,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
