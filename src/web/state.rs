use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    ingest::OpenAiIngestion,
    lms::LmsClient,
    relay::{RelayPipeline, StagingArea},
};

pub type AppRelay = RelayPipeline<OpenAiIngestion>;

#[derive(Clone)]
pub struct AppState {
    lms: LmsClient,
    relay: Arc<AppRelay>,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let lms = LmsClient::new(config.lms.clone());
        if !lms.is_configured() {
            warn!("CANVAS_API_URL or CANVAS_ACCESS_TOKEN is missing; LMS browsing and relay are unavailable");
        }
        if config.ingestion.api_key.is_none() {
            warn!("OPENAI_API_KEY is missing; relayed files cannot be ingested");
        }

        let staging = StagingArea::new(&config.staging_root);
        staging
            .ensure_root()
            .await
            .context("failed to prepare relay staging directory")?;
        info!(root = %staging.root().display(), "relay staging ready");

        let ingestion = OpenAiIngestion::new(config.ingestion.clone());
        let relay = RelayPipeline::new(lms.clone(), ingestion, staging);

        Ok(Self {
            lms,
            relay: Arc::new(relay),
        })
    }

    pub fn lms(&self) -> &LmsClient {
        &self.lms
    }

    pub fn relay_pipeline(&self) -> Arc<AppRelay> {
        Arc::clone(&self.relay)
    }
}
