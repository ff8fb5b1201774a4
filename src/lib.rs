//! Relay files from an LMS course catalog into an ingestion pipeline.
//!
//! - [`lms`] talks to the upstream LMS.
//! - [`relay`] stages one file and hands it to an [`ingest::IngestionPipeline`].
//! - [`browse`] holds the navigator and upload tracking that drive both.
//! - [`web`] exposes the browse and relay endpoints.

pub mod browse;
pub mod config;
pub mod error;
pub mod ingest;
pub mod lms;
pub mod relay;
pub mod web;

pub use config::AppConfig;
pub use error::{BridgeError, Result};
pub use web::AppState;
