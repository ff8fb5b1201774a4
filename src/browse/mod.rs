//! Browse-side state: the course/module/item navigator and per-file upload
//! tracking, plus the seams they drive.

pub mod navigator;
pub mod portal;
pub mod tracker;
pub mod uploads;

pub use navigator::{Level, LoadTarget, LoadTicket, Loaded, NavigationError, Navigator, View};
pub use portal::PortalClient;
pub use tracker::{BeginOutcome, RelayStatus, UploadTracker};
pub use uploads::{UploadAttempt, UploadController};

use std::future::Future;

use crate::{
    error::Result,
    ingest::Destination,
    lms::{Course, LmsClient, Module, ModuleItem},
    relay::RelayOutcome,
};

/// Read-only catalog the navigator browses.
pub trait CatalogSource {
    fn list_courses(&self) -> impl Future<Output = Result<Vec<Course>>>;
    fn list_modules(&self, course_id: u64) -> impl Future<Output = Result<Vec<Module>>>;
    fn list_items(
        &self,
        course_id: u64,
        module_id: u64,
    ) -> impl Future<Output = Result<Vec<ModuleItem>>>;
}

/// Starts a relay of one LMS file.
pub trait RelayTrigger {
    fn relay(
        &self,
        file_id: u64,
        destination: &Destination,
    ) -> impl Future<Output = Result<RelayOutcome>>;
}

impl CatalogSource for LmsClient {
    async fn list_courses(&self) -> Result<Vec<Course>> {
        LmsClient::list_courses(self).await
    }

    async fn list_modules(&self, course_id: u64) -> Result<Vec<Module>> {
        LmsClient::list_modules(self, course_id).await
    }

    async fn list_items(&self, course_id: u64, module_id: u64) -> Result<Vec<ModuleItem>> {
        LmsClient::list_items(self, course_id, module_id).await
    }
}
