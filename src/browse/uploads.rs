use std::cell::RefCell;

use tracing::{info, warn};

use crate::{
    browse::{
        RelayTrigger,
        tracker::{BeginOutcome, RelayStatus, UploadTracker},
    },
    error::BridgeError,
    ingest::Destination,
    lms::ModuleItem,
    relay::RelayOutcome,
};

/// Outcome of an upload action on a module item.
#[derive(Debug)]
pub enum UploadAttempt {
    /// The item is not a file and has nothing to relay.
    NotAFile,
    /// The tracker refused to start a second relay.
    Skipped(BeginOutcome),
    Completed(RelayOutcome),
    Failed(BridgeError),
}

/// Couples the [`UploadTracker`] with a relay trigger.
///
/// The tracker borrow is never held across an await, so overlapping
/// `upload` calls on one task see each other's claims.
pub struct UploadController<T> {
    trigger: T,
    destination: Destination,
    tracker: RefCell<UploadTracker>,
}

impl<T: RelayTrigger> UploadController<T> {
    pub fn new(trigger: T) -> Self {
        Self::with_destination(trigger, Destination::default())
    }

    pub fn with_destination(trigger: T, destination: Destination) -> Self {
        Self {
            trigger,
            destination,
            tracker: RefCell::new(UploadTracker::new()),
        }
    }

    pub fn status(&self, content_id: u64) -> RelayStatus {
        self.tracker.borrow().status(content_id)
    }

    /// Whether the item should show an enabled upload trigger.
    pub fn can_upload(&self, item: &ModuleItem) -> bool {
        item.relay_id()
            .is_some_and(|content_id| self.tracker.borrow().can_upload(content_id))
    }

    pub async fn upload(&self, item: &ModuleItem) -> UploadAttempt {
        let Some(content_id) = item.relay_id() else {
            return UploadAttempt::NotAFile;
        };

        let begin = self.tracker.borrow_mut().begin(content_id);
        if begin != BeginOutcome::Started {
            info!(content_id, ?begin, "upload not started");
            return UploadAttempt::Skipped(begin);
        }

        match self.trigger.relay(content_id, &self.destination).await {
            Ok(outcome) => {
                self.tracker.borrow_mut().complete(content_id);
                UploadAttempt::Completed(outcome)
            }
            Err(err) => {
                warn!(?err, content_id, "upload failed");
                self.tracker.borrow_mut().fail(content_id);
                UploadAttempt::Failed(err)
            }
        }
    }
}
