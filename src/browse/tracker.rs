use std::collections::HashSet;

use serde::Serialize;

/// Relay status of a single file resource within a browse session.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayStatus {
    Idle,
    InFlight,
    Done,
}

/// Result of asking to start a relay.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BeginOutcome {
    Started,
    AlreadyInFlight,
    AlreadyDone,
}

/// Per-session map of `content_id` to relay status.
///
/// `in_flight` and `done` are kept disjoint; anything in neither is idle.
#[derive(Debug, Default)]
pub struct UploadTracker {
    in_flight: HashSet<u64>,
    done: HashSet<u64>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `content_id` for a relay. Only [`BeginOutcome::Started`] changes state.
    pub fn begin(&mut self, content_id: u64) -> BeginOutcome {
        if self.done.contains(&content_id) {
            return BeginOutcome::AlreadyDone;
        }
        if !self.in_flight.insert(content_id) {
            return BeginOutcome::AlreadyInFlight;
        }
        BeginOutcome::Started
    }

    pub fn complete(&mut self, content_id: u64) {
        self.in_flight.remove(&content_id);
        self.done.insert(content_id);
    }

    /// Return `content_id` to idle so the user may retry.
    pub fn fail(&mut self, content_id: u64) {
        self.in_flight.remove(&content_id);
    }

    pub fn status(&self, content_id: u64) -> RelayStatus {
        if self.in_flight.contains(&content_id) {
            RelayStatus::InFlight
        } else if self.done.contains(&content_id) {
            RelayStatus::Done
        } else {
            RelayStatus::Idle
        }
    }

    /// Whether the upload trigger should be offered for `content_id`.
    pub fn can_upload(&self, content_id: u64) -> bool {
        self.status(content_id) == RelayStatus::Idle
    }

    #[cfg(test)]
    fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}
