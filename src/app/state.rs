use std::time::{Duration, Instant};

use crate::remote::DetailOutcome;
use crate::router::CellPress;

/// How long a status message replaces the summary line.
pub const STATUS_TTL: Duration = Duration::from_secs(4);

/// What the detail panel shows for the last pressed cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detail {
    Idle,
    Pending,
    Code(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Waiting,
    Live,
    Paused,
    Closed(Option<String>),
}

#[derive(Debug)]
pub struct ViewerState {
    /// Island picked locally; the server is told about it but may lag behind.
    pub selected_island: usize,
    pub pressed: Option<CellPress>,
    pub detail: Detail,
    pub feed: FeedStatus,
    pub(super) status: Option<(String, Instant)>,
    pub applied: u64,
    pub superseded: u64,
    pub rejected: u64,
}

impl Default for ViewerState {
    fn default() -> Self {
        ViewerState {
            selected_island: 0,
            pressed: None,
            detail: Detail::Idle,
            feed: FeedStatus::Waiting,
            status: None,
            applied: 0,
            superseded: 0,
            rejected: 0,
        }
    }
}

impl ViewerState {
    /// Move the island selection by `delta`, wrapping over `count` islands.
    ///
    /// Returns the new selection, or `None` when nothing changed.
    pub fn step_island(&mut self, delta: isize, count: usize) -> Option<usize> {
        if count == 0 {
            self.notify("Snapshot has no islands");
            return None;
        }
        let current = self.selected_island.min(count - 1) as isize;
        let next = (current + delta).rem_euclid(count as isize) as usize;
        if next == self.selected_island {
            return None;
        }
        self.selected_island = next;
        self.notify(format!("Observing island {} of {count}", next + 1));
        Some(next)
    }

    /// Show a message on the status line until it expires.
    pub fn notify(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), Instant::now()));
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status.as_ref().map(|(message, _)| message.as_str())
    }

    /// Drop a message older than `STATUS_TTL`. Returns whether one was dropped.
    pub fn expire_status(&mut self, now: Instant) -> bool {
        let expired = self
            .status
            .as_ref()
            .is_some_and(|(_, shown)| now.saturating_duration_since(*shown) >= STATUS_TTL);
        if expired {
            self.status = None;
        }
        expired
    }

    pub fn cell_pressed(&mut self, press: CellPress) {
        self.pressed = Some(press);
        self.detail = Detail::Pending;
    }

    /// Record a detail answer. Answers for a cell other than the last
    /// pressed one are dropped; returns whether the panel changed.
    pub fn detail_arrived(&mut self, outcome: DetailOutcome) -> bool {
        let Some(press) = &self.pressed else {
            return false;
        };
        if (press.x, press.y) != (outcome.x, outcome.y) {
            return false;
        }
        self.detail = match outcome.result {
            Ok(code) => Detail::Code(code),
            Err(message) => Detail::Failed(message),
        };
        true
    }

    pub fn clear_detail(&mut self) {
        self.pressed = None;
        self.detail = Detail::Idle;
    }
}
