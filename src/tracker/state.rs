use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TrackerStatus {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl Default for TrackerStatus {
    fn default() -> Self {
        TrackerStatus::Idle
    }
}

/// One entry in the per-session log of foreground window changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WindowChange {
    pub at: DateTime<Utc>,
    pub title: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PointerSample {
    pub x: i32,
    pub y: i32,
}

/// Tracking session state. Transitions that do not apply to the current
/// status return `false` and change nothing; callers treat that as a no-op
/// rather than an error.
#[derive(Debug, Clone)]
pub struct TrackerState {
    pub status: TrackerStatus,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    /// Committed working time. Survives `start`, so back-to-back sessions
    /// keep adding to one cumulative total.
    pub accumulated_ms: u64,
    /// Last title seen by the watcher. Dedup cache, not per-session data;
    /// `start` leaves it alone so an unchanged window logs nothing new.
    pub active_window: Option<String>,
    pub window_changes: Vec<WindowChange>,
    pub pointer_samples: Vec<PointerSample>,
    /// Start of the segment currently accruing time. `Some` exactly while
    /// Running; combines with `accumulated_ms` at commit points.
    segment_anchor: Option<Instant>,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            status: TrackerStatus::Idle,
            session_id: None,
            started_at: None,
            accumulated_ms: 0,
            active_window: None,
            window_changes: Vec::new(),
            pointer_samples: Vec::new(),
            segment_anchor: None,
        }
    }
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.status == TrackerStatus::Running
    }

    /// Committed time only; the segment in flight counts once it commits
    /// at the next `stop`.
    pub fn total_seconds(&self) -> f64 {
        self.accumulated_ms as f64 / 1000.0
    }

    /// Begin a fresh session. Valid from any status, including mid-session,
    /// where it abandons the in-flight segment. Per-session logs reset;
    /// the cumulative total and the dedup cache do not.
    pub fn start(&mut self, session_id: String, started_at: DateTime<Utc>, now: Instant) {
        self.status = TrackerStatus::Running;
        self.session_id = Some(session_id);
        self.started_at = Some(started_at);
        self.window_changes.clear();
        self.pointer_samples.clear();
        self.segment_anchor = Some(now);
    }

    /// Suspend the running session. The open segment is discarded, not
    /// committed: resume anchors a new one, so time spent running before a
    /// pause never reaches the total.
    pub fn pause(&mut self) -> bool {
        if self.status != TrackerStatus::Running {
            return false;
        }
        self.segment_anchor = None;
        self.status = TrackerStatus::Paused;
        true
    }

    pub fn resume(&mut self, now: Instant) -> bool {
        if self.status != TrackerStatus::Paused {
            return false;
        }
        self.segment_anchor = Some(now);
        self.status = TrackerStatus::Running;
        true
    }

    /// End the session. From Running the open segment commits into the
    /// total; from Paused there is no open segment and nothing is added.
    pub fn stop(&mut self) -> bool {
        match self.status {
            TrackerStatus::Running => {
                if let Some(anchor) = self.segment_anchor.take() {
                    self.accumulated_ms = self
                        .accumulated_ms
                        .saturating_add(anchor.elapsed().as_millis() as u64);
                }
                self.status = TrackerStatus::Stopped;
                true
            }
            TrackerStatus::Paused => {
                self.status = TrackerStatus::Stopped;
                true
            }
            TrackerStatus::Idle | TrackerStatus::Stopped => false,
        }
    }

    /// Record a window reading, deduplicating against the last seen title.
    /// Returns `true` when the title differed and an entry was logged.
    pub fn note_window(&mut self, title: String, at: DateTime<Utc>) -> bool {
        if self.active_window.as_deref() == Some(title.as_str()) {
            return false;
        }
        self.active_window = Some(title.clone());
        self.window_changes.push(WindowChange { at, title });
        true
    }

    pub fn push_pointer(&mut self, sample: PointerSample) {
        self.pointer_samples.push(sample);
    }
}
