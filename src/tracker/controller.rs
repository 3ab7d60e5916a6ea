use std::{sync::Arc, time::Instant};

use chrono::Utc;
use log::{debug, warn};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    config::TrackerConfig,
    journal::Journal,
    probes::{self, PointerProbe, WindowProbe, NO_ACTIVE_WINDOW},
    sampling::{pointer_sampler_loop, window_watcher_loop, SamplerHandle},
};

use super::state::{TrackerState, TrackerStatus, WindowChange};

/// Light state summary behind the UI poll and change events.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub status: TrackerStatus,
    pub session_id: Option<String>,
    pub total_seconds: f64,
    pub active_window: String,
    pub pointer_sample_count: usize,
}

/// Full report behind the statistics view.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatistics {
    pub session_id: Option<String>,
    pub total_seconds: f64,
    pub active_window: String,
    pub pointer_sample_count: usize,
    pub window_changes: Vec<WindowChange>,
}

/// Drives the tracking session: owns the state, the probes, the journal and
/// the two sampling tasks. Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct TrackerController {
    state: Arc<Mutex<TrackerState>>,
    window_probe: Arc<dyn WindowProbe>,
    pointer_probe: Arc<dyn PointerProbe>,
    journal: Journal,
    config: TrackerConfig,
    pointer_sampler: Arc<Mutex<SamplerHandle>>,
    window_watcher: Arc<Mutex<SamplerHandle>>,
}

impl TrackerController {
    pub fn new(
        window_probe: Arc<dyn WindowProbe>,
        pointer_probe: Arc<dyn PointerProbe>,
        journal: Journal,
        config: TrackerConfig,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(TrackerState::new())),
            window_probe,
            pointer_probe,
            journal,
            config,
            pointer_sampler: Arc::new(Mutex::new(SamplerHandle::new("pointer sampler"))),
            window_watcher: Arc::new(Mutex::new(SamplerHandle::new("window watcher"))),
        }
    }

    pub async fn snapshot(&self) -> TrackerSnapshot {
        let guard = self.state.lock().await;
        TrackerSnapshot {
            status: guard.status,
            session_id: guard.session_id.clone(),
            total_seconds: guard.total_seconds(),
            active_window: guard
                .active_window
                .clone()
                .unwrap_or_else(|| NO_ACTIVE_WINDOW.to_string()),
            pointer_sample_count: guard.pointer_samples.len(),
        }
    }

    /// Begin a session: fresh id, cleared per-session logs, one immediate
    /// window reading, pointer sampler up. Valid from any status.
    pub async fn start_tracking(&self) -> TrackerSnapshot {
        let session_id = Uuid::new_v4().to_string();
        let seed_title = self.read_window_title().await;

        let noted_at = Utc::now();
        let seed_changed = {
            let mut state = self.state.lock().await;
            state.start(session_id.clone(), noted_at, Instant::now());
            state.note_window(seed_title.clone(), noted_at)
        };
        if seed_changed {
            self.journal.info(format!(
                "Window changed to '{seed_title}' at {}",
                noted_at.format("%Y-%m-%d %H:%M:%S")
            ));
        }
        self.journal
            .info(format!("Started tracking work time (session {session_id})."));

        self.spawn_pointer_sampler().await;
        self.snapshot().await
    }

    pub async fn pause_tracking(&self) -> TrackerSnapshot {
        let paused = self.state.lock().await.pause();
        if paused {
            self.journal.info("Paused work tracking.");
        } else {
            debug!("pause ignored: no running session");
        }
        self.snapshot().await
    }

    pub async fn resume_tracking(&self) -> TrackerSnapshot {
        let resumed = self.state.lock().await.resume(Instant::now());
        if resumed {
            self.journal.info("Resumed work tracking.");
        } else {
            debug!("resume ignored: session is not paused");
        }
        self.snapshot().await
    }

    /// End the session. The pointer sampler is joined before the transition
    /// commits, so the reported totals are final the moment this returns.
    pub async fn stop_tracking(&self) -> TrackerSnapshot {
        if let Err(err) = self.pointer_sampler.lock().await.stop().await {
            warn!("pointer sampler did not shut down cleanly: {err:#}");
        }

        let stopped_total = {
            let mut state = self.state.lock().await;
            state.stop().then(|| state.total_seconds())
        };
        match stopped_total {
            Some(total) => self.journal.info(format!(
                "Stopped tracking work time. Total time: {total:.2} seconds"
            )),
            None => debug!("stop ignored: no session in progress"),
        }

        self.snapshot().await
    }

    /// One watcher tick: read the foreground window and log it if the title
    /// moved on. Probe trouble degrades to the sentinel title.
    pub async fn check_window_change(&self) {
        let title = self.read_window_title().await;
        let noted_at = Utc::now();
        let changed = {
            let mut state = self.state.lock().await;
            state.note_window(title.clone(), noted_at)
        };
        if changed {
            self.journal.info(format!(
                "Window changed to '{title}' at {}",
                noted_at.format("%Y-%m-%d %H:%M:%S")
            ));
        }
    }

    /// Fresh probe reading, bypassing the watcher cache.
    pub async fn current_active_window(&self) -> String {
        self.read_window_title().await
    }

    pub async fn statistics(&self) -> SessionStatistics {
        // The statistics view shows a live reading, not the cached label.
        let active_window = self.read_window_title().await;
        let state = self.state.lock().await;
        SessionStatistics {
            session_id: state.session_id.clone(),
            total_seconds: state.total_seconds(),
            active_window,
            pointer_sample_count: state.pointer_samples.len(),
            window_changes: state.window_changes.clone(),
        }
    }

    /// Spawn the app-lifetime foreground watcher. Idempotent.
    pub async fn start_window_watcher(&self) {
        let controller = self.clone();
        let config = self.config.clone();
        self.window_watcher
            .lock()
            .await
            .spawn(move |token| window_watcher_loop(controller, config, token));
    }

    /// Final flush on app close: end any live session, wind down both tasks.
    pub async fn shutdown(&self) {
        let _ = self.stop_tracking().await;
        if let Err(err) = self.window_watcher.lock().await.stop().await {
            warn!("window watcher did not shut down cleanly: {err:#}");
        }
    }

    async fn spawn_pointer_sampler(&self) {
        let state = Arc::clone(&self.state);
        let probe = Arc::clone(&self.pointer_probe);
        let journal = self.journal.clone();
        let config = self.config.clone();
        self.pointer_sampler
            .lock()
            .await
            .spawn(move |token| pointer_sampler_loop(state, probe, journal, config, token));
    }

    async fn read_window_title(&self) -> String {
        match probes::read_window(&self.window_probe, self.config.probe_timeout).await {
            Ok(Some(title)) => title,
            Ok(None) => NO_ACTIVE_WINDOW.to_string(),
            Err(err) => {
                self.journal
                    .error(format!("Error getting active window: {err:#}"));
                NO_ACTIVE_WINDOW.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::sleep;

    const IDLE_DESKTOP: &str = "Desktop";

    enum WindowReading {
        Title(&'static str),
        NoFocus,
        Fail,
    }

    struct ScriptedWindowProbe {
        script: StdMutex<VecDeque<WindowReading>>,
        fallback: &'static str,
    }

    impl WindowProbe for ScriptedWindowProbe {
        fn focused_window(&self) -> anyhow::Result<Option<String>> {
            let reading = self.script.lock().unwrap().pop_front();
            match reading {
                Some(WindowReading::Title(title)) => Ok(Some(title.to_string())),
                Some(WindowReading::NoFocus) => Ok(None),
                Some(WindowReading::Fail) => Err(anyhow!("window probe exploded")),
                None => Ok(Some(self.fallback.to_string())),
            }
        }
    }

    enum PointerReading {
        Point(i32, i32),
        Fail,
    }

    struct ScriptedPointerProbe {
        script: StdMutex<VecDeque<PointerReading>>,
        fallback: (i32, i32),
    }

    impl PointerProbe for ScriptedPointerProbe {
        fn position(&self) -> anyhow::Result<(i32, i32)> {
            let reading = self.script.lock().unwrap().pop_front();
            match reading {
                Some(PointerReading::Point(x, y)) => Ok((x, y)),
                Some(PointerReading::Fail) => Err(anyhow!("pointer probe exploded")),
                None => Ok(self.fallback),
            }
        }
    }

    struct TestRig {
        controller: TrackerController,
        journal_dir: TempDir,
    }

    impl TestRig {
        fn journal_text(&self) -> String {
            std::fs::read_to_string(self.journal_dir.path().join("journal.log")).unwrap()
        }
    }

    fn make_rig(
        window_script: Vec<WindowReading>,
        window_fallback: &'static str,
        pointer_script: Vec<PointerReading>,
    ) -> TestRig {
        let journal_dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(journal_dir.path().join("journal.log")).unwrap();

        let window_probe: Arc<dyn WindowProbe> = Arc::new(ScriptedWindowProbe {
            script: StdMutex::new(window_script.into()),
            fallback: window_fallback,
        });
        let pointer_probe: Arc<dyn PointerProbe> = Arc::new(ScriptedPointerProbe {
            script: StdMutex::new(pointer_script.into()),
            fallback: (100, 200),
        });

        let config = TrackerConfig {
            window_poll_interval: Duration::from_millis(20),
            pointer_sample_interval: Duration::from_millis(20),
            probe_timeout: Duration::from_millis(500),
        };

        TestRig {
            controller: TrackerController::new(window_probe, pointer_probe, journal, config),
            journal_dir,
        }
    }

    #[tokio::test]
    async fn test_start_seeds_the_window_log() {
        let rig = make_rig(
            vec![WindowReading::Title("Editor")],
            IDLE_DESKTOP,
            Vec::new(),
        );

        let snapshot = rig.controller.start_tracking().await;
        assert_eq!(snapshot.status, TrackerStatus::Running);
        assert!(snapshot.session_id.is_some());
        assert_eq!(snapshot.active_window, "Editor");

        let stats = rig.controller.statistics().await;
        assert_eq!(stats.window_changes.len(), 1);
        assert_eq!(stats.window_changes[0].title, "Editor");
        let _ = rig.controller.stop_tracking().await;
    }

    #[tokio::test]
    async fn test_probe_failure_degrades_to_sentinel() {
        let rig = make_rig(vec![WindowReading::Fail], IDLE_DESKTOP, Vec::new());

        let snapshot = rig.controller.start_tracking().await;
        assert_eq!(snapshot.status, TrackerStatus::Running);
        assert_eq!(snapshot.active_window, NO_ACTIVE_WINDOW);

        let _ = rig.controller.stop_tracking().await;
        sleep(Duration::from_millis(50)).await;
        assert!(rig.journal_text().contains("Error getting active window"));
    }

    #[tokio::test]
    async fn test_no_focus_reads_as_sentinel() {
        let rig = make_rig(vec![WindowReading::NoFocus], IDLE_DESKTOP, Vec::new());
        assert_eq!(
            rig.controller.current_active_window().await,
            NO_ACTIVE_WINDOW
        );
    }

    #[tokio::test]
    async fn test_watcher_ticks_dedup_repeated_titles() {
        let rig = make_rig(
            vec![
                WindowReading::Title("Editor"),
                WindowReading::Title("Browser"),
                WindowReading::Title("Browser"),
                WindowReading::Title("Terminal"),
            ],
            "Terminal",
            Vec::new(),
        );

        rig.controller.start_tracking().await;
        // Three watcher ticks against the scripted readings.
        rig.controller.check_window_change().await;
        rig.controller.check_window_change().await;
        rig.controller.check_window_change().await;

        let stats = rig.controller.statistics().await;
        let titles: Vec<&str> = stats
            .window_changes
            .iter()
            .map(|change| change.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Editor", "Browser", "Terminal"]);
        let _ = rig.controller.stop_tracking().await;
    }

    #[tokio::test]
    async fn test_window_watcher_loop_logs_changes_while_idle() {
        let rig = make_rig(
            vec![
                WindowReading::Title("Editor"),
                WindowReading::Title("Browser"),
                WindowReading::Title("Browser"),
                WindowReading::Title("Terminal"),
            ],
            "Terminal",
            Vec::new(),
        );

        // No session started: the watcher still logs changes.
        rig.controller.start_window_watcher().await;
        sleep(Duration::from_millis(150)).await;
        rig.controller.shutdown().await;

        let stats = rig.controller.statistics().await;
        let titles: Vec<&str> = stats
            .window_changes
            .iter()
            .map(|change| change.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Editor", "Browser", "Terminal"]);
    }

    #[tokio::test]
    async fn test_pointer_samples_gate_on_running() {
        let rig = make_rig(vec![], IDLE_DESKTOP, Vec::new());

        rig.controller.start_tracking().await;
        sleep(Duration::from_millis(90)).await;

        let paused = rig.controller.pause_tracking().await;
        assert_eq!(paused.status, TrackerStatus::Paused);
        let frozen = paused.pointer_sample_count;
        assert!(frozen > 0, "expected samples while running");

        sleep(Duration::from_millis(90)).await;
        let still_paused = rig.controller.snapshot().await;
        assert_eq!(still_paused.pointer_sample_count, frozen);

        rig.controller.resume_tracking().await;
        sleep(Duration::from_millis(90)).await;
        let resumed = rig.controller.snapshot().await;
        assert!(resumed.pointer_sample_count > frozen);

        let _ = rig.controller.stop_tracking().await;
    }

    #[tokio::test]
    async fn test_stop_freezes_sample_count_before_reporting() {
        let rig = make_rig(vec![], IDLE_DESKTOP, Vec::new());

        rig.controller.start_tracking().await;
        sleep(Duration::from_millis(70)).await;

        let stopped = rig.controller.stop_tracking().await;
        assert_eq!(stopped.status, TrackerStatus::Stopped);
        let final_count = stopped.pointer_sample_count;
        assert!(final_count > 0);

        // The sampler is joined, nothing can land afterwards.
        sleep(Duration::from_millis(90)).await;
        assert_eq!(
            rig.controller.snapshot().await.pointer_sample_count,
            final_count
        );
    }

    #[tokio::test]
    async fn test_pointer_probe_failure_skips_tick_and_recovers() {
        let rig = make_rig(
            vec![],
            IDLE_DESKTOP,
            vec![PointerReading::Fail, PointerReading::Point(5, 6)],
        );

        rig.controller.start_tracking().await;
        sleep(Duration::from_millis(90)).await;
        let stopped = rig.controller.stop_tracking().await;

        // First tick failed, later ticks recorded.
        assert!(stopped.pointer_sample_count > 0);
        sleep(Duration::from_millis(50)).await;
        assert!(rig
            .journal_text()
            .contains("Error reading pointer position"));
    }

    #[tokio::test]
    async fn test_pause_then_stop_commits_zero_time() {
        let rig = make_rig(vec![], IDLE_DESKTOP, Vec::new());

        rig.controller.start_tracking().await;
        sleep(Duration::from_millis(60)).await;
        rig.controller.pause_tracking().await;
        let stopped = rig.controller.stop_tracking().await;

        assert_eq!(stopped.status, TrackerStatus::Stopped);
        assert_eq!(stopped.total_seconds, 0.0);
    }

    #[tokio::test]
    async fn test_total_accumulates_across_sessions() {
        let rig = make_rig(vec![], IDLE_DESKTOP, Vec::new());

        rig.controller.start_tracking().await;
        sleep(Duration::from_millis(60)).await;
        let first = rig.controller.stop_tracking().await;
        assert!(first.total_seconds > 0.0);

        let restarted = rig.controller.start_tracking().await;
        assert_eq!(restarted.total_seconds, first.total_seconds);
        assert_ne!(restarted.session_id, first.session_id);

        sleep(Duration::from_millis(60)).await;
        let second = rig.controller.stop_tracking().await;
        assert!(second.total_seconds > first.total_seconds);
    }

    #[tokio::test]
    async fn test_transitions_from_idle_are_silent_noops() {
        let rig = make_rig(vec![], IDLE_DESKTOP, Vec::new());

        assert_eq!(
            rig.controller.pause_tracking().await.status,
            TrackerStatus::Idle
        );
        assert_eq!(
            rig.controller.resume_tracking().await.status,
            TrackerStatus::Idle
        );
        let stopped = rig.controller.stop_tracking().await;
        assert_eq!(stopped.status, TrackerStatus::Idle);
        assert_eq!(stopped.total_seconds, 0.0);
    }

    #[tokio::test]
    async fn test_statistics_reads_window_live() {
        let rig = make_rig(
            vec![
                WindowReading::Title("Editor"),
                WindowReading::Title("Browser"),
            ],
            IDLE_DESKTOP,
            Vec::new(),
        );

        rig.controller.start_tracking().await;
        rig.controller.check_window_change().await;

        // Script is exhausted: the live read returns the fallback while the
        // change log keeps the scripted history.
        let stats = rig.controller.statistics().await;
        assert_eq!(stats.active_window, IDLE_DESKTOP);
        let titles: Vec<&str> = stats
            .window_changes
            .iter()
            .map(|change| change.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Editor", "Browser"]);
        let _ = rig.controller.stop_tracking().await;
    }

    #[tokio::test]
    async fn test_restart_midsession_clears_logs_and_keeps_total() {
        let rig = make_rig(
            vec![
                WindowReading::Title("Editor"),
                WindowReading::Title("Browser"),
                // Consumed by the live read inside the statistics call below.
                WindowReading::Title("Browser"),
                WindowReading::Title("Terminal"),
            ],
            IDLE_DESKTOP,
            Vec::new(),
        );

        rig.controller.start_tracking().await;
        rig.controller.check_window_change().await;
        assert_eq!(rig.controller.statistics().await.window_changes.len(), 2);

        // Restart without stopping: logs reset, one fresh seed entry.
        let restarted = rig.controller.start_tracking().await;
        assert_eq!(restarted.status, TrackerStatus::Running);
        let stats = rig.controller.statistics().await;
        assert_eq!(stats.window_changes.len(), 1);
        assert_eq!(stats.window_changes[0].title, "Terminal");
        let _ = rig.controller.stop_tracking().await;
    }

    #[tokio::test]
    async fn test_journal_records_the_session_story() {
        let rig = make_rig(vec![WindowReading::Title("Editor")], IDLE_DESKTOP, Vec::new());

        rig.controller.start_tracking().await;
        sleep(Duration::from_millis(40)).await;
        rig.controller.pause_tracking().await;
        rig.controller.resume_tracking().await;
        rig.controller.stop_tracking().await;
        sleep(Duration::from_millis(50)).await;

        let journal = rig.journal_text();
        assert!(journal.contains("Window changed to 'Editor'"));
        assert!(journal.contains("Started tracking work time"));
        assert!(journal.contains("Paused work tracking."));
        assert!(journal.contains("Resumed work tracking."));
        assert!(journal.contains("Stopped tracking work time. Total time:"));
    }
}
