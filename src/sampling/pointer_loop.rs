use std::sync::Arc;

use log::info;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::TrackerConfig;
use crate::journal::Journal;
use crate::probes::{self, PointerProbe};
use crate::tracker::state::{PointerSample, TrackerState};

/// Records pointer positions once per interval while a session is Running.
/// Lives for the whole session, including pauses; paused ticks just skip.
pub async fn pointer_sampler_loop(
    state: Arc<Mutex<TrackerState>>,
    probe: Arc<dyn PointerProbe>,
    journal: Journal,
    config: TrackerConfig,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(config.pointer_sample_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sample_pointer(&state, &probe, &journal, &config).await;
            }
            _ = cancel_token.cancelled() => {
                info!("pointer sampler shutting down");
                break;
            }
        }
    }
}

async fn sample_pointer(
    state: &Arc<Mutex<TrackerState>>,
    probe: &Arc<dyn PointerProbe>,
    journal: &Journal,
    config: &TrackerConfig,
) {
    // Idle and paused ticks never touch the probe.
    if !state.lock().await.is_running() {
        return;
    }

    let sample = match probes::read_pointer(probe, config.probe_timeout).await {
        Ok((x, y)) => PointerSample { x, y },
        Err(err) => {
            journal.error(format!("Error reading pointer position: {err:#}"));
            return;
        }
    };

    // Recheck under the lock that appends: a pause that landed while the
    // probe was reading wins and the sample is dropped.
    let mut state = state.lock().await;
    if state.is_running() {
        state.push_pointer(sample);
        journal.info(format!(
            "Recorded pointer position: ({}, {})",
            sample.x, sample.y
        ));
    }
}
