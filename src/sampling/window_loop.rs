use log::info;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::TrackerConfig;
use crate::tracker::TrackerController;

/// Polls the foreground window for the life of the app. Runs in every
/// tracker status so the active-window label stays live between sessions.
pub async fn window_watcher_loop(
    controller: TrackerController,
    config: TrackerConfig,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(config.window_poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                controller.check_window_change().await;
            }
            _ = cancel_token.cancelled() => {
                info!("window watcher shutting down");
                break;
            }
        }
    }
}
