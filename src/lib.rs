mod config;
mod journal;
mod probes;
mod sampling;
mod tracker;

use std::sync::Arc;

use anyhow::Context;
use config::TrackerConfig;
use journal::Journal;
use probes::{NativePointerProbe, NativeWindowProbe, PointerProbe, WindowProbe};
use tauri::Manager;
use tracker::{
    commands::{
        get_active_window, get_statistics, get_tracker_state, pause_tracking, resume_tracking,
        start_tracking, stop_tracking,
    },
    TrackerController,
};

pub(crate) struct AppState {
    pub(crate) tracker: TrackerController,
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Worktrace starting up...");

    tauri::Builder::default()
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let journal = Journal::new(app_data_dir.join("logs").join("worktrace.log"))?;
                log::info!("Journal at {}", journal.path().display());

                let window_probe: Arc<dyn WindowProbe> = Arc::new(
                    NativeWindowProbe::new().context("failed to initialize window probe")?,
                );
                let pointer_probe: Arc<dyn PointerProbe> = Arc::new(
                    NativePointerProbe::new().context("failed to initialize pointer probe")?,
                );

                let tracker = TrackerController::new(
                    window_probe,
                    pointer_probe,
                    journal,
                    TrackerConfig::from_env(),
                );

                // The watcher keeps the active-window label live even while
                // no session is running.
                let watcher = tracker.clone();
                tauri::async_runtime::spawn(async move {
                    watcher.start_window_watcher().await;
                });

                app.manage(AppState { tracker });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .on_window_event(|window, event| {
            if let tauri::WindowEvent::CloseRequested { .. } = event {
                // End any live session so its time commits before exit.
                if let Some(state) = window.app_handle().try_state::<AppState>() {
                    let tracker = state.tracker.clone();
                    tauri::async_runtime::block_on(async move {
                        tracker.shutdown().await;
                    });
                }
            }
        })
        .invoke_handler(tauri::generate_handler![
            get_tracker_state,
            start_tracking,
            pause_tracking,
            resume_tracking,
            stop_tracking,
            get_statistics,
            get_active_window,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
