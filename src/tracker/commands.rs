use tauri::{AppHandle, Emitter, State};

use crate::tracker::{SessionStatistics, TrackerController, TrackerSnapshot};

use crate::AppState;

fn controller_from_state(state: &State<'_, AppState>) -> TrackerController {
    state.tracker.clone()
}

fn emit_tracker_state(app_handle: &AppHandle, snapshot: &TrackerSnapshot) {
    let _ = app_handle.emit("tracker-state-changed", snapshot);
}

#[tauri::command]
pub async fn get_tracker_state(state: State<'_, AppState>) -> Result<TrackerSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.snapshot().await)
}

#[tauri::command]
pub async fn start_tracking(
    app_handle: AppHandle,
    state: State<'_, AppState>,
) -> Result<TrackerSnapshot, String> {
    let controller = controller_from_state(&state);
    let snapshot = controller.start_tracking().await;
    emit_tracker_state(&app_handle, &snapshot);
    Ok(snapshot)
}

#[tauri::command]
pub async fn pause_tracking(
    app_handle: AppHandle,
    state: State<'_, AppState>,
) -> Result<TrackerSnapshot, String> {
    let controller = controller_from_state(&state);
    let snapshot = controller.pause_tracking().await;
    emit_tracker_state(&app_handle, &snapshot);
    Ok(snapshot)
}

#[tauri::command]
pub async fn resume_tracking(
    app_handle: AppHandle,
    state: State<'_, AppState>,
) -> Result<TrackerSnapshot, String> {
    let controller = controller_from_state(&state);
    let snapshot = controller.resume_tracking().await;
    emit_tracker_state(&app_handle, &snapshot);
    Ok(snapshot)
}

#[tauri::command]
pub async fn stop_tracking(
    app_handle: AppHandle,
    state: State<'_, AppState>,
) -> Result<TrackerSnapshot, String> {
    let controller = controller_from_state(&state);
    let snapshot = controller.stop_tracking().await;
    emit_tracker_state(&app_handle, &snapshot);
    Ok(snapshot)
}

#[tauri::command]
pub async fn get_statistics(state: State<'_, AppState>) -> Result<SessionStatistics, String> {
    let controller = controller_from_state(&state);
    Ok(controller.statistics().await)
}

#[tauri::command]
pub async fn get_active_window(state: State<'_, AppState>) -> Result<String, String> {
    let controller = controller_from_state(&state);
    Ok(controller.current_active_window().await)
}
