use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::{task, time};

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod win32;

#[cfg(any(target_os = "macos", target_os = "windows"))]
pub mod pointer;

/// Title reported when no window has focus or the probe fails.
pub const NO_ACTIVE_WINDOW: &str = "No active window";

/// Queries the title of the currently focused window.
pub trait WindowProbe: Send + Sync {
    /// `Ok(None)` means nothing has focus right now; `Err` means the desktop
    /// could not be queried at all.
    fn focused_window(&self) -> Result<Option<String>>;
}

/// Queries the pointer position in screen coordinates.
pub trait PointerProbe: Send + Sync {
    fn position(&self) -> Result<(i32, i32)>;
}

#[cfg(target_os = "linux")]
pub use linux::{X11PointerProbe as NativePointerProbe, X11WindowProbe as NativeWindowProbe};

#[cfg(target_os = "macos")]
pub use macos::WorkspaceWindowProbe as NativeWindowProbe;

#[cfg(target_os = "windows")]
pub use win32::Win32WindowProbe as NativeWindowProbe;

#[cfg(any(target_os = "macos", target_os = "windows"))]
pub use pointer::DevicePointerProbe as NativePointerProbe;

// Stubs for development on other platforms
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub struct NativeWindowProbe;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
impl NativeWindowProbe {
    pub fn new() -> Result<Self> {
        Ok(Self)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
impl WindowProbe for NativeWindowProbe {
    fn focused_window(&self) -> Result<Option<String>> {
        Ok(Some("Test Window".to_string()))
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub struct NativePointerProbe;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
impl NativePointerProbe {
    pub fn new() -> Result<Self> {
        Ok(Self)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
impl PointerProbe for NativePointerProbe {
    fn position(&self) -> Result<(i32, i32)> {
        Ok((0, 0))
    }
}

/// Runs a window probe read on the blocking pool with a hard deadline, so a
/// wedged desktop call stalls at most one tick instead of the whole loop.
pub async fn read_window(
    probe: &Arc<dyn WindowProbe>,
    timeout: Duration,
) -> Result<Option<String>> {
    let probe = Arc::clone(probe);
    let read = task::spawn_blocking(move || probe.focused_window());
    match time::timeout(timeout, read).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(anyhow!("window probe task failed: {join_err}")),
        Err(_) => Err(anyhow!(
            "window probe timed out after {}ms",
            timeout.as_millis()
        )),
    }
}

/// Pointer counterpart of [`read_window`], same deadline rules.
pub async fn read_pointer(probe: &Arc<dyn PointerProbe>, timeout: Duration) -> Result<(i32, i32)> {
    let probe = Arc::clone(probe);
    let read = task::spawn_blocking(move || probe.position());
    match time::timeout(timeout, read).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(anyhow!("pointer probe task failed: {join_err}")),
        Err(_) => Err(anyhow!(
            "pointer probe timed out after {}ms",
            timeout.as_millis()
        )),
    }
}
