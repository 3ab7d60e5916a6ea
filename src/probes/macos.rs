use anyhow::Result;
use objc2_app_kit::NSWorkspace;

use super::WindowProbe;

/// Frontmost application name via NSWorkspace. Per-window titles require the
/// Accessibility API plus a user-granted permission; the application name
/// requires neither.
pub struct WorkspaceWindowProbe;

impl WorkspaceWindowProbe {
    pub fn new() -> Result<Self> {
        Ok(Self)
    }
}

impl WindowProbe for WorkspaceWindowProbe {
    fn focused_window(&self) -> Result<Option<String>> {
        let workspace = NSWorkspace::sharedWorkspace();
        let Some(app) = workspace.frontmostApplication() else {
            return Ok(None);
        };
        let name = app.localizedName().map(|name| name.to_string());
        Ok(name.filter(|name| !name.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires a logged-in desktop session
    fn test_read_frontmost_application() {
        let probe = WorkspaceWindowProbe::new().unwrap();
        if let Some(name) = probe.focused_window().unwrap() {
            println!("Frontmost: {name}");
        }
    }
}
