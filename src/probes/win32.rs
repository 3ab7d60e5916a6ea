use anyhow::Result;
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetWindowTextLengthW, GetWindowTextW,
};

use super::WindowProbe;

/// Foreground window title via the Win32 user API.
pub struct Win32WindowProbe;

impl Win32WindowProbe {
    pub fn new() -> Result<Self> {
        Ok(Self)
    }
}

impl WindowProbe for Win32WindowProbe {
    fn focused_window(&self) -> Result<Option<String>> {
        let hwnd = unsafe { GetForegroundWindow() };
        // Null handle during screen lock or desktop switches.
        if hwnd.0.is_null() {
            return Ok(None);
        }

        let length = unsafe { GetWindowTextLengthW(hwnd) };
        if length == 0 {
            return Ok(None);
        }

        let mut buffer = vec![0u16; (length + 1) as usize];
        let copied = unsafe { GetWindowTextW(hwnd, &mut buffer) };
        if copied == 0 {
            return Ok(None);
        }

        Ok(Some(String::from_utf16_lossy(&buffer[..copied as usize])))
    }
}
