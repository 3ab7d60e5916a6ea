use anyhow::Result;
use device_query::{DeviceQuery, DeviceState};

use super::PointerProbe;

/// Pointer coordinates via device_query, one implementation shared by
/// macOS and Windows.
pub struct DevicePointerProbe;

impl DevicePointerProbe {
    pub fn new() -> Result<Self> {
        Ok(Self)
    }
}

impl PointerProbe for DevicePointerProbe {
    fn position(&self) -> Result<(i32, i32)> {
        let device_state = DeviceState::new();
        Ok(device_state.get_mouse().coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires a desktop session
    fn test_read_pointer_position() {
        let probe = DevicePointerProbe::new().unwrap();
        let (x, y) = probe.position().unwrap();
        println!("Pointer: ({x}, {y})");
    }
}
