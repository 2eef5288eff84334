use std::sync::Arc;

use thiserror::Error;
use winit::dpi::PhysicalPosition;
use winit::window::Window;

/// Errors surfaced by the host window service. All of them are best-effort
/// failures: callers log and carry on with their own cached state.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("no monitor available")]
    NoMonitor,
    #[error("window position unavailable: {0}")]
    Position(String),
    #[error("window reposition rejected: {0}")]
    Reposition(String),
    #[error("interactive drag rejected: {0}")]
    Drag(String),
}

/// The narrow window-system surface the controller is allowed to touch.
///
/// `screen_size` and `window_size` are queried once at init; `set_position`
/// is fire-and-forget (failures are logged, never propagated); `position` is
/// the authoritative fetch used to resync after a drag; `begin_drag` hands
/// cursor-follow behavior to the host for the duration of the drag.
pub trait WindowHost {
    fn screen_size(&self) -> Result<(u32, u32), HostError>;
    fn window_size(&self) -> (u32, u32);
    fn position(&self) -> Result<(i32, i32), HostError>;
    fn set_position(&self, x: i32, y: i32) -> Result<(), HostError>;
    fn begin_drag(&self) -> Result<(), HostError>;
}

/// winit-backed host. Every call here is non-blocking, so the simulation
/// tick never stalls on the window system.
pub struct WinitHost {
    window: Arc<Window>,
}

impl WinitHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl WindowHost for WinitHost {
    fn screen_size(&self) -> Result<(u32, u32), HostError> {
        let monitor = self
            .window
            .current_monitor()
            .or_else(|| self.window.primary_monitor())
            .ok_or(HostError::NoMonitor)?;
        let size = monitor.size();
        Ok((size.width, size.height))
    }

    fn window_size(&self) -> (u32, u32) {
        let size = self.window.outer_size();
        (size.width, size.height)
    }

    fn position(&self) -> Result<(i32, i32), HostError> {
        let pos = self
            .window
            .outer_position()
            .map_err(|e| HostError::Position(e.to_string()))?;
        Ok((pos.x, pos.y))
    }

    fn set_position(&self, x: i32, y: i32) -> Result<(), HostError> {
        self.window
            .set_outer_position(PhysicalPosition::new(x, y));
        Ok(())
    }

    fn begin_drag(&self) -> Result<(), HostError> {
        self.window
            .drag_window()
            .map_err(|e| HostError::Drag(e.to_string()))
    }
}
