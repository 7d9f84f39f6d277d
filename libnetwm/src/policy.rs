//! Collaborators the engine defers decisions to.
//!
//! The engine carries protocol state and requests but never decides what a window manager does
//! with them. Requests that arrive as client messages are handed to [`RootPolicy`] and
//! [`WinPolicy`]; hooks that change state return whether the change is accepted, and accepted
//! changes are then written by the engine itself.
use crate::model::*;

/// ViewportPolicy emulates desktops by scrolling one large viewport.
///
/// When `map_viewport` is true, desktop reads and writes that do not explicitly ignore the
/// viewport are routed here instead of the desktop properties.
pub trait ViewportPolicy: Send + Sync {
    fn map_viewport(&self) -> bool {
        false
    }

    fn number_of_desktops(&self) -> i32 {
        1
    }

    fn current_desktop(&self) -> i32 {
        1
    }

    fn set_current_desktop(&self, _desktop: i32) {}

    fn window_desktop(&self, _window: Window) -> i32 {
        1
    }

    fn set_on_desktop(&self, _window: Window, _desktop: i32) {}
}

/// NoViewport keeps desktops as real virtual desktops
#[derive(Debug, Clone, Copy, Default)]
pub struct NoViewport;

impl ViewportPolicy for NoViewport {}

/// RootPolicy receives the root window requests sent by clients to the window manager
#[allow(unused_variables)]
pub trait RootPolicy {
    fn change_number_of_desktops(&mut self, count: i32) -> bool {
        true
    }

    fn change_desktop_geometry(&mut self, size: Size) -> bool {
        true
    }

    /// Viewport requests always target the current desktop
    fn change_desktop_viewport(&mut self, desktop: i32, viewport: Point) -> bool {
        true
    }

    fn change_current_desktop(&mut self, desktop: i32) -> bool {
        true
    }

    fn change_active_window(
        &mut self, window: Window, source: RequestSource, timestamp: Timestamp, active_window: Window,
    ) -> bool {
        true
    }

    fn change_showing_desktop(&mut self, showing: bool) -> bool {
        true
    }

    fn close_window(&mut self, window: Window) {}

    fn move_resize(&mut self, window: Window, x_root: i32, y_root: i32, direction: Direction) {}

    /// `flags` carries the gravity in its low byte and which of x, y, width, height are set
    fn move_resize_window(&mut self, window: Window, flags: u32, x: i32, y: i32, width: i32, height: i32) {}

    fn restack_window(
        &mut self, window: Window, source: RequestSource, above: Window, detail: u32, timestamp: Timestamp,
    ) {
    }

    fn got_ping(&mut self, window: Window, timestamp: Timestamp) {}

    fn got_take_activity(&mut self, window: Window, timestamp: Timestamp, flags: u32) {}
}

/// WinPolicy receives the per window requests sent by clients to the window manager
#[allow(unused_variables)]
pub trait WinPolicy {
    fn change_desktop(&mut self, desktop: i32) -> bool {
        true
    }

    fn change_state(&mut self, state: State, mask: State) -> bool {
        true
    }

    fn change_fullscreen_monitors(&mut self, topology: FullscreenMonitors) -> bool {
        true
    }
}

/// AcceptAll takes every request as is
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl RootPolicy for AcceptAll {}

impl WinPolicy for AcceptAll {}
