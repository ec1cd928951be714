//! Observable kernel state at a point in time.

use badge_kernel::{Kernel, input::Mode};

/// Snapshot of the kernel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelSnapshot {
    /// Name the kernel considers active
    pub active: Option<String>,
    /// Running app, if any
    pub app: Option<AppSnapshot>,
    /// Menu of the active screen, if any
    pub menu: Option<MenuSnapshot>,
    /// Decoder mode
    pub mode: Mode,
    /// Characters in the text-capture buffer
    pub capture_len: usize,
    /// Text-capture bound
    pub capture_max: Option<usize>,
    /// Registered bus listeners
    pub listeners: usize,
}

/// Snapshot of the running app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppSnapshot {
    /// App name
    pub name: String,
    /// Active screen index
    pub screen: Option<usize>,
    /// Number of screens
    pub screens: usize,
}

/// Snapshot of a menu's cursor and window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuSnapshot {
    /// Number of entries
    pub len: usize,
    /// Cursor
    pub index: usize,
    /// First visible row
    pub top: usize,
    /// Window height
    pub rows: usize,
}

impl KernelSnapshot {
    /// Capture the observable state of `kernel`.
    pub fn of(kernel: &Kernel) -> Self {
        let cx = kernel.context();
        let capture = cx.input.capture();
        Self {
            active: kernel.active_app().map(str::to_owned),
            app: kernel.app().map(|app| AppSnapshot {
                name: app.name().to_owned(),
                screen: app.current_screen(),
                screens: app.screen_count(),
            }),
            menu: cx.menu.as_ref().map(|menu| MenuSnapshot {
                len: menu.entries().len(),
                index: menu.index(),
                top: menu.top(),
                rows: menu.rows(),
            }),
            mode: cx.input.mode(),
            capture_len: capture.text.chars().count(),
            capture_max: capture.max_len,
            listeners: kernel.bus().listener_count(),
        }
    }
}
