//! Standard invariant checks.

use super::{Invariant, InvariantResult, KernelSnapshot, Violation};

/// A running app is the one the kernel considers active.
pub struct ActiveAppMatches;

impl Invariant for ActiveAppMatches {
    fn name(&self) -> &'static str {
        "active_app_matches"
    }

    fn check(&self, state: &KernelSnapshot) -> InvariantResult {
        let Some(app) = &state.app else {
            return Ok(());
        };
        if state.active.as_deref() == Some(app.name.as_str()) {
            return Ok(());
        }
        Err(Violation {
            invariant: self.name(),
            message: format!("app '{}' running while {:?} is active", app.name, state.active),
        })
    }
}

/// The active screen index addresses one of the app's screens.
pub struct ScreenInRange;

impl Invariant for ScreenInRange {
    fn name(&self) -> &'static str {
        "screen_in_range"
    }

    fn check(&self, state: &KernelSnapshot) -> InvariantResult {
        match &state.app {
            Some(app) if app.screen.is_some_and(|screen| screen >= app.screens) => Err(Violation {
                invariant: self.name(),
                message: format!("{}: screen {:?} of {}", app.name, app.screen, app.screens),
            }),
            _ => Ok(()),
        }
    }
}

/// The menu cursor addresses an entry and sits inside the visible window.
pub struct MenuCursorVisible;

impl Invariant for MenuCursorVisible {
    fn name(&self) -> &'static str {
        "menu_cursor_visible"
    }

    fn check(&self, state: &KernelSnapshot) -> InvariantResult {
        let Some(menu) = state.menu else {
            return Ok(());
        };
        let in_list = menu.len == 0 || menu.index < menu.len;
        let in_window = menu.len == 0 || (menu.top <= menu.index && menu.index < menu.top + menu.rows);
        if in_list && in_window {
            return Ok(());
        }
        Err(Violation { invariant: self.name(), message: format!("{menu:?}") })
    }
}

/// The text-capture buffer never outgrows its bound.
pub struct CaptureWithinBound;

impl Invariant for CaptureWithinBound {
    fn name(&self) -> &'static str {
        "capture_within_bound"
    }

    fn check(&self, state: &KernelSnapshot) -> InvariantResult {
        match state.capture_max {
            Some(max) if state.capture_len > max => Err(Violation {
                invariant: self.name(),
                message: format!("buffer holds {} chars, bound {max}", state.capture_len),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants::{AppSnapshot, MenuSnapshot};

    #[test]
    fn stale_active_name_is_flagged() {
        let state = KernelSnapshot {
            active: Some("main".into()),
            app: Some(AppSnapshot { name: "name".into(), screen: Some(0), screens: 2 }),
            ..KernelSnapshot::default()
        };
        assert!(ActiveAppMatches.check(&state).is_err());
    }

    #[test]
    fn cursor_outside_window_is_flagged() {
        let menu = MenuSnapshot { len: 10, index: 2, top: 4, rows: 3 };
        let state = KernelSnapshot { menu: Some(menu), ..KernelSnapshot::default() };
        assert!(MenuCursorVisible.check(&state).is_err());

        let menu = MenuSnapshot { index: 5, ..menu };
        let state = KernelSnapshot { menu: Some(menu), ..KernelSnapshot::default() };
        assert!(MenuCursorVisible.check(&state).is_ok());
    }

    #[test]
    fn capture_bound_only_applies_when_set() {
        let state = KernelSnapshot { capture_len: 400, ..KernelSnapshot::default() };
        assert!(CaptureWithinBound.check(&state).is_ok());

        let state = KernelSnapshot { capture_max: Some(3), ..state };
        assert!(CaptureWithinBound.check(&state).is_err());
    }
}
