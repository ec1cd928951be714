//! Control directives exchanged between screens, apps and the kernel.
//!
//! Screens and listeners return a [`Reply`]. Well-formed replies are typed
//! [`Directive`]s; loosely-shaped replies (`[action, extra]` JSON pairs) are
//! carried as [`Reply::Raw`] and decoded at the app boundary, where anything
//! malformed falls back to loading the default app.

use serde::Deserialize;
use serde_json::Value;

use crate::error::DirectiveError;

/// Raw action code for [`Directive::Exit`].
pub const ACTION_EXIT: i64 = 0;
/// Raw action code for [`Directive::LoadApp`].
pub const ACTION_LOAD_APP: i64 = 1;
/// Raw action code for [`Directive::LoadScreen`].
pub const ACTION_LOAD_SCREEN: i64 = 2;
/// Raw action code for [`Directive::Reload`].
pub const ACTION_RELOAD: i64 = 3;

/// Keyword arguments handed to a freshly constructed app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchArgs {
    /// Menu entry to pre-select (and activate) on the initial screen
    pub selected_index: Option<usize>,
}

/// Request to switch to an app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Launch {
    /// App name. `None` means the configured default app.
    pub app: Option<String>,
    /// Initial screen index
    pub screen: usize,
    /// Arguments forwarded to the app constructor
    pub args: LaunchArgs,
}

impl Launch {
    /// Launch the configured default app.
    pub fn default_app() -> Self {
        Self::default()
    }

    /// Launch the named app at screen 0.
    pub fn app(name: impl Into<String>) -> Self {
        Self { app: Some(name.into()), ..Self::default() }
    }

    /// Start at a different screen.
    #[must_use]
    pub fn at_screen(mut self, screen: usize) -> Self {
        self.screen = screen;
        self
    }

    /// Pre-select a menu entry on the initial screen.
    #[must_use]
    pub fn selecting(mut self, index: usize) -> Self {
        self.args.selected_index = Some(index);
        self
    }
}

/// Control-flow request returned upward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Terminate the runtime loop.
    Exit,
    /// Switch to another app.
    LoadApp(Launch),
    /// Activate another screen of the current app.
    LoadScreen(usize),
    /// Re-render the current screen without re-activating it.
    Reload,
    /// A hard reboot was requested; stop dispatching.
    Reboot,
}

impl Directive {
    /// Switch to the default app.
    pub fn home() -> Self {
        Self::LoadApp(Launch::default_app())
    }

    /// Short name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Exit => "exit",
            Self::LoadApp(_) => "load_app",
            Self::LoadScreen(_) => "load_screen",
            Self::Reload => "reload",
            Self::Reboot => "reboot",
        }
    }

    /// Decode a loosely-shaped directive.
    ///
    /// Accepted shapes: `3` (reload), `[0, null]`, `[1, null]`, `[1, "name"]`,
    /// `[1, {"app": .., "screen": .., "selected_index": ..}]`, `[2, index]` and
    /// `[3, null]`.
    pub fn from_raw(raw: &Value) -> Result<Self, DirectiveError> {
        let (action, extra) = match raw {
            Value::Number(_) => match action_code(raw)? {
                ACTION_RELOAD => return Ok(Self::Reload),
                _ => return Err(DirectiveError::Malformed(raw.to_string())),
            },
            Value::Array(pair) if pair.len() == 2 => (action_code(&pair[0])?, &pair[1]),
            other => return Err(DirectiveError::Malformed(other.to_string())),
        };

        match action {
            ACTION_EXIT => Ok(Self::Exit),
            ACTION_LOAD_APP => launch_from_raw(extra).map(Self::LoadApp),
            ACTION_LOAD_SCREEN => extra
                .as_u64()
                .and_then(|index| usize::try_from(index).ok())
                .map(Self::LoadScreen)
                .ok_or_else(|| DirectiveError::Malformed(format!("screen index {extra}"))),
            ACTION_RELOAD => Ok(Self::Reload),
            unknown => Err(DirectiveError::UnknownAction(unknown)),
        }
    }
}

/// Value produced by a listener or screen hook.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Typed directive.
    Directive(Directive),
    /// Loosely-shaped value, decoded with [`Directive::from_raw`].
    Raw(Value),
}

impl Reply {
    /// Decode into a typed directive.
    pub fn into_directive(self) -> Result<Directive, DirectiveError> {
        match self {
            Self::Directive(directive) => Ok(directive),
            Self::Raw(raw) => Directive::from_raw(&raw),
        }
    }

    /// True if this reply asks for a reload.
    pub fn is_reload(&self) -> bool {
        match self {
            Self::Directive(directive) => *directive == Directive::Reload,
            Self::Raw(raw) => matches!(Directive::from_raw(raw), Ok(Directive::Reload)),
        }
    }
}

impl From<Directive> for Reply {
    fn from(directive: Directive) -> Self {
        Self::Directive(directive)
    }
}

fn action_code(raw: &Value) -> Result<i64, DirectiveError> {
    raw.as_i64().ok_or_else(|| DirectiveError::Malformed(format!("action {raw}")))
}

#[derive(Deserialize)]
struct RawLaunch {
    #[serde(default)]
    app: Option<String>,
    #[serde(default)]
    screen: usize,
    #[serde(default)]
    selected_index: Option<usize>,
}

fn launch_from_raw(extra: &Value) -> Result<Launch, DirectiveError> {
    match extra {
        Value::Null => Ok(Launch::default_app()),
        Value::String(name) => Ok(Launch::app(name.as_str())),
        Value::Object(_) => {
            let raw = RawLaunch::deserialize(extra)
                .map_err(|err| DirectiveError::Malformed(err.to_string()))?;
            Ok(Launch {
                app: raw.app,
                screen: raw.screen,
                args: LaunchArgs { selected_index: raw.selected_index },
            })
        },
        other => Err(DirectiveError::Malformed(format!("launch target {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn bare_reload_code() {
        assert_eq!(Directive::from_raw(&json!(3)), Ok(Directive::Reload));
        assert!(matches!(Directive::from_raw(&json!(1)), Err(DirectiveError::Malformed(_))));
    }

    #[test]
    fn load_app_shapes() {
        assert_eq!(Directive::from_raw(&json!([1, null])), Ok(Directive::home()));
        assert_eq!(
            Directive::from_raw(&json!([1, "name"])),
            Ok(Directive::LoadApp(Launch::app("name")))
        );
        assert_eq!(
            Directive::from_raw(&json!([1, {"app": "main", "screen": 1, "selected_index": 2}])),
            Ok(Directive::LoadApp(Launch::app("main").at_screen(1).selecting(2)))
        );
    }

    #[test]
    fn load_screen_needs_index() {
        assert_eq!(Directive::from_raw(&json!([2, 4])), Ok(Directive::LoadScreen(4)));
        assert!(matches!(Directive::from_raw(&json!([2, "x"])), Err(DirectiveError::Malformed(_))));
        assert!(matches!(Directive::from_raw(&json!([2, -1])), Err(DirectiveError::Malformed(_))));
    }

    #[test]
    fn rejects_unknown_and_malformed() {
        assert_eq!(Directive::from_raw(&json!([9, null])), Err(DirectiveError::UnknownAction(9)));
        assert!(matches!(Directive::from_raw(&json!("exit")), Err(DirectiveError::Malformed(_))));
        assert!(matches!(Directive::from_raw(&json!([1])), Err(DirectiveError::Malformed(_))));
        assert!(matches!(Directive::from_raw(&json!([1, 5])), Err(DirectiveError::Malformed(_))));
    }

    #[test]
    fn reload_detection() {
        assert!(Reply::from(Directive::Reload).is_reload());
        assert!(Reply::Raw(json!([3, null])).is_reload());
        assert!(!Reply::Raw(json!([0, null])).is_reload());
    }
}
