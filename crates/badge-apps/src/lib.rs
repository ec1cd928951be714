//! Built-in badge apps.
//!
//! # Components
//!
//! - [`name`]: the name tag (default app) with its rainbow easter egg
//! - [`menu`]: the main menu listing every installed app
//! - [`auth`]: shows the backend auth code for pairing
//! - [`settings`]: WiFi, backend, name and factory reset
//! - [`special`]: hardware self-test run at the factory
//!
//! [`builtin_registry`] installs all of them under the names the kernel's
//! default configuration expects.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod auth;
pub mod menu;
pub mod name;
pub mod settings;
pub mod special;

use badge_kernel::AppRegistry;

/// Registry name of the name tag.
pub const NAME_APP: &str = "name";
/// Registry name of the main menu.
pub const MENU_APP: &str = "main";
/// Registry name of the auth code app.
pub const AUTH_APP: &str = "auth";
/// Registry name of the settings app.
pub const SETTINGS_APP: &str = "settings";
/// Registry name of the self-test.
pub const SPECIAL_APP: &str = "special";

/// Registry with every built-in app.
pub fn builtin_registry() -> AppRegistry {
    let mut registry = AppRegistry::new();
    registry.install(name::module());
    registry.install(auth::module());
    registry.install(settings::module());
    registry.install(special::module());
    // Last, so the menu sees everything above.
    menu::install(&mut registry);
    registry
}
