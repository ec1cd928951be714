//! Settings app.
//!
//! Screen 0 is the settings menu, screen 1 edits the WiFi credentials,
//! screen 2 points at the web page for custom images and screen 3 shows the
//! badge id. Edits go through text capture and are persisted on confirm.

use std::fmt::Write as _;

use badge_kernel::{
    App, Context, Directive, Event, FnModule, LaunchArgs, MenuEntry, Reply, Screen,
    StartReason,
    error::AppError,
    hal::{Color, TextStyle},
    storage::keys,
};
use serde_json::Value;

use crate::SETTINGS_APP;

const ACTION_INFO: &str = "info";
const ACTION_WIFI: &str = "wifi";
const ACTION_URL: &str = "url";
const ACTION_NAME: &str = "name";
const ACTION_IMAGE: &str = "image";
const ACTION_RESET: &str = "reset";

const ACTION_SSID: &str = "ssid";
const ACTION_PSK: &str = "psk";

const IMAGE_HINT: &str = "Go to https://badge.troopers.de/name";

fn text_of(event: &Event) -> Option<(&str, &str)> {
    Some((event.get_str("context")?, event.get_str("value")?))
}

fn notice(cx: &mut Context, text: &str) {
    let display = cx.display.as_mut();
    display.fill(Color::Background);
    display.text(text, 0, 0, TextStyle::wrapped());
    display.update();
}

/// Settings menu.
#[derive(Debug, Default)]
pub struct SettingsScreen;

impl Screen for SettingsScreen {
    fn menu_entries(&self) -> Vec<MenuEntry> {
        vec![
            MenuEntry::new("Badge ID", ACTION_INFO),
            MenuEntry::new("WiFi", ACTION_WIFI),
            MenuEntry::new("OTA Url", ACTION_URL),
            MenuEntry::new("Change name", ACTION_NAME),
            MenuEntry::new("Change Image", ACTION_IMAGE),
            MenuEntry::new("Factory reset", ACTION_RESET),
        ]
    }

    fn on_menu_selection(&mut self, entry: &MenuEntry, cx: &mut Context) -> Option<Reply> {
        match entry.action.as_str() {
            ACTION_INFO => return Some(Directive::LoadScreen(3).into()),
            ACTION_WIFI => return Some(Directive::LoadScreen(1).into()),
            ACTION_IMAGE => return Some(Directive::LoadScreen(2).into()),
            ACTION_URL => {
                let current = cx.storage.get_str(keys::OTA_SERVER).unwrap_or_default().to_owned();
                cx.get_user_input(Some(ACTION_URL), &current, Some("Provisioning server url"), Some(120));
            },
            ACTION_NAME => {
                let current = cx.storage.get_str(keys::NAME).unwrap_or_default().to_owned();
                cx.get_user_input(Some(ACTION_NAME), &current, Some("Set your name"), Some(51));
            },
            ACTION_RESET => {
                cx.get_user_input(Some(ACTION_RESET), "", Some("Type 'yes' to reset the badge"), Some(3));
            },
            other => tracing::warn!(action = other, "unknown settings entry"),
        }
        None
    }

    fn on_text(&mut self, event: &Event, cx: &mut Context) -> Option<Reply> {
        let (context, value) = text_of(event)?;
        match context {
            ACTION_URL => cx.storage.set(keys::OTA_SERVER, Value::from(value)),
            ACTION_NAME => {
                cx.storage.set(keys::NAME, Value::from(value));
                tracing::info!(name = value, "name changed");
                if cx.reason == StartReason::NameSetup {
                    return cx.reboot();
                }
            },
            ACTION_RESET if value.eq_ignore_ascii_case("yes") => {
                notice(cx, "Resetting badge...");
                return cx.factory().then(|| Directive::Reboot.into());
            },
            _ => {},
        }
        None
    }
}

/// WiFi credentials.
#[derive(Debug, Default)]
pub struct WifiScreen;

impl Screen for WifiScreen {
    fn menu_entries(&self) -> Vec<MenuEntry> {
        vec![MenuEntry::new("SSID", ACTION_SSID), MenuEntry::new("PSK", ACTION_PSK)]
    }

    fn on_menu_selection(&mut self, entry: &MenuEntry, cx: &mut Context) -> Option<Reply> {
        let key = match entry.action.as_str() {
            ACTION_SSID => keys::SSID,
            ACTION_PSK => keys::PSK,
            _ => return None,
        };
        let current = cx.storage.get_str(key).unwrap_or_default().to_owned();
        cx.get_user_input(Some(&entry.action), &current, Some(&entry.text), Some(64));
        None
    }

    fn on_text(&mut self, event: &Event, cx: &mut Context) -> Option<Reply> {
        match text_of(event)? {
            (ACTION_SSID, value) => cx.storage.set(keys::SSID, Value::from(value)),
            (ACTION_PSK, value) => cx.storage.set(keys::PSK, Value::from(value)),
            _ => {},
        }
        None
    }

    fn back(&mut self, _event: &Event, _cx: &mut Context) -> Option<Reply> {
        Some(Directive::LoadScreen(0).into())
    }
}

/// Where to upload a custom image.
#[derive(Debug, Default)]
pub struct ImageScreen;

impl Screen for ImageScreen {
    fn update(&mut self, cx: &mut Context, _delta_ms: u64) -> Option<Reply> {
        notice(cx, IMAGE_HINT);
        None
    }

    fn back(&mut self, _event: &Event, _cx: &mut Context) -> Option<Reply> {
        Some(Directive::LoadScreen(0).into())
    }
}

/// Badge id, centered.
#[derive(Debug, Default)]
pub struct InfoScreen;

impl Screen for InfoScreen {
    fn update(&mut self, cx: &mut Context, _delta_ms: u64) -> Option<Reply> {
        let id = badge_id(&cx.platform.unique_id());
        let display = cx.display.as_mut();
        let (width, height) = (display.width() as i32, display.height() as i32);

        let size = display.text(&id, 16, 0, TextStyle::wrapped());
        display.fill(Color::Background);
        let x = (width - size.width as i32) / 2;
        let y = (height - size.height as i32) / 2;
        display.text(&id, x.max(0), y.max(0), TextStyle::wrapped());
        display.update();
        None
    }

    fn back(&mut self, _event: &Event, _cx: &mut Context) -> Option<Reply> {
        Some(Directive::LoadScreen(0).into())
    }
}

/// Lowercase hex of the device id, `unknown` if the platform has none.
pub fn badge_id(raw: &[u8]) -> String {
    if raw.is_empty() {
        return "unknown".to_owned();
    }
    raw.iter().fold(String::with_capacity(raw.len() * 2), |mut hex, byte| {
        let _ = write!(hex, "{byte:02x}");
        hex
    })
}

/// Build the settings app.
pub fn build(screen: usize, args: &LaunchArgs) -> Result<App, AppError> {
    App::new(
        SETTINGS_APP,
        1,
        vec![
            Box::new(SettingsScreen),
            Box::new(WifiScreen),
            Box::new(ImageScreen),
            Box::new(InfoScreen),
        ],
        screen,
        args,
    )
}

/// Registry module for the settings app.
pub fn module() -> FnModule {
    FnModule::new(SETTINGS_APP, build)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_id_is_lowercase_hex() {
        assert_eq!(badge_id(&[0xde, 0xad, 0x0b, 0x01]), "dead0b01");
        assert_eq!(badge_id(&[]), "unknown");
    }

    #[test]
    fn menu_order_matches_screen_indices() {
        let actions: Vec<_> =
            SettingsScreen.menu_entries().into_iter().map(|entry| entry.action).collect();
        assert_eq!(actions, [ACTION_INFO, ACTION_WIFI, ACTION_URL, ACTION_NAME, ACTION_IMAGE, ACTION_RESET]);
    }
}
