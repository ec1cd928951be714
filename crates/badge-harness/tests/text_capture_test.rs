//! Settings edits through text capture.

use badge_harness::{InvariantRegistry, KernelSnapshot, Rig};
use badge_kernel::{KeyCode, Mode, Shutdown, StartReason, storage::keys};
use serde_json::json;

/// Main menu, then Settings (the last entry, one wrap up from Name).
const TO_SETTINGS: [KeyCode; 3] = [KeyCode::BTN_B, KeyCode::BTN_UP, KeyCode::BTN_A];

fn to_entry(index: usize) -> Vec<KeyCode> {
    let mut presses = TO_SETTINGS.to_vec();
    presses.extend(std::iter::repeat_n(KeyCode::BTN_DOWN, index));
    presses.push(KeyCode::BTN_A);
    presses
}

#[test]
fn change_name_persists_on_confirm() {
    let (mut kernel, watch) =
        Rig::new().press_all(&to_entry(3)).type_text("Neo").press(KeyCode::BTN_A).build();

    assert_eq!(kernel.start(StartReason::Normal), Shutdown::Interrupted);
    assert_eq!(kernel.context().storage.get_str(keys::NAME), Some("Neo"));
    assert!(watch.display.shows("Set your name"));
    assert!(watch.display.shows("Neo_"));
    assert_eq!(kernel.context().input.mode(), Mode::Default);
    // Back on the settings menu.
    assert!(watch.display.frame_shows("Change name"));
}

#[test]
fn cancel_leaves_setting_untouched() {
    let (mut kernel, _watch) = Rig::new()
        .settings(json!({"NAME": "Trinity"}))
        .press_all(&to_entry(3))
        .type_text("xyz")
        .press(KeyCode::BTN_B)
        .build();

    kernel.start(StartReason::Normal);
    assert_eq!(kernel.context().storage.get_str(keys::NAME), Some("Trinity"));
    // B cancelled the capture instead of leaving the app.
    assert_eq!(kernel.active_app(), Some("settings"));
}

#[test]
fn backspace_edits_initial_value() {
    let (mut kernel, _watch) = Rig::new()
        .settings(json!({"NAME": "Neo"}))
        .press_all(&to_entry(3))
        .press(KeyCode::KEY_BACKSPACE)
        .type_text("d")
        .press(KeyCode::BTN_A)
        .build();

    kernel.start(StartReason::Normal);
    assert_eq!(kernel.context().storage.get_str(keys::NAME), Some("Ned"));
}

#[test]
fn capture_respects_bound() {
    let (mut kernel, _watch) = Rig::new().press_all(&to_entry(5)).type_text("nope").build();

    kernel.start(StartReason::Normal);
    let snapshot = KernelSnapshot::of(&kernel);
    assert_eq!(snapshot.mode, Mode::TextCapture);
    assert_eq!(kernel.context().input.capture().text, "nop");
    InvariantRegistry::standard().assert_all(&snapshot, "during capture");
}

#[test]
fn factory_reset_needs_yes() {
    let (mut kernel, watch) = Rig::new()
        .settings(json!({"NAME": "Neo"}))
        .press_all(&to_entry(5))
        .type_text("nah")
        .press(KeyCode::BTN_A)
        .build();

    kernel.start(StartReason::Normal);
    assert_eq!(watch.resets(), 0);
    assert_eq!(kernel.context().storage.get_str(keys::NAME), Some("Neo"));

    let (mut kernel, watch) = Rig::new()
        .settings(json!({"NAME": "Neo"}))
        .press_all(&to_entry(5))
        .type_text("YES")
        .press(KeyCode::BTN_A)
        .build();

    assert_eq!(kernel.start(StartReason::Normal), Shutdown::Rebooted);
    assert_eq!(watch.resets(), 1);
    assert!(watch.display.shows("Resetting badge..."));
    assert_eq!(kernel.context().storage.get_str(keys::NAME), None);
}

#[test]
fn wifi_credentials_are_edited_on_their_screen() {
    let mut presses = to_entry(1);
    presses.push(KeyCode::BTN_A);
    let (mut kernel, watch) =
        Rig::new().press_all(&presses).type_text(" lab").press(KeyCode::BTN_A).build();

    kernel.start(StartReason::Normal);
    assert_eq!(kernel.context().storage.get_str(keys::SSID), Some("trp-badge lab"));
    assert!(watch.display.frame_shows("PSK"));
}

#[test]
fn backend_setup_opens_url_capture() {
    let (mut kernel, watch) = Rig::new()
        .press_all(&[KeyCode::KEY_BACKSPACE; 3])
        .type_text("next")
        .press(KeyCode::BTN_A)
        .build();

    kernel.start(StartReason::BackendSetup);
    assert!(watch.display.shows("Provisioning server url"));
    assert_eq!(
        kernel.context().storage.get_str(keys::OTA_SERVER),
        Some("https://badge.troopers.de/next")
    );
}

#[test]
fn name_setup_reboots_after_saving() {
    let (mut kernel, watch) = Rig::new().type_text("Neo").press(KeyCode::BTN_A).build();

    assert_eq!(kernel.start(StartReason::NameSetup), Shutdown::Rebooted);
    assert_eq!(kernel.context().storage.get_str(keys::NAME), Some("Neo"));
    assert_eq!(watch.resets(), 1);
}

#[test]
fn keys_after_factory_reset_are_not_handled() {
    let (mut kernel, watch) = Rig::new()
        .press_all(&to_entry(5))
        .type_text("yes")
        .press_all(&[KeyCode::BTN_A, KeyCode::BTN_B, KeyCode::BTN_DOWN])
        .build();

    assert_eq!(kernel.start(StartReason::Normal), Shutdown::Rebooted);
    assert_eq!(watch.resets(), 1);
    // B and DOWN were never delivered.
    assert_eq!(watch.script.pending(), 2);
    assert_eq!(kernel.active_app(), Some("settings"));
    assert_eq!(kernel.bus().listener_count(), 0);
}

#[test]
fn aborted_factory_reset_keeps_running() {
    let (mut kernel, watch) = Rig::new()
        .interrupting_sleeps()
        .press_all(&to_entry(5))
        .type_text("yes")
        .press_all(&[KeyCode::BTN_A, KeyCode::BTN_B])
        .build();

    assert_eq!(kernel.start(StartReason::Normal), Shutdown::Interrupted);
    assert_eq!(watch.resets(), 0);
    // B left the settings app once the reboot was skipped.
    assert_eq!(kernel.active_app(), Some("name"));
}
