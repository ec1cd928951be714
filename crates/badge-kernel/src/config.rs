//! Kernel configuration.

use serde::{Deserialize, Serialize};

use crate::input::DEFAULT_EDGE_CAPACITY;

/// Static kernel configuration.
///
/// Every field has a default, so a partial (or empty) configuration file is
/// valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// App loaded on a normal boot and by `LoadApp` without a name
    pub default_app: String,
    /// App loaded when waking from sleep
    pub menu_app: String,
    /// App hosting the WiFi, backend and name setup screens
    pub settings_app: String,
    /// App loaded for the registration boot reason
    pub registration_app: String,
    /// Hardware self-test app
    pub special_app: String,
    /// Capacity of the key edge queue
    pub edge_queue_capacity: usize,
    /// How long `wifi()` waits for a connection
    pub wifi_timeout_ms: u64,
    /// Grace period before a safe reboot, interruptible from the host
    pub safe_reset_delay_ms: u64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            default_app: "name".into(),
            menu_app: "main".into(),
            settings_app: "settings".into(),
            registration_app: "registration".into(),
            special_app: "special".into(),
            edge_queue_capacity: DEFAULT_EDGE_CAPACITY,
            wifi_timeout_ms: 10_000,
            safe_reset_delay_ms: 1_000,
        }
    }
}
