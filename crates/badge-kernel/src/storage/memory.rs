use super::{Settings, Storage};

/// Settings kept only in memory.
///
/// Same contract as [`super::FileStorage`] minus persistence. `wipe` restores
/// the defaults immediately.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    settings: Settings,
}

impl MemoryStorage {
    /// Storage holding the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage holding the defaults overlaid with `initial`.
    ///
    /// Non-object values are ignored.
    pub fn with(initial: serde_json::Value) -> Self {
        let mut settings = Settings::default();
        if let Err(error) = settings.merge(initial) {
            tracing::warn!(%error, "ignoring initial settings");
        }
        Self { settings }
    }
}

impl Storage for MemoryStorage {
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn update(&mut self, change: &mut dyn FnMut(&mut Settings)) {
        change(&mut self.settings);
    }

    fn wipe(&mut self) {
        self.settings = Settings::default();
    }
}
