//! Kernel test rig.
//!
//! [`Rig`] assembles a [`Kernel`] from the doubles in [`crate::doubles`] and
//! hands back a [`Watch`] with the handles needed to observe it.
//!
//! ```ignore
//! let (mut kernel, watch) = Rig::new().press(KeyCode::BTN_B).build();
//! kernel.start(StartReason::Normal);
//! assert_eq!(kernel.active_app(), Some("main"));
//! ```

use std::{cell::RefCell, rc::Rc};

use badge_kernel::{
    AppRegistry, Kernel, KernelConfig, MemoryStorage, Peripherals,
    hal::Method,
    input::{KeyCode, KeyEdge, KeyMatrix},
};
use serde_json::Value;

use crate::doubles::{
    Beat, DisplayHandle, FailingMatrix, FakeNetwork, KeyScript, LightsHandle, MemoryLights,
    RecordingDisplay, ScriptedKeys, ScriptedPlatform,
};

/// Number of indicator lights on the badge.
pub const LIGHT_COUNT: usize = 6;

/// Builder for a kernel wired to doubles.
pub struct Rig {
    registry: AppRegistry,
    storage: MemoryStorage,
    config: KernelConfig,
    network: FakeNetwork,
    display: RecordingDisplay,
    script: KeyScript,
    failing_controllers: usize,
    interrupt_sleeps: bool,
}

impl Default for Rig {
    fn default() -> Self {
        Self::new()
    }
}

impl Rig {
    /// Rig with the built-in apps, default settings and an offline network.
    pub fn new() -> Self {
        Self::with_registry(badge_apps::builtin_registry())
    }

    /// Rig running the apps in `registry`.
    pub fn with_registry(registry: AppRegistry) -> Self {
        Self {
            registry,
            storage: MemoryStorage::new(),
            config: KernelConfig::default(),
            network: FakeNetwork::offline(),
            display: RecordingDisplay::new(128, 296),
            script: KeyScript::new(),
            failing_controllers: 0,
            interrupt_sleeps: false,
        }
    }

    /// Overlay `initial` onto the default settings.
    #[must_use]
    pub fn settings(mut self, initial: Value) -> Self {
        self.storage = MemoryStorage::with(initial);
        self
    }

    /// Use `config` instead of the defaults.
    #[must_use]
    pub fn config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `network` instead of an offline one.
    #[must_use]
    pub fn network(mut self, network: FakeNetwork) -> Self {
        self.network = network;
        self
    }

    /// Use `display` instead of the default panel.
    #[must_use]
    pub fn display(mut self, display: RecordingDisplay) -> Self {
        self.display = display;
        self
    }

    /// Attach a controller that fails to initialize after the scripted one.
    #[must_use]
    pub fn failing_controller(mut self) -> Self {
        self.failing_controllers += 1;
        self
    }

    /// Interrupt every reboot delay.
    #[must_use]
    pub fn interrupting_sleeps(mut self) -> Self {
        self.interrupt_sleeps = true;
        self
    }

    /// Script a press and release.
    #[must_use]
    pub fn press(self, code: KeyCode) -> Self {
        self.script.press(code);
        self
    }

    /// Script presses of each code in turn.
    #[must_use]
    pub fn press_all(self, codes: &[KeyCode]) -> Self {
        self.script.press_all(codes);
        self
    }

    /// Script idle beats.
    #[must_use]
    pub fn quiet(self, frames: usize) -> Self {
        self.script.quiet(frames);
        self
    }

    /// Hold `code` from boot.
    #[must_use]
    pub fn hold(self, code: KeyCode) -> Self {
        self.script.hold(code);
        self
    }

    /// Script typing `text` on the keyboard. Uppercase letters are typed
    /// with Shift; characters without a key are skipped.
    #[must_use]
    pub fn type_text(self, text: &str) -> Self {
        for ch in text.chars() {
            let Some(code) = key_for(ch) else {
                tracing::warn!(%ch, "no key for character, skipping");
                continue;
            };
            if ch.is_uppercase() {
                self.script.push(Beat::Keys(vec![
                    KeyEdge::down(KeyCode::KEY_SHIFT),
                    KeyEdge::down(code),
                    KeyEdge::up(code),
                    KeyEdge::up(KeyCode::KEY_SHIFT),
                ]));
            } else {
                self.script.press(code);
            }
        }
        self
    }

    /// Assemble the kernel.
    pub fn build(self) -> (Kernel, Watch) {
        let lights = MemoryLights::new(LIGHT_COUNT);
        let mut platform = ScriptedPlatform::new(self.script.clone());
        if self.interrupt_sleeps {
            platform = platform.interrupting_sleeps();
        }

        let watch = Watch {
            display: self.display.handle(),
            lights: lights.handle(),
            script: self.script.clone(),
            resets: platform.resets(),
            requests: self.network.requests(),
        };

        let mut controllers: Vec<Box<dyn KeyMatrix>> =
            vec![Box::new(ScriptedKeys::new("keys", self.script))];
        for index in 0..self.failing_controllers {
            controllers.push(Box::new(FailingMatrix::new(format!("expander-{index}"))));
        }

        let peripherals = Peripherals {
            display: Box::new(self.display),
            lights: Box::new(lights),
            storage: Box::new(self.storage),
            network: Box::new(self.network),
            platform: Box::new(platform),
            controllers,
        };
        (Kernel::new(peripherals, self.registry, self.config), watch)
    }
}

fn key_for(ch: char) -> Option<KeyCode> {
    match ch {
        ' ' => Some(KeyCode::KEY_SPACE),
        _ if ch.is_ascii_alphabetic() => KeyCode::from_name(&ch.to_ascii_lowercase().to_string()),
        _ => None,
    }
}

/// Handles for observing a rig-built kernel.
pub struct Watch {
    /// Drawn text
    pub display: DisplayHandle,
    /// Light colors
    pub lights: LightsHandle,
    /// Key script, for beats left over after a run
    pub script: KeyScript,
    /// Hard reset counter
    pub resets: Rc<RefCell<u32>>,
    /// Backend requests issued
    pub requests: Rc<RefCell<Vec<(Method, String)>>>,
}

impl Watch {
    /// Number of hard resets requested.
    pub fn resets(&self) -> u32 {
        *self.resets.borrow()
    }

    /// Paths of the backend requests issued.
    pub fn request_paths(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|(_, path)| path.clone()).collect()
    }
}
