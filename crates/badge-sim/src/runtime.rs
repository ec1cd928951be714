//! Host peripherals and kernel assembly.
//!
//! Key input comes from a [`Script`], played back one [`Beat`] per idle or
//! frame. In interactive mode the script is topped up from a reader (stdin)
//! one command line at a time, so every line typed advances the badge. The
//! run ends when the input runs dry.

use std::{
    cell::RefCell,
    collections::BTreeSet,
    fs,
    io::{BufRead, Write},
    path::{Path, PathBuf},
    rc::Rc,
    thread,
    time::Duration,
};

use badge_kernel::{
    FileStorage, Kernel, KernelConfig, MemoryStorage, Peripherals, Shutdown, StartReason, Storage,
    error::HardwareError,
    hal::{Interrupted, Method, Network, Platform, Response},
    input::{Direction, EdgeSender, KeyCode, KeyMatrix},
};
use serde_json::Value;
use thiserror::Error;

use crate::{
    script::{Beat, Script, ScriptError},
    terminal::{LogLights, TextDisplay},
};

/// Panel size in pixels.
pub const PANEL: (u32, u32) = (128, 296);

/// Number of indicator lights.
pub const LIGHT_COUNT: usize = 6;

/// Virtual time that passes per beat.
pub const FRAME_MS: u64 = 50;

/// Device id reported by the simulator.
pub const SIM_ID: [u8; 6] = [0x5e, 0x11, 0xba, 0xd9, 0x00, 0x01];

/// Simulator setup errors.
#[derive(Debug, Error)]
pub enum SimError {
    /// Config file could not be read.
    #[error("cannot read config {path}: {source}")]
    ReadConfig {
        /// Config path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config file is not a valid kernel configuration.
    #[error("invalid config {path}: {source}")]
    ParseConfig {
        /// Config path
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },

    /// Key script is invalid.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// Held key name not recognized.
    #[error("unknown key '{0}'")]
    UnknownKey(String),
}

/// Load a kernel configuration file.
pub fn load_config(path: &Path) -> Result<KernelConfig, SimError> {
    let raw = fs::read(path)
        .map_err(|source| SimError::ReadConfig { path: path.to_owned(), source })?;
    serde_json::from_slice(&raw)
        .map_err(|source| SimError::ParseConfig { path: path.to_owned(), source })
}

/// Resolve key names for keys held at boot.
pub fn held_keys(names: &[String]) -> Result<Vec<KeyCode>, SimError> {
    names
        .iter()
        .map(|name| KeyCode::from_name(name).ok_or_else(|| SimError::UnknownKey(name.clone())))
        .collect()
}

struct Playback {
    script: Script,
    input: Option<Box<dyn BufRead>>,
    sender: Option<EdgeSender>,
    held: BTreeSet<KeyCode>,
}

impl Playback {
    fn next_beat(&mut self) -> Option<Beat> {
        loop {
            if let Some(beat) = self.script.next_beat() {
                return Some(beat);
            }
            let input = self.input.as_mut()?;
            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) | Err(_) => {
                    self.input = None;
                    return None;
                },
                Ok(_) => match Script::parse(&line) {
                    Ok(more) if more.is_empty() => return Some(Beat::Quiet),
                    Ok(more) => self.script = more,
                    Err(error) => tracing::warn!(%error, "ignoring command"),
                },
            }
        }
    }

    /// Play one beat. `false` once input is exhausted.
    fn step(&mut self) -> bool {
        let Some(beat) = self.next_beat() else { return false };
        if let Beat::Keys(edges) = beat {
            for edge in edges {
                match edge.direction {
                    Direction::Down => self.held.insert(edge.code),
                    Direction::Up => self.held.remove(&edge.code),
                };
                if let Some(sender) = &self.sender {
                    sender.send(edge);
                }
            }
        }
        true
    }
}

/// Shared handle on key playback.
#[derive(Clone)]
pub struct KeySource(Rc<RefCell<Playback>>);

impl KeySource {
    /// Play `script`, then stop.
    pub fn scripted(script: Script) -> Self {
        Self::new(script, None)
    }

    /// Play commands read line by line from `input`.
    pub fn interactive(input: Box<dyn BufRead>) -> Self {
        Self::new(Script::default(), Some(input))
    }

    fn new(script: Script, input: Option<Box<dyn BufRead>>) -> Self {
        Self(Rc::new(RefCell::new(Playback { script, input, sender: None, held: BTreeSet::new() })))
    }

    /// Hold `code` from boot.
    pub fn hold(&self, code: KeyCode) {
        self.0.borrow_mut().held.insert(code);
    }

    fn step(&self) -> bool {
        self.0.borrow_mut().step()
    }
}

/// Key matrix fed by a [`KeySource`].
pub struct SimKeys {
    source: KeySource,
}

impl SimKeys {
    /// Controller reading from `source`.
    pub fn new(source: KeySource) -> Self {
        Self { source }
    }
}

impl KeyMatrix for SimKeys {
    fn name(&self) -> &str {
        "sim"
    }

    fn init(&mut self, edges: EdgeSender) -> Result<(), HardwareError> {
        self.source.0.borrow_mut().sender = Some(edges);
        Ok(())
    }

    fn is_pressed(&self, code: KeyCode) -> bool {
        self.source.0.borrow().held.contains(&code)
    }

    fn close(&mut self) {
        self.source.0.borrow_mut().sender = None;
    }
}

/// Virtual clock driven by key playback.
pub struct SimPlatform {
    source: KeySource,
    clock_ms: u64,
    frame: Duration,
}

impl SimPlatform {
    /// Platform advancing `source`, pausing `frame` of real time per beat.
    pub fn new(source: KeySource, frame: Duration) -> Self {
        Self { source, clock_ms: 0, frame }
    }

    fn beat(&mut self) -> Result<(), Interrupted> {
        if !self.frame.is_zero() {
            thread::sleep(self.frame);
        }
        self.clock_ms += FRAME_MS;
        if self.source.step() { Ok(()) } else { Err(Interrupted) }
    }
}

impl Platform for SimPlatform {
    fn idle(&mut self) -> Result<(), Interrupted> {
        self.beat()
    }

    fn poll_interrupt(&mut self) -> Result<(), Interrupted> {
        self.beat()
    }

    fn unique_id(&self) -> Vec<u8> {
        SIM_ID.to_vec()
    }

    fn ticks_ms(&self) -> u64 {
        self.clock_ms
    }

    fn sleep_ms(&mut self, ms: u64) -> Result<(), Interrupted> {
        self.clock_ms += ms;
        Ok(())
    }

    fn reset(&mut self) {
        tracing::info!("reset requested");
    }
}

/// Network that never connects.
#[derive(Debug, Default)]
pub struct OfflineNetwork;

impl Network for OfflineNetwork {
    fn connect(&mut self, ssid: &str, _psk: &str) {
        tracing::debug!(ssid, "no radio, staying offline");
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn disconnect(&mut self) {}

    fn request(&mut self, method: Method, path: &str, _body: Option<&Value>) -> Option<Response> {
        tracing::debug!(?method, path, "offline, dropping request");
        None
    }
}

/// Simulator run options.
pub struct SimOptions {
    /// Boot reason
    pub reason: StartReason,
    /// Kernel configuration
    pub config: KernelConfig,
    /// Settings file; in-memory defaults when unset
    pub settings: Option<PathBuf>,
    /// Key input
    pub keys: KeySource,
    /// Real time per beat
    pub frame: Duration,
}

/// Build the kernel and run it until it stops.
pub fn run<W: Write + 'static>(options: SimOptions, out: W) -> Shutdown {
    let SimOptions { mut reason, config, settings, keys, frame } = options;

    let storage: Box<dyn Storage> = match settings {
        Some(path) => Box::new(FileStorage::open(path)),
        None => Box::new(MemoryStorage::new()),
    };
    let peripherals = Peripherals {
        display: Box::new(TextDisplay::new(out, PANEL.0, PANEL.1)),
        lights: Box::new(LogLights::new(LIGHT_COUNT)),
        storage,
        network: Box::new(OfflineNetwork),
        platform: Box::new(SimPlatform::new(keys.clone(), frame)),
        controllers: vec![Box::new(SimKeys::new(keys))],
    };
    let mut kernel = Kernel::new(peripherals, badge_apps::builtin_registry(), config);

    if reason == StartReason::Normal && kernel.boot_special() {
        reason = StartReason::Special;
    }
    if kernel.skip_checks() {
        tracing::info!("START held, skipping startup checks");
    }
    kernel.start(reason)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    fn options(keys: KeySource) -> SimOptions {
        SimOptions {
            reason: StartReason::Normal,
            config: KernelConfig::default(),
            settings: None,
            keys,
            frame: Duration::ZERO,
        }
    }

    #[test]
    fn script_opens_the_menu() {
        let out = Shared::default();
        let script = Script::parse("wait\npress console.b\nwait").unwrap();
        let shutdown = run(options(KeySource::scripted(script)), out.clone());

        assert_eq!(shutdown, Shutdown::Interrupted);
        assert!(out.text().contains("> Name"));
    }

    #[test]
    fn interactive_lines_drive_the_badge() {
        let out = Shared::default();
        let input = Cursor::new(b"press b\n\nbogus\npress console.b\n".to_vec());
        let shutdown = run(options(KeySource::interactive(Box::new(input))), out.clone());

        assert_eq!(shutdown, Shutdown::Interrupted);
        assert!(out.text().contains("Settings"));
    }

    #[test]
    fn held_b_boots_the_self_test() {
        let out = Shared::default();
        let keys = KeySource::scripted(Script::default());
        keys.hold(KeyCode::BTN_B);
        run(options(keys), out.clone());
        assert!(out.text().contains("Press console.start"));
    }

    #[test]
    fn held_key_names_resolve() {
        let keys = held_keys(&["console.start".into(), "b".into()]).unwrap();
        assert_eq!(keys, [KeyCode::BTN_START, KeyCode::KEY_B]);
        assert!(matches!(held_keys(&["nope".into()]), Err(SimError::UnknownKey(_))));
    }

    #[test]
    fn settings_file_persists_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let script = Script::parse(
            "press console.b\npress console.up\npress console.a\n\
             press console.down console.down console.down\npress console.a\n\
             type Ada\npress console.a\nwait",
        )
        .unwrap();
        let mut options = options(KeySource::scripted(script));
        options.settings = Some(path.clone());
        run(options, Shared::default());

        let saved: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(saved["NAME"], "Ada");
    }
}
