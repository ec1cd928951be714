//! In-memory peripheral doubles.
//!
//! Each double keeps its observable state behind an `Rc<RefCell<_>>` so a
//! handle cloned before the double is boxed into the kernel can still be
//! inspected afterwards. The kernel is single-threaded, so nothing here needs
//! to be `Send`.

use std::{
    cell::RefCell,
    collections::{BTreeSet, HashMap, VecDeque},
    rc::Rc,
};

use badge_kernel::{
    error::HardwareError,
    hal::{
        Color, Display, Interrupted, Lights, Method, Network, Platform, Response, Rgb,
        TextExtent, TextStyle,
    },
    input::{EdgeSender, KeyCode, KeyEdge, KeyMatrix},
};
use serde_json::Value;

/// Glyph width assumed when measuring text.
pub const GLYPH_WIDTH: u32 = 8;

/// Everything drawn on a [`RecordingDisplay`].
#[derive(Debug, Clone, Default)]
pub struct DisplayLog {
    /// Every string drawn, in order
    pub texts: Vec<String>,
    /// Strings drawn since the last fill
    pub frame: Vec<String>,
    /// Number of pushes to the panel
    pub updates: usize,
    /// Number of full panel clears
    pub clears: usize,
}

/// Shared view of a [`RecordingDisplay`].
#[derive(Debug, Clone, Default)]
pub struct DisplayHandle(Rc<RefCell<DisplayLog>>);

impl DisplayHandle {
    /// Copy of the log.
    pub fn log(&self) -> DisplayLog {
        self.0.borrow().clone()
    }

    /// Whether any drawn string contains `needle`.
    pub fn shows(&self, needle: &str) -> bool {
        self.0.borrow().texts.iter().any(|text| text.contains(needle))
    }

    /// Whether the current frame contains `needle`.
    pub fn frame_shows(&self, needle: &str) -> bool {
        self.0.borrow().frame.iter().any(|text| text.contains(needle))
    }

    /// Strings drawn since the last fill.
    pub fn frame(&self) -> Vec<String> {
        self.0.borrow().frame.clone()
    }

    /// Number of pushes to the panel.
    pub fn updates(&self) -> usize {
        self.0.borrow().updates
    }
}

/// Display that records text instead of rasterizing it.
pub struct RecordingDisplay {
    log: DisplayHandle,
    width: u32,
    height: u32,
    line_height: u32,
    panic_on: Option<String>,
}

impl RecordingDisplay {
    /// Panel of the given size with 10 pixel rows.
    pub fn new(width: u32, height: u32) -> Self {
        Self { log: DisplayHandle::default(), width, height, line_height: 10, panic_on: None }
    }

    /// Panic whenever text containing `needle` is drawn.
    #[must_use]
    pub fn panicking_on(mut self, needle: impl Into<String>) -> Self {
        self.panic_on = Some(needle.into());
        self
    }

    /// Shared view of the log.
    pub fn handle(&self) -> DisplayHandle {
        self.log.clone()
    }

    fn measure(&self, text: &str) -> TextExtent {
        let widest = text.lines().map(|line| line.chars().count()).max().unwrap_or(0) as u32;
        let rows = text.lines().count().max(1) as u32;
        TextExtent { width: (widest * GLYPH_WIDTH).min(self.width), height: rows * self.line_height }
    }
}

impl Display for RecordingDisplay {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn line_height(&self) -> u32 {
        self.line_height
    }

    fn clear(&mut self) {
        let mut log = self.log.0.borrow_mut();
        log.clears += 1;
        log.frame.clear();
    }

    fn reset(&mut self) {}

    fn fill(&mut self, color: Color) {
        if color == Color::Background {
            self.log.0.borrow_mut().frame.clear();
        }
    }

    fn fill_rect(&mut self, _x: i32, _y: i32, _width: u32, _height: u32, _color: Color) {}

    fn hline(&mut self, _x: i32, _y: i32, _width: u32) {}

    #[allow(clippy::panic, reason = "Injected fault for crash-path tests")]
    fn text(&mut self, text: &str, _x: i32, _y: i32, _style: TextStyle) -> TextExtent {
        if let Some(needle) = &self.panic_on
            && text.contains(needle.as_str())
        {
            panic!("display fault drawing {text:?}");
        }
        let mut log = self.log.0.borrow_mut();
        log.texts.push(text.to_owned());
        log.frame.push(text.to_owned());
        drop(log);
        self.measure(text)
    }

    fn update(&mut self) {
        self.log.0.borrow_mut().updates += 1;
    }
}

/// Shared view of [`MemoryLights`].
#[derive(Debug, Clone, Default)]
pub struct LightsHandle(Rc<RefCell<Vec<Rgb>>>);

impl LightsHandle {
    /// Current color of every light.
    pub fn colors(&self) -> Vec<Rgb> {
        self.0.borrow().clone()
    }

    /// Current color of one light.
    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.0.borrow().get(index).copied()
    }
}

/// Lights kept as a color array.
pub struct MemoryLights {
    state: LightsHandle,
}

impl MemoryLights {
    /// `count` lights, all off.
    pub fn new(count: usize) -> Self {
        Self { state: LightsHandle(Rc::new(RefCell::new(vec![Rgb::OFF; count]))) }
    }

    /// Shared view of the colors.
    pub fn handle(&self) -> LightsHandle {
        self.state.clone()
    }
}

impl Lights for MemoryLights {
    fn count(&self) -> usize {
        self.state.0.borrow().len()
    }

    fn set(&mut self, index: usize, color: Rgb) {
        if let Some(slot) = self.state.0.borrow_mut().get_mut(index) {
            *slot = color;
        }
    }
}

/// One step of a key script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Beat {
    /// Deliver these edges.
    Keys(Vec<KeyEdge>),
    /// Let one idle or frame pass without input.
    Quiet,
}

#[derive(Debug, Default)]
struct ScriptState {
    sender: Option<EdgeSender>,
    beats: VecDeque<Beat>,
    held: BTreeSet<u8>,
    delivered: usize,
    closed: bool,
}

/// Key input script shared by [`ScriptedKeys`] and [`ScriptedPlatform`].
#[derive(Debug, Clone, Default)]
pub struct KeyScript(Rc<RefCell<ScriptState>>);

impl KeyScript {
    /// Empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a beat.
    pub fn push(&self, beat: Beat) {
        self.0.borrow_mut().beats.push_back(beat);
    }

    /// Append a full press and release of `code`.
    pub fn press(&self, code: KeyCode) {
        self.push(Beat::Keys(vec![KeyEdge::down(code), KeyEdge::up(code)]));
    }

    /// Append a press and release of each code, one beat per key.
    pub fn press_all(&self, codes: &[KeyCode]) {
        for &code in codes {
            self.press(code);
        }
    }

    /// Append `frames` quiet beats.
    pub fn quiet(&self, frames: usize) {
        for _ in 0..frames {
            self.push(Beat::Quiet);
        }
    }

    /// Report `code` as held from the start (boot key combos).
    pub fn hold(&self, code: KeyCode) {
        self.0.borrow_mut().held.insert(code.0);
    }

    /// Beats not yet delivered.
    pub fn pending(&self) -> usize {
        self.0.borrow().beats.len()
    }

    /// Beats delivered so far.
    pub fn delivered(&self) -> usize {
        self.0.borrow().delivered
    }

    /// Whether the kernel released the controllers.
    pub fn is_closed(&self) -> bool {
        self.0.borrow().closed
    }

    /// Deliver the next beat. `false` once the script is exhausted.
    fn step(&self) -> bool {
        let mut state = self.0.borrow_mut();
        let Some(beat) = state.beats.pop_front() else {
            return false;
        };
        state.delivered += 1;
        if let (Beat::Keys(edges), Some(sender)) = (beat, state.sender.as_ref()) {
            for edge in edges {
                if !sender.send(edge) {
                    tracing::warn!(?edge, "scripted edge dropped");
                }
            }
        }
        true
    }
}

/// Key-matrix controller fed from a [`KeyScript`].
pub struct ScriptedKeys {
    name: String,
    script: KeyScript,
}

impl ScriptedKeys {
    /// Controller reporting the edges of `script`.
    pub fn new(name: impl Into<String>, script: KeyScript) -> Self {
        Self { name: name.into(), script }
    }
}

impl KeyMatrix for ScriptedKeys {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, edges: EdgeSender) -> Result<(), HardwareError> {
        self.script.0.borrow_mut().sender = Some(edges);
        Ok(())
    }

    fn is_pressed(&self, code: KeyCode) -> bool {
        self.script.0.borrow().held.contains(&code.0)
    }

    fn close(&mut self) {
        let mut state = self.script.0.borrow_mut();
        state.closed = true;
        state.sender = None;
    }
}

/// Controller that never comes up.
pub struct FailingMatrix {
    name: String,
}

impl FailingMatrix {
    /// Controller named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl KeyMatrix for FailingMatrix {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, _edges: EdgeSender) -> Result<(), HardwareError> {
        Err(HardwareError::Init { controller: self.name.clone(), reason: "no ack".into() })
    }

    fn is_pressed(&self, _code: KeyCode) -> bool {
        false
    }
}

/// Platform that advances the script on every suspension point.
///
/// `idle` and `poll_interrupt` each deliver one beat and advance the clock
/// by one frame; both report an interrupt once the script is exhausted.
pub struct ScriptedPlatform {
    script: KeyScript,
    now: u64,
    frame_ms: u64,
    interrupt_sleeps: bool,
    unique_id: Vec<u8>,
    resets: Rc<RefCell<u32>>,
}

impl ScriptedPlatform {
    /// Platform driving `script` at 50 ms per frame.
    pub fn new(script: KeyScript) -> Self {
        Self {
            script,
            now: 0,
            frame_ms: 50,
            interrupt_sleeps: false,
            unique_id: vec![0x24, 0x0a, 0xc4, 0x00, 0x01, 0x02],
            resets: Rc::default(),
        }
    }

    /// Interrupt every `sleep_ms`, which aborts safe resets.
    #[must_use]
    pub fn interrupting_sleeps(mut self) -> Self {
        self.interrupt_sleeps = true;
        self
    }

    /// Counter of hard resets.
    pub fn resets(&self) -> Rc<RefCell<u32>> {
        Rc::clone(&self.resets)
    }

    fn advance(&mut self) -> Result<(), Interrupted> {
        self.now += self.frame_ms;
        if self.script.step() { Ok(()) } else { Err(Interrupted) }
    }
}

impl Platform for ScriptedPlatform {
    fn idle(&mut self) -> Result<(), Interrupted> {
        self.advance()
    }

    fn poll_interrupt(&mut self) -> Result<(), Interrupted> {
        self.advance()
    }

    fn unique_id(&self) -> Vec<u8> {
        self.unique_id.clone()
    }

    fn ticks_ms(&self) -> u64 {
        self.now
    }

    fn sleep_ms(&mut self, ms: u64) -> Result<(), Interrupted> {
        self.now += ms;
        if self.interrupt_sleeps { Err(Interrupted) } else { Ok(()) }
    }

    fn reset(&mut self) {
        *self.resets.borrow_mut() += 1;
    }
}

/// Network answering from a table of canned responses.
#[derive(Default)]
pub struct FakeNetwork {
    reachable: bool,
    connected: bool,
    responses: HashMap<String, Response>,
    requests: Rc<RefCell<Vec<(Method, String)>>>,
}

impl FakeNetwork {
    /// Network whose access point never answers.
    pub fn offline() -> Self {
        Self::default()
    }

    /// Network that connects immediately.
    pub fn online() -> Self {
        Self { reachable: true, ..Self::default() }
    }

    /// Answer requests to `path` with `status` and `body`.
    #[must_use]
    pub fn answering(mut self, path: &str, status: u16, body: Value) -> Self {
        self.responses.insert(path.to_owned(), Response { status, body });
        self
    }

    /// Log of issued requests.
    pub fn requests(&self) -> Rc<RefCell<Vec<(Method, String)>>> {
        Rc::clone(&self.requests)
    }
}

impl Network for FakeNetwork {
    fn connect(&mut self, _ssid: &str, _psk: &str) {
        self.connected = self.reachable;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn request(&mut self, method: Method, path: &str, _body: Option<&Value>) -> Option<Response> {
        self.requests.borrow_mut().push((method, path.to_owned()));
        if !self.connected {
            return None;
        }
        self.responses.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use badge_kernel::input::edge_queue;

    use super::*;

    #[test]
    fn script_delivers_one_beat_per_idle() {
        let script = KeyScript::new();
        script.press(KeyCode::BTN_A);
        script.quiet(1);

        let (tx, mut rx) = edge_queue(8);
        let mut keys = ScriptedKeys::new("left", script.clone());
        keys.init(tx).unwrap();
        let mut platform = ScriptedPlatform::new(script.clone());

        platform.idle().unwrap();
        assert_eq!(rx.try_next(), Some(KeyEdge::down(KeyCode::BTN_A)));
        assert_eq!(rx.try_next(), Some(KeyEdge::up(KeyCode::BTN_A)));

        platform.idle().unwrap();
        assert_eq!(rx.try_next(), None);
        assert_eq!(platform.idle(), Err(Interrupted));
        assert_eq!(script.delivered(), 2);
    }

    #[test]
    fn display_frame_resets_on_fill() {
        let mut display = RecordingDisplay::new(128, 296);
        let handle = display.handle();
        display.text("old", 0, 0, TextStyle::plain());
        display.fill(Color::Background);
        let extent = display.text("new\nline", 0, 0, TextStyle::plain());

        assert_eq!(handle.frame(), ["new\nline"]);
        assert!(handle.shows("old"));
        assert_eq!(extent, TextExtent { width: 32, height: 20 });
    }

    #[test]
    fn offline_network_refuses_requests() {
        let mut network = FakeNetwork::offline().answering("/auth", 200, Value::Null);
        network.connect("ssid", "psk");
        assert!(!network.is_connected());
        assert_eq!(network.request(Method::Get, "/auth", None), None);
        assert_eq!(network.requests().borrow().len(), 1);
    }
}
