//! Input decoder state machine.
//!
//! Pure logic: [`InputDecoder::handle`] turns one key edge into a list of
//! [`InputEffect`]s (events to dispatch, light updates) that the runtime then
//! executes. No I/O happens here, so every path is
//! unit-testable.
//!
//! The decoder runs in one of two [`Mode`]s:
//!
//! - [`Mode::Default`]: every known key edge becomes `input.<dir>.<name>`.
//! - [`Mode::TextCapture`]: key-downs are ignored, console A confirms, console
//!   B cancels, every other key-up becomes `input.char`.
//!
//! Secret-sequence detectors watch every key-up that was not consumed by a
//! confirm or cancel, in both modes.

use serde_json::{Map, Value};

use crate::{
    error::HardwareError,
    event::Event,
    input::{
        keys::{Direction, KeyCode, Modifier, Modifiers},
        matrix::{EdgeReceiver, EdgeSender, KeyEdge, KeyMatrix, edge_queue},
        sequence::{self, SecretSequence},
    },
};

/// Decoder mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Per-key events
    #[default]
    Default,
    /// Keystrokes edit a text buffer
    TextCapture,
}

/// Text-capture session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextCapture {
    /// Opaque reference echoed back in the completion event
    pub context: Option<String>,
    /// Prompt drawn above the buffer
    pub title: Option<String>,
    /// Buffer contents
    pub text: String,
    /// Maximum length in characters. `None` is unbounded.
    pub max_len: Option<usize>,
}

impl TextCapture {
    fn clamp(&mut self) {
        if let Some(max) = self.max_len
            && let Some((byte_index, _)) = self.text.char_indices().nth(max)
        {
            self.text.truncate(byte_index);
        }
    }
}

/// Side effect requested by the decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEffect {
    /// Dispatch this event on the bus.
    Emit(Event),
    /// Show the held modifiers on the indicator lights.
    Lights(Modifiers),
}

/// Controller that failed to initialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerFault {
    /// Position in the attach order, also the light flagged red
    pub index: usize,
    /// Why it failed
    pub error: HardwareError,
}

/// Decodes key edges into semantic input events.
pub struct InputDecoder {
    mode: Mode,
    modifiers: Modifiers,
    capture: TextCapture,
    sequences: Vec<SecretSequence>,
    controllers: Vec<Box<dyn KeyMatrix>>,
    edges_tx: EdgeSender,
    edges_rx: EdgeReceiver,
}

impl InputDecoder {
    /// Decoder with the built-in secret sequences and an edge queue of the
    /// given capacity.
    pub fn new(edge_capacity: usize) -> Self {
        let (edges_tx, edges_rx) = edge_queue(edge_capacity);
        Self {
            mode: Mode::Default,
            modifiers: Modifiers::default(),
            capture: TextCapture::default(),
            sequences: sequence::builtin(),
            controllers: Vec::new(),
            edges_tx,
            edges_rx,
        }
    }

    /// Initialize controllers and start receiving their edges.
    ///
    /// A failing controller is logged and reported but does not stop the
    /// others from being attached.
    pub fn attach(&mut self, controllers: Vec<Box<dyn KeyMatrix>>) -> Vec<ControllerFault> {
        let mut faults = Vec::new();
        for (index, mut controller) in controllers.into_iter().enumerate() {
            match controller.init(self.edges_tx.clone()) {
                Ok(()) => {
                    tracing::debug!(controller = controller.name(), "key matrix ready");
                },
                Err(error) => {
                    tracing::error!(controller = controller.name(), %error, "I2C Expander {index} Error");
                    faults.push(ControllerFault { index, error });
                },
            }
            self.controllers.push(controller);
        }
        faults
    }

    /// Producer handle for injecting edges.
    pub fn edge_sender(&self) -> EdgeSender {
        self.edges_tx.clone()
    }

    /// Next queued edge, if any.
    pub fn next_edge(&mut self) -> Option<KeyEdge> {
        self.edges_rx.try_next()
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch mode. Changing mode releases all modifiers.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            self.modifiers = Modifiers::default();
        }
        self.mode = mode;
    }

    /// Held modifiers.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Text-capture state.
    pub fn capture(&self) -> &TextCapture {
        &self.capture
    }

    /// Progress of a named detector.
    pub fn sequence_progress(&self, name: &str) -> Option<usize> {
        self.sequences.iter().find(|sequence| sequence.name() == name).map(SecretSequence::progress)
    }

    /// Whether the last key-up advanced the named detector.
    ///
    /// Detectors advance before the key's own event is dispatched, so a
    /// listener can use this to leave keys alone that belong to a sequence
    /// being entered.
    pub fn sequence_consumed(&self, name: &str) -> bool {
        self.sequences
            .iter()
            .find(|sequence| sequence.name() == name)
            .is_some_and(SecretSequence::consumed_last)
    }

    /// Whether any attached controller reports `code` as held.
    pub fn is_pressed(&self, code: KeyCode) -> bool {
        self.controllers.iter().any(|controller| controller.is_pressed(code))
    }

    /// Stop all controllers.
    pub fn close(&mut self) {
        for controller in &mut self.controllers {
            controller.close();
        }
    }

    /// Enter text capture with an initial buffer.
    pub fn begin_text_capture(
        &mut self,
        context: Option<String>,
        initial: &str,
        title: Option<String>,
        max_len: Option<usize>,
    ) {
        self.capture = TextCapture { context, title, text: initial.to_owned(), max_len };
        self.capture.clamp();
        self.set_mode(Mode::TextCapture);
    }

    /// Apply an `input.char` event to the buffer.
    ///
    /// Returns `true` if the view needs a refresh. Stray character events
    /// outside text capture are ignored.
    pub fn edit_text(&mut self, event: &Event) -> bool {
        if self.mode != Mode::TextCapture {
            return false;
        }
        let Some(code) = event.code().map(KeyCode) else {
            return false;
        };

        if code == KeyCode::KEY_BACKSPACE {
            self.capture.text.pop();
        } else if code.is_printable()
            && let Some(key) = event.get_str("key")
        {
            self.capture.text.push_str(key);
        }
        self.capture.clamp();
        true
    }

    /// Decode one key edge.
    pub fn handle(&mut self, edge: KeyEdge) -> Vec<InputEffect> {
        let mut effects = Vec::new();
        let KeyEdge { direction, code } = edge;

        if let Some(modifier) = code.modifier() {
            self.modifiers.set(modifier, direction == Direction::Down);
            // Releasing Shift or Shield while Fn is held latches them.
            if modifier != Modifier::Fn && direction == Direction::Up && self.modifiers.function {
                self.modifiers.set(modifier, true);
            }
            if self.mode == Mode::TextCapture {
                effects.push(InputEffect::Lights(self.modifiers));
            }
        }

        let Some(name) = code.semantic_name() else {
            tracing::trace!(code = %code, "ignoring unknown key code");
            return effects;
        };

        match self.mode {
            Mode::TextCapture => {
                if direction == Direction::Down {
                    return effects;
                }
                if code == KeyCode::BTN_B {
                    self.set_mode(Mode::Default);
                    effects.extend(self.text_event(Value::Null));
                    return effects;
                }
                if code == KeyCode::BTN_A {
                    self.set_mode(Mode::Default);
                    let text = Value::String(self.capture.text.clone());
                    effects.extend(self.text_event(text));
                    return effects;
                }
                effects.extend(self.key_event("input.char", direction, code));
            },
            Mode::Default => {
                let path = format!("input.{}.{name}", direction.as_str());
                effects.extend(self.key_event(&path, direction, code));
            },
        }

        if direction == Direction::Up {
            for sequence in &mut self.sequences {
                if sequence.advance(code, self.modifiers) {
                    tracing::info!(sequence = sequence.name(), "secret sequence entered");
                    effects.extend(Event::new(&sequence.event_name()).ok().map(InputEffect::Emit));
                }
            }
        }

        effects
    }

    fn key_event(&self, path: &str, direction: Direction, code: KeyCode) -> Option<InputEffect> {
        let mut payload = Map::new();
        payload.insert("type".into(), Value::from(direction.as_str()));
        payload.insert("code".into(), Value::from(code.0));
        payload.insert(
            "key".into(),
            code.symbol(self.modifiers).map_or(Value::Null, |key| Value::String(key.into())),
        );
        payload.insert("ctrl".into(), Value::Bool(self.modifiers.function));
        payload.insert("shift".into(), Value::Bool(self.modifiers.shift));
        payload.insert("shield".into(), Value::Bool(self.modifiers.shield));
        Event::with_payload(path, payload).ok().map(InputEffect::Emit)
    }

    fn text_event(&self, value: Value) -> Option<InputEffect> {
        let mut payload = Map::new();
        payload.insert(
            "context".into(),
            self.capture.context.clone().map_or(Value::Null, Value::String),
        );
        payload.insert("value".into(), value);
        Event::with_payload("input.text", payload).ok().map(InputEffect::Emit)
    }
}
