//! Secret key-sequence detectors.

use crate::input::keys::{KeyCode, Modifiers};

/// Progress tracker for one secret sequence.
///
/// Advances on each matching key-up. A mismatch resets progress to zero
/// without re-testing the mismatching key against the first element, so
/// `UP UP UP DOWN ...` never completes a sequence that starts `UP UP DOWN`.
#[derive(Debug, Clone)]
pub struct SecretSequence {
    name: &'static str,
    codes: &'static [KeyCode],
    requires_shield: bool,
    progress: usize,
    consumed: bool,
}

impl SecretSequence {
    /// New detector. `requires_shield` ignores keys while Shield is released.
    pub const fn new(name: &'static str, codes: &'static [KeyCode], requires_shield: bool) -> Self {
        Self { name, codes, requires_shield, progress: 0, consumed: false }
    }

    /// Detector name, also the completion event suffix.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Completion event name (`input.konami`).
    pub fn event_name(&self) -> String {
        format!("input.{}", self.name)
    }

    /// Keys matched so far.
    pub fn progress(&self) -> usize {
        self.progress
    }

    /// Whether the last key fed matched the next expected key, including
    /// the key that completed the sequence.
    pub fn consumed_last(&self) -> bool {
        self.consumed
    }

    /// Total keys in the sequence.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// True for a sequence with no keys (never completes).
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Forget progress.
    pub fn reset(&mut self) {
        self.progress = 0;
        self.consumed = false;
    }

    /// Feed one key-up. Returns `true` when the sequence completes.
    pub fn advance(&mut self, code: KeyCode, modifiers: Modifiers) -> bool {
        self.consumed = false;
        if self.requires_shield && !modifiers.shield {
            return false;
        }
        let Some(&expected) = self.codes.get(self.progress) else {
            return false;
        };

        if code == expected {
            self.progress += 1;
            self.consumed = true;
        } else {
            self.progress = 0;
        }

        if self.progress == self.codes.len() {
            self.progress = 0;
            return true;
        }
        false
    }
}

/// Name of the classic up-up-down-down sequence.
pub const KONAMI: &str = "konami";
/// Name of the left-right-left-right-B-B-START sequence.
pub const CYBAER: &str = "cybaer";
/// Name of the typed-name sequence.
pub const NAHUEL: &str = "nahuel";
/// Name of the shielded gallery sequence.
pub const HNZLMNN: &str = "hnzlmnn";

const KONAMI_CODES: [KeyCode; 10] = [
    KeyCode::BTN_UP,
    KeyCode::BTN_UP,
    KeyCode::BTN_DOWN,
    KeyCode::BTN_DOWN,
    KeyCode::BTN_LEFT,
    KeyCode::BTN_RIGHT,
    KeyCode::BTN_LEFT,
    KeyCode::BTN_RIGHT,
    KeyCode::BTN_B,
    KeyCode::BTN_A,
];

const CYBAER_CODES: [KeyCode; 7] = [
    KeyCode::BTN_LEFT,
    KeyCode::BTN_RIGHT,
    KeyCode::BTN_LEFT,
    KeyCode::BTN_RIGHT,
    KeyCode::BTN_B,
    KeyCode::BTN_B,
    KeyCode::BTN_START,
];

const NAHUEL_CODES: [KeyCode; 6] =
    [KeyCode::KEY_N, KeyCode::KEY_A, KeyCode::KEY_H, KeyCode::KEY_U, KeyCode::KEY_E, KeyCode::KEY_L];

const HNZLMNN_CODES: [KeyCode; 8] = [
    KeyCode::KEY_H,
    KeyCode::KEY_N,
    KeyCode::KEY_Z,
    KeyCode::KEY_L,
    KeyCode::KEY_M,
    KeyCode::KEY_N,
    KeyCode::KEY_N,
    KeyCode::KEY_RETURN,
];

/// The four built-in detectors.
pub fn builtin() -> Vec<SecretSequence> {
    vec![
        SecretSequence::new(KONAMI, &KONAMI_CODES, false),
        SecretSequence::new(CYBAER, &CYBAER_CODES, false),
        SecretSequence::new(NAHUEL, &NAHUEL_CODES, false),
        SecretSequence::new(HNZLMNN, &HNZLMNN_CODES, true),
    ]
}
