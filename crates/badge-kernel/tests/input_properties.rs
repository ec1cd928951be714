//! Property-based tests for the input decoder.
//!
//! These tests verify:
//! - Secret-sequence detectors restart cleanly after a broken prefix
//! - The text-capture buffer never exceeds its bound
//! - Arbitrary edge streams decode without panicking

use badge_kernel::input::{InputDecoder, InputEffect, KeyCode, KeyEdge, Mode, Modifiers, SecretSequence};
use proptest::prelude::*;

const LETTERS: std::ops::RangeInclusive<u8> = 0x10..=0x29;

fn letter() -> impl Strategy<Value = KeyCode> {
    LETTERS.prop_map(KeyCode)
}

/// Keys that edit the buffer without ending capture.
fn editing_key() -> impl Strategy<Value = KeyCode> {
    prop_oneof![
        4 => letter(),
        1 => Just(KeyCode::KEY_SPACE),
        2 => Just(KeyCode::KEY_BACKSPACE),
        1 => Just(KeyCode::KEY_RETURN),
        1 => Just(KeyCode::KEY_SHIFT),
        1 => Just(KeyCode::KEY_FN),
        1 => Just(KeyCode::KEY_SHIELD),
    ]
}

fn edge() -> impl Strategy<Value = KeyEdge> {
    (any::<bool>(), any::<u8>())
        .prop_map(|(down, code)| if down { KeyEdge::down(KeyCode(code)) } else { KeyEdge::up(KeyCode(code)) })
}

#[test]
fn prop_detector_resets_after_broken_prefix() {
    proptest!(|(
        codes in prop::collection::vec(letter(), 4),
        intruder in letter(),
    )| {
        prop_assume!(intruder != codes[3]);
        let codes: &'static [KeyCode] = Box::leak(codes.into_boxed_slice());
        let mut sequence = SecretSequence::new("sample", codes, false);
        let held = Modifiers::default();

        let mut completions = 0;
        for &code in &codes[..3] {
            completions += usize::from(sequence.advance(code, held));
        }
        completions += usize::from(sequence.advance(intruder, held));
        for &code in codes {
            completions += usize::from(sequence.advance(code, held));
        }

        // PROPERTY: exactly one completion, from the full run only
        prop_assert_eq!(completions, 1);
        prop_assert_eq!(sequence.progress(), 0);
    });
}

#[test]
fn prop_text_capture_respects_bound() {
    proptest!(|(
        max_len in 0usize..12,
        initial in "[a-z]{0,16}",
        keys in prop::collection::vec((any::<bool>(), editing_key()), 0..64),
    )| {
        let mut decoder = InputDecoder::new(4);
        decoder.begin_text_capture(None, &initial, None, Some(max_len));
        prop_assert!(decoder.capture().text.chars().count() <= max_len);

        for (down, code) in keys {
            let edge = if down { KeyEdge::down(code) } else { KeyEdge::up(code) };
            for effect in decoder.handle(edge) {
                if let InputEffect::Emit(event) = effect
                    && event.name() == "input.char"
                {
                    decoder.edit_text(&event);
                }
            }
            // PROPERTY: the buffer never outgrows its bound
            prop_assert!(decoder.capture().text.chars().count() <= max_len);
        }
        prop_assert_eq!(decoder.mode(), Mode::TextCapture);
    });
}

#[test]
fn prop_arbitrary_edges_decode() {
    proptest!(|(edges in prop::collection::vec(edge(), 0..128))| {
        let mut decoder = InputDecoder::new(4);
        for edge in edges {
            for effect in decoder.handle(edge) {
                if let InputEffect::Emit(event) = effect {
                    prop_assert!(event.name().starts_with("input."));
                    prop_assert!(!event.path().has_reserved());
                }
            }
        }
    });
}
