//! Fuzz target for the input decoder
//!
//! # Strategy
//!
//! - Arbitrary key edges, known and unknown codes
//! - Text capture entered at arbitrary points with arbitrary bounds
//! - `input.char` events fed back into the buffer as the runtime does
//!
//! # Invariants
//!
//! - The capture buffer never exceeds its bound
//! - Confirm and cancel always leave text capture
//! - Every emitted event lives under `input`

#![no_main]

use arbitrary::Arbitrary;
use badge_kernel::{
    input::{Direction, InputEffect, KeyCode, KeyEdge},
    InputDecoder, Mode,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum DecoderOp {
    Edge { down: bool, code: u8 },
    Capture { initial: String, max_len: Option<u8> },
}

fuzz_target!(|ops: Vec<DecoderOp>| {
    let mut decoder = InputDecoder::new(8);

    for op in ops {
        match op {
            DecoderOp::Edge { down, code } => {
                let code = KeyCode(code);
                let edge = if down { KeyEdge::down(code) } else { KeyEdge::up(code) };
                let capturing = decoder.mode() == Mode::TextCapture;

                for effect in decoder.handle(edge) {
                    let InputEffect::Emit(event) = effect else { continue };
                    let name = event.name();
                    if name == "input.char" {
                        decoder.edit_text(&event);
                    }
                    assert!(name.starts_with("input."), "{name}");
                }

                let ends_capture = edge.direction == Direction::Up
                    && (code == KeyCode::BTN_A || code == KeyCode::BTN_B);
                if capturing && ends_capture {
                    assert_eq!(decoder.mode(), Mode::Default);
                }
            },
            DecoderOp::Capture { initial, max_len } => {
                decoder.begin_text_capture(None, &initial, None, max_len.map(usize::from));
            },
        }

        let capture = decoder.capture();
        if let Some(max) = capture.max_len {
            assert!(capture.text.chars().count() <= max);
        }
    }
});
