//! Fuzz target for Directive::from_raw
//!
//! Screens and listeners may reply with loosely-shaped JSON. Decoding must
//! never panic; anything it does not understand is an error.

#![no_main]

use badge_kernel::Directive;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let _ = Directive::from_raw(&raw);
});
