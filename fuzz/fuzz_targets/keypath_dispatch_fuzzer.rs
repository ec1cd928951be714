//! Fuzz target for keypath normalization and bus dispatch
//!
//! # Strategy
//!
//! - Register listeners at arbitrary raw paths (stray dots, reserved `_`)
//! - Dispatch events at arbitrary raw paths
//!
//! # Invariants
//!
//! - Normalized paths have no empty segments and survive a print/parse
//! - A listener fires only for events at or below its path
//! - Paths containing the reserved segment are rejected

#![no_main]

use arbitrary::Arbitrary;
use badge_kernel::{Event, EventBus, Keypath};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum BusOp {
    Listen { path: String, once: bool },
    Dispatch { path: String },
    Clear,
}

#[derive(Default)]
struct Hits {
    fired: Vec<(Keypath, Keypath)>,
}

fuzz_target!(|ops: Vec<BusOp>| {
    let mut bus: EventBus<Hits> = EventBus::new();
    let mut hits = Hits::default();

    for op in ops {
        match op {
            BusOp::Listen { path, once } => {
                let keypath = Keypath::parse(&path);
                assert!(keypath.segments().iter().all(|segment| !segment.is_empty()));
                assert_eq!(Keypath::parse(&keypath.to_string()), keypath);

                let listener = keypath.clone();
                let registered = bus.register(&path, once, move |hits: &mut Hits, event: &Event| {
                    hits.fired.push((listener.clone(), event.path().clone()));
                    None
                });
                assert_eq!(registered.is_err(), keypath.has_reserved());
            },
            BusOp::Dispatch { path } => {
                let Ok(event) = Event::new(&path) else { continue };
                hits.fired.clear();
                assert!(bus.dispatch(&event, &mut hits).is_none());
                for (listener, target) in &hits.fired {
                    assert!(listener.is_prefix_of(target));
                }
            },
            BusOp::Clear => bus.clear(),
        }
    }
});
