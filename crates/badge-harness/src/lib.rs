//! Deterministic test rig for the badge kernel.
//!
//! Every peripheral is replaced by an in-memory double whose state stays
//! observable through a cloned handle after the kernel has taken ownership.
//! Key input is a script: each time the kernel idles, the next beat of the
//! script is delivered through the key-matrix edge queue. Once the script is
//! exhausted the platform reports an interrupt, so every run terminates.
//!
//! # Invariant Testing
//!
//! The [`invariants`] module checks runtime properties against a
//! [`KernelSnapshot`] taken after (or between) runs. Use
//! [`InvariantRegistry::standard()`] for the common set.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod doubles;
pub mod invariants;
pub mod rig;

pub use doubles::{
    Beat, DisplayHandle, FailingMatrix, FakeNetwork, KeyScript, LightsHandle, MemoryLights,
    RecordingDisplay, ScriptedKeys, ScriptedPlatform,
};
pub use invariants::{
    ActiveAppMatches, CaptureWithinBound, Invariant, InvariantRegistry, InvariantResult,
    KernelSnapshot, MenuCursorVisible, ScreenInRange, Violation,
};
pub use rig::{Rig, Watch};
