//! Host simulator for the badge runtime.
//!
//! Runs the kernel and the built-in apps against terminal stand-ins for the
//! badge hardware: frames are printed as text, lights are logged, and key
//! input is played from a script file or typed on stdin.
//!
//! # Components
//!
//! - [`script`]: key script parser
//! - [`terminal`]: text-mode display and logging lights
//! - [`runtime`]: virtual platform, key source and kernel assembly
//! - [`journal`]: persistent log journal, as a tracing layer

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod journal;
pub mod runtime;
pub mod script;
pub mod terminal;

pub use journal::{Journal, JournalEntry, JournalLayer};
pub use runtime::{KeySource, SimError, SimOptions, run};
pub use script::{Beat, Script, ScriptError};
pub use terminal::{LogLights, TextDisplay};
