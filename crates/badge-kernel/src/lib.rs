//! Badge runtime kernel.
//!
//! The cooperative core of the e-paper conference badge: it turns raw key
//! edges into hierarchical events, dispatches them to the listeners of the
//! active screen, and swaps screens and apps when they ask for it.
//!
//! # Architecture
//!
//! Everything runs on one thread. Peripherals sit behind narrow traits
//! ([`hal`], [`KeyMatrix`], [`Storage`]) so the same kernel drives real
//! hardware and the deterministic doubles used in tests.
//!
//! ```text
//! KeyMatrix ──edge──▶ InputDecoder ──Event──▶ EventBus ──▶ Screen hooks
//!                                                            │
//!                    Kernel ◀── Directive ◀── App ◀── Reply ─┘
//! ```
//!
//! # Components
//!
//! - [`EventBus`]: keypath trie of listeners with a write-once result
//! - [`InputDecoder`]: modifiers, text capture and secret sequences
//! - [`Screen`]: one view of an app, driven by hooks
//! - [`App`]: ordered screens and the screen-switching loop
//! - [`Kernel`]: start reasons, app swaps and crash recovery
//! - [`AppRegistry`]: installed app modules by name

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod bus;
pub mod config;
pub mod context;
pub mod directive;
pub mod error;
pub mod event;
pub mod hal;
pub mod input;
pub mod kernel;
pub mod menu;
pub mod registry;
pub mod screen;
pub mod storage;

pub use app::{App, ExitReason};
pub use bus::EventBus;
pub use config::KernelConfig;
pub use context::{Bus, Context, Peripherals, Stage};
pub use directive::{Directive, Launch, LaunchArgs, Reply};
pub use error::{AppError, BusError, DirectiveError, ErrorClass, HardwareError, KernelError, StorageError};
pub use event::{Event, Keypath, Payload};
pub use input::{InputDecoder, KeyCode, KeyMatrix, Mode};
pub use kernel::{Kernel, LoadOutcome, Shutdown, StartReason};
pub use menu::{Menu, MenuEntry};
pub use registry::{AppInfo, AppModule, AppRegistry, FnModule};
pub use screen::{Listeners, RenderMode, Screen, ScreenOptions};
pub use storage::{FileStorage, MemoryStorage, Settings, Storage};
