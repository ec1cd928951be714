//! Error types for the badge runtime kernel.
//!
//! Strongly-typed errors per layer: event bus misuse, loose directive
//! decoding, app lifecycle failures, peripheral failures and the kernel's own
//! top-level failures. Every error maps onto one [`ErrorClass`], which decides
//! how far it is allowed to travel before it is recovered.
//!
//! Normal control flow never uses these types: screens and apps hand
//! [`crate::Directive`]s upwards instead.

use thiserror::Error;

use crate::hal::Interrupted;

/// Recovery class of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad persisted state. Recovered by falling back to defaults.
    Configuration,
    /// Peripheral failure. Logged, flagged, degraded operation continues.
    Hardware,
    /// Missing app, bad directive shape, screen index out of range. Recovered
    /// by falling back to the default app or a static error screen.
    AppLifecycle,
    /// Unrecognized top-level action or unusable output devices.
    Fatal,
}

/// Errors raised by the event bus.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Listener path uses the reserved marker segment.
    #[error("invalid listener path {path:?}: segment '_' is reserved")]
    InvalidListener {
        /// Path as passed by the caller
        path: String,
    },

    /// Event path uses the reserved marker segment.
    #[error("invalid event path {path:?}: segment '_' is reserved")]
    InvalidEvent {
        /// Path as passed by the caller
        path: String,
    },
}

impl BusError {
    /// Recovery class of this error.
    pub fn class(&self) -> ErrorClass {
        ErrorClass::AppLifecycle
    }
}

/// Errors raised while decoding a loosely-shaped directive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    /// Value is neither a bare reload code nor an `[action, extra]` pair.
    #[error("malformed directive: {0}")]
    Malformed(String),

    /// Action code outside the known set.
    #[error("unknown directive action {0}")]
    UnknownAction(i64),
}

impl DirectiveError {
    /// Recovery class of this error.
    pub fn class(&self) -> ErrorClass {
        ErrorClass::AppLifecycle
    }
}

/// Errors raised by app lifecycle operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// App declares no screens.
    #[error("app '{app}' must define at least one screen")]
    NoScreensDefined {
        /// App name
        app: String,
    },

    /// Requested screen index does not exist.
    #[error("screen {index} does not exist (app has {count} screens)")]
    InvalidScreenIndex {
        /// Requested index
        index: usize,
        /// Number of screens the app declares
        count: usize,
    },

    /// App declares a version below 1.
    #[error("app '{app}' must specify a version >= 1 (got {version})")]
    InvalidVersion {
        /// App name
        app: String,
        /// Declared version
        version: u32,
    },

    /// No module is registered under this name.
    #[error("app '{app}' is not installed")]
    NotFound {
        /// Requested app name
        app: String,
    },

    /// Module exists but could not be loaded.
    #[error("app '{app}' failed to load: {reason}")]
    Load {
        /// App name
        app: String,
        /// Loader diagnostic
        reason: String,
    },

    /// Module loaded but constructing the app failed.
    #[error("app '{app}' failed to start: {reason}")]
    Construction {
        /// App name
        app: String,
        /// Constructor diagnostic
        reason: String,
    },
}

impl AppError {
    /// Recovery class of this error.
    pub fn class(&self) -> ErrorClass {
        ErrorClass::AppLifecycle
    }
}

/// Errors raised by key-matrix controllers and other peripherals.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HardwareError {
    /// Controller did not answer during initialization.
    #[error("controller '{controller}' failed to initialize: {reason}")]
    Init {
        /// Controller name
        controller: String,
        /// Driver diagnostic
        reason: String,
    },

    /// Bus transfer failed after initialization.
    #[error("bus error: {0}")]
    Bus(String),
}

impl HardwareError {
    /// Recovery class of this error.
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Hardware
    }
}

/// Errors raised while reading or writing persisted settings.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backing file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file is not valid JSON.
    #[error("invalid settings file: {0}")]
    Json(#[from] serde_json::Error),

    /// Backing file holds JSON that is not an object.
    #[error("settings file must contain a JSON object")]
    NotAnObject,
}

impl StorageError {
    /// Recovery class of this error.
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Configuration
    }
}

/// Errors that escape to the kernel's top-level handler.
#[derive(Error, Debug)]
pub enum KernelError {
    /// App handed the kernel a directive it cannot execute.
    #[error("invalid action {0}")]
    InvalidAction(&'static str),

    /// App lifecycle failure that could not be recovered locally.
    #[error(transparent)]
    App(#[from] AppError),

    /// Listener registration failed.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// Host asked the runtime to stop.
    #[error("interrupted")]
    Interrupted,
}

impl KernelError {
    /// Recovery class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidAction(_) | Self::Interrupted => ErrorClass::Fatal,
            Self::App(err) => err.class(),
            Self::Bus(err) => err.class(),
        }
    }
}

impl From<Interrupted> for KernelError {
    fn from(_: Interrupted) -> Self {
        Self::Interrupted
    }
}
