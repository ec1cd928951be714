//! Events and keypaths.
//!
//! A [`Keypath`] is the hierarchical address events are published under and
//! listeners are registered at (`input.up.console.b`). An [`Event`] is an
//! immutable record of a keypath, an optional sender and a payload of named
//! fields.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::BusError;

/// Segment reserved for the bus's internal listener slot.
pub const RESERVED_SEGMENT: &str = "_";

/// Named payload fields carried by an [`Event`].
pub type Payload = Map<String, Value>;

/// Normalized dot-separated path.
///
/// Repeated separators collapse and leading/trailing separators are stripped,
/// so `"..input..up."` and `"input.up"` are the same path. The empty path is
/// the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Keypath {
    segments: Vec<String>,
}

impl Keypath {
    /// The root path (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Normalize and split a raw path.
    pub fn parse(raw: &str) -> Self {
        let segments =
            raw.split('.').filter(|segment| !segment.is_empty()).map(str::to_owned).collect();
        Self { segments }
    }

    /// Path segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True for the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// True if any segment is the reserved marker.
    pub fn has_reserved(&self) -> bool {
        self.segments.iter().any(|segment| segment == RESERVED_SEGMENT)
    }

    /// True if `self` equals `other` or is one of its ancestors.
    pub fn is_prefix_of(&self, other: &Keypath) -> bool {
        other.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for Keypath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Immutable event record.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    path: Keypath,
    sender: Option<String>,
    payload: Payload,
}

impl Event {
    /// Event with an empty payload.
    pub fn new(name: &str) -> Result<Self, BusError> {
        Self::with_payload(name, Payload::new())
    }

    /// Event carrying the given payload.
    pub fn with_payload(name: &str, payload: Payload) -> Result<Self, BusError> {
        let path = Keypath::parse(name);
        if path.has_reserved() {
            return Err(BusError::InvalidEvent { path: name.to_owned() });
        }
        Ok(Self { path, sender: None, payload })
    }

    /// Attach an opaque sender reference.
    #[must_use]
    pub fn from_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Normalized path.
    pub fn path(&self) -> &Keypath {
        &self.path
    }

    /// Segments joined by `.`.
    pub fn name(&self) -> String {
        self.path.to_string()
    }

    /// Sender reference, if any.
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    /// All payload fields.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Single payload field. `None` if absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.get(field)
    }

    /// Payload field as a string slice.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Payload field as a boolean. Missing or non-boolean reads as `false`.
    pub fn flag(&self, field: &str) -> bool {
        self.get(field).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Raw key code carried by input events.
    pub fn code(&self) -> Option<u8> {
        self.get("code").and_then(Value::as_u64).and_then(|code| u8::try_from(code).ok())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event {} {}", self.path, Value::Object(self.payload.clone()))
    }
}
