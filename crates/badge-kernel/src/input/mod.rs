//! Key input: codes, controllers, decoding and secret sequences.

pub mod decoder;
pub mod keys;
pub mod matrix;
pub mod sequence;

pub use decoder::{ControllerFault, InputDecoder, InputEffect, Mode, TextCapture};
pub use keys::{Direction, KeyCode, Modifier, Modifiers};
pub use matrix::{DEFAULT_EDGE_CAPACITY, EdgeReceiver, EdgeSender, KeyEdge, KeyMatrix, edge_queue};
pub use sequence::SecretSequence;
