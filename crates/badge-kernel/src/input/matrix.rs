//! Key-matrix controllers and the edge queue.
//!
//! Controllers report key edges from interrupt context. Edges are only
//! enqueued there; decoding and dispatch happen on the main loop when the
//! queue is drained, so listeners never run concurrently with a screen.

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{
    error::HardwareError,
    input::keys::{Direction, KeyCode},
};

/// Default capacity of the edge queue.
pub const DEFAULT_EDGE_CAPACITY: usize = 32;

/// One key edge as reported by a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEdge {
    /// Press or release
    pub direction: Direction,
    /// Raw key code
    pub code: KeyCode,
}

impl KeyEdge {
    /// Key pressed.
    pub fn down(code: KeyCode) -> Self {
        Self { direction: Direction::Down, code }
    }

    /// Key released.
    pub fn up(code: KeyCode) -> Self {
        Self { direction: Direction::Up, code }
    }
}

/// Producer half of the edge queue, handed to controllers.
#[derive(Debug, Clone)]
pub struct EdgeSender {
    tx: mpsc::Sender<KeyEdge>,
}

impl EdgeSender {
    /// Enqueue an edge without blocking.
    ///
    /// Returns `false` if the edge was dropped because the queue is full or
    /// the runtime has shut down.
    pub fn send(&self, edge: KeyEdge) -> bool {
        match self.tx.try_send(edge) {
            Ok(()) => true,
            Err(TrySendError::Full(edge)) => {
                tracing::warn!(code = %edge.code, "edge queue full, dropping key edge");
                false
            },
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Consumer half of the edge queue, drained by the main loop.
#[derive(Debug)]
pub struct EdgeReceiver {
    rx: mpsc::Receiver<KeyEdge>,
}

impl EdgeReceiver {
    /// Next pending edge, if any.
    pub fn try_next(&mut self) -> Option<KeyEdge> {
        self.rx.try_recv().ok()
    }
}

/// Bounded edge queue. A zero capacity is raised to one.
pub fn edge_queue(capacity: usize) -> (EdgeSender, EdgeReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EdgeSender { tx }, EdgeReceiver { rx })
}

/// Key-matrix controller on the expander bus.
pub trait KeyMatrix {
    /// Controller name for diagnostics.
    fn name(&self) -> &str;

    /// Configure the controller and start reporting edges into `edges`.
    fn init(&mut self, edges: EdgeSender) -> Result<(), HardwareError>;

    /// Whether a key is currently held.
    fn is_pressed(&self, code: KeyCode) -> bool;

    /// Stop reporting edges.
    fn close(&mut self) {}
}
