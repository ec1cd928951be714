//! Runtime invariants, checked between dispatches.
//!
//! Each check reads a [`KernelSnapshot`] so it sees one consistent state.
//!
//! ```ignore
//! InvariantRegistry::standard().assert_all(&KernelSnapshot::of(&kernel), "after boot");
//! ```

mod checks;
mod snapshot;

pub use checks::{ActiveAppMatches, CaptureWithinBound, MenuCursorVisible, ScreenInRange};
pub use snapshot::{AppSnapshot, KernelSnapshot, MenuSnapshot};

/// Outcome of one check.
pub type InvariantResult = Result<(), Violation>;

/// A broken invariant.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{invariant}: {message}")]
pub struct Violation {
    /// Check that failed
    pub invariant: &'static str,
    /// What the snapshot showed
    pub message: String,
}

/// Property of a resting kernel.
pub trait Invariant {
    /// Name used in violations.
    fn name(&self) -> &'static str;

    /// Inspect `state`.
    fn check(&self, state: &KernelSnapshot) -> InvariantResult;
}

/// Set of checks run together.
pub struct InvariantRegistry {
    checks: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// App, screen, menu and text-capture consistency.
    pub fn standard() -> Self {
        Self {
            checks: vec![
                Box::new(ActiveAppMatches),
                Box::new(ScreenInRange),
                Box::new(MenuCursorVisible),
                Box::new(CaptureWithinBound),
            ],
        }
    }

    /// Add a check.
    #[must_use]
    pub fn with(mut self, check: impl Invariant + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Number of checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether there are no checks.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check, returning all violations.
    pub fn check_all(&self, state: &KernelSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.checks.iter().filter_map(|check| check.check(state).err()).collect();
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Run every check and panic listing the violations.
    #[allow(clippy::panic, reason = "Test assertion helper")]
    pub fn assert_all(&self, state: &KernelSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let lines: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("invariants broken {context}:\n  {}", lines.join("\n  "));
        }
    }
}
