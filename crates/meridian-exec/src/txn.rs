//! The three-phase transaction skeleton.
//!
//! Every benchmark transaction implements `read`, `compute`, and `write`;
//! [`TransactionBody::execute`] runs them in order, skipping later phases
//! after a failure. `compute` cannot fail.
//!
//! Bodies accumulate failures in an [`ErrorSlot`]: only the first message
//! is retained. During key generation a body should keep scanning after a
//! missing row so the key set is fully discovered before it reports
//! failure; bodies do this by gating control flow on an `ok` flag instead
//! of returning early.

/// Sticky first-error slot.
#[derive(Debug, Default)]
pub struct ErrorSlot {
    first: Option<String>,
}

impl ErrorSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` unless an earlier error is already held.
    pub fn set(&mut self, message: impl Into<String>) {
        if self.first.is_none() {
            self.first = Some(message.into());
        }
    }

    /// The first recorded message, or the empty string.
    #[must_use]
    pub fn message(&self) -> &str {
        self.first.as_deref().unwrap_or("")
    }

    /// Whether any error has been recorded.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.first.is_some()
    }
}

/// A benchmark transaction body.
pub trait TransactionBody {
    /// Phase 1: read everything the transaction needs.
    fn read(&mut self) -> bool;

    /// Phase 2: pure computation over the read results.
    fn compute(&mut self);

    /// Phase 3: stage the writes.
    fn write(&mut self) -> bool;

    /// The first error recorded by any phase, or the empty string.
    fn error(&self) -> &str;

    /// Runs the three phases, stopping at the first failed one.
    fn execute(&mut self) -> bool {
        if !self.read() {
            return false;
        }
        self.compute();
        self.write()
    }
}
