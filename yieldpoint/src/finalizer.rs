//! Finalizer registration.
//!
//! Every instance has one finalizer slot. A routine placed there runs exactly
//! once, when the last handle to the instance is dropped, whether the body
//! completed, was abandoned part way, panicked, or never ran at all.
//!
//! Registering again replaces the previous routine; the replaced routine is
//! dropped without running.

use std::any::Any;
use std::fmt;

use tracing::debug;

type Routine = Box<dyn FnOnce(&mut dyn Any) + Send>;

/// A cleanup routine waiting for its instance to be destroyed.
pub struct Finalizer {
    routine: Routine,
}

impl Finalizer {
    /// Wraps a routine that does not need the body state.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            routine: Box::new(move |_: &mut dyn Any| f()),
        }
    }

    /// Wraps a routine that releases what the body state `S` holds.
    pub fn with_state<S, F>(f: F) -> Self
    where
        S: 'static,
        F: FnOnce(&mut S) + Send + 'static,
    {
        Self {
            routine: Box::new(move |state: &mut dyn Any| {
                if let Some(state) = state.downcast_mut::<S>() {
                    f(state);
                }
            }),
        }
    }

    /// Runs the routine. Consuming `self` keeps it from running twice.
    #[inline]
    pub fn run(self, state: &mut dyn Any) {
        (self.routine)(state)
    }
}

impl fmt::Debug for Finalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Finalizer(..)")
    }
}

/// The single finalizer slot of an instance.
#[derive(Debug, Default)]
pub struct FinalizerSlot {
    finalizer: Option<Finalizer>,
}

impl FinalizerSlot {
    /// Creates an empty slot.
    #[inline]
    pub const fn new() -> Self {
        Self { finalizer: None }
    }

    /// Places a finalizer, replacing any earlier one.
    ///
    /// Returns true if an earlier finalizer was replaced.
    pub fn register(&mut self, finalizer: Finalizer, owner: &str) -> bool {
        let replaced = self.finalizer.replace(finalizer).is_some();
        if replaced {
            debug!(generator = owner, "finalizer replaced");
        }
        replaced
    }

    /// Returns true if a finalizer is waiting.
    #[inline]
    pub fn is_registered(&self) -> bool {
        self.finalizer.is_some()
    }

    /// Runs the waiting finalizer, if any, and empties the slot.
    ///
    /// Returns true if a finalizer ran.
    pub fn fire(&mut self, state: &mut dyn Any, owner: &str) -> bool {
        match self.finalizer.take() {
            Some(finalizer) => {
                debug!(generator = owner, "running finalizer");
                finalizer.run(state);
                true
            }
            None => false,
        }
    }
}
