//! Iterator protocol for generators.
//!
//! `Generator::call` follows the zero-value convention: an exhausted
//! generator returns `T::default()`. That is ambiguous for generators that
//! legitimately yield a default value, so the explicit surface reports
//! completion as [`Resumed::Complete`] and [`GeneratorIter`] is built on it.
//!
//! ```
//! use yieldpoint::{Generator, ResumePoint, Step};
//!
//! // Yields 0 twice; a zero-value consumer would stop immediately.
//! let zeros: Generator<(), i32> = Generator::new(0u8, |n: &mut u8, _: ResumePoint, _: &()| {
//!     *n += 1;
//!     if *n <= 2 { Step::Yield(0, ResumePoint::new(1)) } else { Step::Complete }
//! });
//! assert_eq!(zeros.iter().collect::<Vec<_>>(), vec![0, 0]);
//! ```

use std::iter::FusedIterator;

use tracing::warn;

use crate::object::Generator;

// ============================================================================
// Resumed
// ============================================================================

/// Result of one call of a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resumed<T> {
    /// The body suspended with a value.
    Yielded(T),
    /// The body has completed; no value was produced.
    Complete,
}

impl<T> Resumed<T> {
    /// Returns true if the body yielded a value.
    #[inline]
    pub fn is_yielded(&self) -> bool {
        matches!(self, Self::Yielded(_))
    }

    /// Returns true if the body has completed.
    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Converts into an `Option`, `None` meaning complete.
    #[inline]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Yielded(value) => Some(value),
            Self::Complete => None,
        }
    }

    /// Returns the yielded value, or `T::default()` once complete.
    #[inline]
    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.into_option().unwrap_or_default()
    }
}

impl<T> From<Resumed<T>> for Option<T> {
    #[inline]
    fn from(resumed: Resumed<T>) -> Self {
        resumed.into_option()
    }
}

// ============================================================================
// Generator Iterator
// ============================================================================

/// Iterator over a generator that takes no per-call parameters.
///
/// Holds its own handle, so the generator stays alive (and its finalizer
/// pending) for as long as the iterator does.
pub struct GeneratorIter<T> {
    generator: Generator<(), T>,
    finished: bool,
}

impl<T> GeneratorIter<T> {
    /// Creates an iterator over a generator handle.
    #[inline]
    pub fn new(generator: Generator<(), T>) -> Self {
        Self {
            generator,
            finished: false,
        }
    }

    /// Returns the underlying generator.
    #[inline]
    pub fn generator(&self) -> &Generator<(), T> {
        &self.generator
    }

    /// Gives back the generator handle.
    #[inline]
    pub fn into_inner(self) -> Generator<(), T> {
        self.generator
    }
}

impl<T> Iterator for GeneratorIter<T> {
    type Item = T;

    /// Resumes the generator.
    ///
    /// A call rejected with `AlreadyRunning` (iterating a generator from
    /// inside its own body) ends the iteration.
    fn next(&mut self) -> Option<T> {
        if self.finished {
            return None;
        }
        match self.generator.resume(()) {
            Ok(Resumed::Yielded(value)) => Some(value),
            Ok(Resumed::Complete) => {
                self.finished = true;
                None
            }
            Err(err) => {
                warn!(generator = self.generator.name(), error = %err, "iteration stopped");
                self.finished = true;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished || self.generator.is_exhausted() {
            (0, Some(0))
        } else {
            (0, None)
        }
    }
}

impl<T> FusedIterator for GeneratorIter<T> {}

impl<T> IntoIterator for Generator<(), T> {
    type Item = T;
    type IntoIter = GeneratorIter<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        GeneratorIter::new(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
