//! Generator instance.
//!
//! This module provides [`Generator`], the opaque callable that callers create,
//! share, call, and drop. An instance captures:
//!
//! - Lifecycle state and resume point (via `GeneratorHeader`)
//! - Body state and body (via a boxed [`Frame`])
//! - The resume table naming the body's sites
//! - One finalizer slot
//!
//! # Sharing
//!
//! ```text
//! Generator ──┐
//! Generator ──┼──▶ Arc<Inner> { header, frame: Mutex<Box<dyn Frame>>, finalizer, .. }
//! Generator ──┘                                     │
//!                          last handle dropped ─────┴──▶ finalizer(&mut state)
//! ```
//!
//! Cloning a `Generator` shares the instance. The finalizer runs when the last
//! handle goes away, on whichever thread drops it.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use yieldpoint_core::{
    GeneratorHeader, GeneratorResult, GeneratorState, ResumePoint, ResumeTable, Step,
};

use crate::config::GeneratorConfig;
use crate::engine::{self, BodyFrame, Frame};
use crate::finalizer::{Finalizer, FinalizerSlot};
use crate::iterator::{GeneratorIter, Resumed};

// ============================================================================
// Inner
// ============================================================================

struct Inner<P, T> {
    header: GeneratorHeader,
    frame: Mutex<Box<dyn Frame<P, T>>>,
    finalizer: Mutex<FinalizerSlot>,
    table: Arc<ResumeTable>,
    config: GeneratorConfig,
}

impl<P, T> Drop for Inner<P, T> {
    fn drop(&mut self) {
        let frame = self.frame.get_mut();
        self.finalizer
            .get_mut()
            .fire(frame.state_mut(), self.config.name.as_ref());
    }
}

// ============================================================================
// Generator
// ============================================================================

/// A resumable generator taking per-call parameters `P` and producing `T`.
///
/// `P` is a tuple of the per-call parameters, `()` when there are none.
///
/// ```
/// use yieldpoint::{Generator, ResumePoint, Step};
///
/// // Yields start, start + 1, start + 2, then completes.
/// fn count_three(start: i32) -> Generator<(), i32> {
///     Generator::new(start, |n: &mut i32, at: ResumePoint, _: &()| {
///         if at.index() >= 3 {
///             return Step::Complete;
///         }
///         let value = *n;
///         *n += 1;
///         Step::Yield(value, at.next())
///     })
/// }
///
/// let g = count_three(5);
/// assert_eq!(g.call(()), 5);
/// assert_eq!(g.call(()), 6);
/// assert_eq!(g.call(()), 7);
/// assert_eq!(g.call(()), 0);
/// assert_eq!(g.call(()), 0);
/// ```
pub struct Generator<P, T> {
    inner: Arc<Inner<P, T>>,
}

impl<P: 'static, T: 'static> Generator<P, T> {
    /// Creates a generator from its initial state and body.
    #[inline]
    pub fn new<S, F>(state: S, body: F) -> Self
    where
        S: Send + 'static,
        F: FnMut(&mut S, ResumePoint, &P) -> Step<T> + Send + 'static,
    {
        GeneratorBuilder::new(state).build(body)
    }
}

impl<P, T> Generator<P, T> {
    /// Runs the body until its next yield and returns the yielded value.
    ///
    /// Once the body has completed, returns `T::default()` on every call
    /// without running anything.
    ///
    /// # Panics
    ///
    /// Panics if the generator is already executing (called from inside its
    /// own body, or concurrently from another thread), or if the body targets
    /// a site missing from its resume table.
    pub fn call(&self, params: P) -> T
    where
        T: Default,
    {
        match self.resume(params) {
            Ok(resumed) => resumed.unwrap_or_default(),
            Err(err) => panic!("{}: {err}", self.name()),
        }
    }

    /// Runs the body until its next yield, reporting completion explicitly.
    pub fn resume(&self, params: P) -> GeneratorResult<Resumed<T>> {
        let inner = &*self.inner;
        engine::drive(
            &inner.header,
            &inner.frame,
            &inner.table,
            &inner.config,
            &params,
        )
    }

    /// Places a finalizer in this instance's slot, replacing any earlier one.
    ///
    /// The finalizer runs once, when the last handle is dropped.
    pub fn register_finalizer<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner
            .finalizer
            .lock()
            .register(Finalizer::new(f), self.name());
    }

    /// Returns true if a finalizer is waiting to run.
    #[inline]
    pub fn has_finalizer(&self) -> bool {
        self.inner.finalizer.lock().is_registered()
    }

    /// Returns the lifecycle state.
    #[inline]
    pub fn state(&self) -> GeneratorState {
        self.inner.header.state()
    }

    /// Returns the site the next call resumes at.
    #[inline]
    pub fn resume_point(&self) -> ResumePoint {
        self.inner.header.resume_point()
    }

    /// Returns the name of the site the next call resumes at, if known.
    #[inline]
    pub fn site_name(&self) -> Option<&str> {
        self.inner.table.name(self.resume_point())
    }

    /// Returns true once the body has completed.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.inner.header.is_exhausted()
    }

    /// Returns the generator's name.
    #[inline]
    pub fn name(&self) -> &str {
        self.inner.config.name.as_ref()
    }

    /// Returns the resume table.
    #[inline]
    pub fn table(&self) -> &ResumeTable {
        &self.inner.table
    }

    /// Returns the number of live handles to this instance.
    #[inline]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Returns true if both handles refer to the same instance.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Generator<(), T> {
    /// Returns an iterator sharing this instance.
    #[inline]
    pub fn iter(&self) -> GeneratorIter<T> {
        GeneratorIter::new(self.clone())
    }
}

impl<P, T> Clone for Generator<P, T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, T> fmt::Debug for Generator<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (state, point) = self.inner.header.snapshot();
        f.debug_struct("Generator")
            .field("name", &self.name())
            .field("state", &state)
            .field("resume_point", &point)
            .field("site", &self.inner.table.name(point))
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for a generator instance.
///
/// ```
/// use yieldpoint::{Generator, GeneratorBuilder, GeneratorConfig, ResumePoint, ResumeTableBuilder, Step};
///
/// let mut sites = ResumeTableBuilder::new();
/// let again = sites.site("again").unwrap();
///
/// let g: Generator<(u32,), u32> = GeneratorBuilder::new(Vec::<u32>::new())
///     .config(GeneratorConfig::named("history"))
///     .table(sites.build())
///     .finalizer(|seen: &mut Vec<u32>| seen.clear())
///     .build(move |seen: &mut Vec<u32>, _: ResumePoint, &(x,): &(u32,)| {
///         seen.push(x);
///         Step::Yield(seen.iter().sum(), again)
///     });
///
/// assert_eq!(g.call((2,)), 2);
/// assert_eq!(g.call((3,)), 5);
/// assert_eq!(g.site_name(), Some("again"));
/// ```
pub struct GeneratorBuilder<S> {
    state: S,
    config: GeneratorConfig,
    table: Arc<ResumeTable>,
    finalizer: FinalizerSlot,
}

impl<S> GeneratorBuilder<S>
where
    S: Send + 'static,
{
    /// Creates a builder with default config and an empty resume table.
    #[inline]
    pub fn new(state: S) -> Self {
        Self {
            state,
            config: GeneratorConfig::default(),
            table: Arc::new(ResumeTable::new()),
            finalizer: FinalizerSlot::new(),
        }
    }

    /// Replaces the whole config.
    #[inline]
    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the generator's name.
    #[inline]
    pub fn name<N: Into<Cow<'static, str>>>(mut self, name: N) -> Self {
        self.config.name = name.into();
        self
    }

    /// Sets the resume table checked against the body's targets.
    #[inline]
    pub fn table<R: Into<Arc<ResumeTable>>>(mut self, table: R) -> Self {
        self.table = table.into();
        self
    }

    /// Places a finalizer that releases what the body state holds.
    ///
    /// Shares the instance's single slot with
    /// [`Generator::register_finalizer`]; the last registration wins.
    pub fn finalizer<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        let owner = self.config.name.clone();
        self.finalizer.register(Finalizer::with_state(f), &owner);
        self
    }

    /// Finishes the instance around its body.
    pub fn build<P, T, F>(self, body: F) -> Generator<P, T>
    where
        P: 'static,
        T: 'static,
        F: FnMut(&mut S, ResumePoint, &P) -> Step<T> + Send + 'static,
    {
        let frame: Box<dyn Frame<P, T>> = Box::new(BodyFrame::new(self.state, body));
        Generator {
            inner: Arc::new(Inner {
                header: GeneratorHeader::new(),
                frame: Mutex::new(frame),
                finalizer: Mutex::new(self.finalizer),
                table: self.table,
                config: self.config,
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
