//! Generator engine: resume dispatch.
//!
//! A body is an ordinary function of `(state, resume point, params)` that
//! returns a [`Step`]. The engine claims the instance header, dispatches the
//! body at the stored resume point, follows `Goto` steps within the same
//! call, and records the outcome:
//!
//! ```text
//!   Created ──┐
//!             ├─ try_start ─▶ Running ─┬─ Yield(v, site) ─▶ Suspended @site
//!   Suspended ┘                        ├─ Goto(site) ─────▶ dispatch again
//!                                      ├─ Complete ───────▶ Exhausted
//!                                      └─ panic ──────────▶ Exhausted
//! ```
//!
//! Entering at a site runs nothing that precedes the site. Calling an
//! exhausted instance dispatches nothing.

use std::any::Any;

use parking_lot::Mutex;
use tracing::{trace, warn};

use yieldpoint_core::{
    GeneratorError, GeneratorHeader, GeneratorResult, ResumeAction, ResumePoint, ResumeTable,
    Step, prepare_resume,
};

use crate::config::GeneratorConfig;
use crate::iterator::Resumed;

// ============================================================================
// Frame
// ============================================================================

/// Body state plus the body that advances it.
///
/// This is the type-erased part of an instance; the instance only knows the
/// per-call parameter type `P` and the value type `T`.
pub trait Frame<P, T>: Send {
    /// Runs the body from `at` until it yields, jumps, or completes.
    fn dispatch(&mut self, at: ResumePoint, params: &P) -> Step<T>;

    /// The persisted body state, for finalizers.
    fn state_mut(&mut self) -> &mut dyn Any;
}

/// A [`Frame`] over an explicit state struct and a body closure.
pub struct BodyFrame<S, F> {
    state: S,
    body: F,
}

impl<S, F> BodyFrame<S, F> {
    /// Pairs a body with its initial state.
    #[inline]
    pub fn new(state: S, body: F) -> Self {
        Self { state, body }
    }

    /// Returns the body state.
    #[inline]
    pub fn state(&self) -> &S {
        &self.state
    }
}

impl<S, F, P, T> Frame<P, T> for BodyFrame<S, F>
where
    S: Send + 'static,
    F: FnMut(&mut S, ResumePoint, &P) -> Step<T> + Send,
{
    #[inline]
    fn dispatch(&mut self, at: ResumePoint, params: &P) -> Step<T> {
        (self.body)(&mut self.state, at, params)
    }

    #[inline]
    fn state_mut(&mut self) -> &mut dyn Any {
        &mut self.state
    }
}

// ============================================================================
// Run Guard
// ============================================================================

/// Exhausts the header if the body unwinds out of a call.
struct RunGuard<'a> {
    header: &'a GeneratorHeader,
    name: &'a str,
    armed: bool,
}

impl<'a> RunGuard<'a> {
    #[inline]
    fn new(header: &'a GeneratorHeader, name: &'a str) -> Self {
        Self {
            header,
            name,
            armed: true,
        }
    }

    #[inline]
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(generator = self.name, "body panicked, generator exhausted");
            self.header.exhaust();
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

enum Outcome<T> {
    Suspend(T, ResumePoint),
    Complete,
    Invalid(GeneratorError),
}

/// Drives one call of a generator.
///
/// Returns `Resumed::Complete` without touching the body when the header is
/// already exhausted, and `GeneratorError::AlreadyRunning` when another call
/// holds the header.
pub fn drive<P, T>(
    header: &GeneratorHeader,
    frame: &Mutex<Box<dyn Frame<P, T>>>,
    table: &ResumeTable,
    config: &GeneratorConfig,
    params: &P,
) -> GeneratorResult<Resumed<T>> {
    let name = config.name.as_ref();
    let mut at = match prepare_resume(header) {
        ResumeAction::Execute(point) => point,
        ResumeAction::Exhausted => return Ok(Resumed::Complete),
        ResumeAction::AlreadyRunning => {
            trace!(generator = name, "rejected reentrant call");
            return Err(GeneratorError::AlreadyRunning);
        }
    };

    let guard = RunGuard::new(header, name);
    trace!(
        generator = name,
        resume_point = %at,
        site = table.name(at).unwrap_or("?"),
        "resuming"
    );

    let outcome = {
        let mut frame = frame.lock();
        loop {
            let step = frame.dispatch(at, params);
            if config.validate_resume_points {
                if let Some(Err(err)) = step.target().map(|target| table.check(target)) {
                    break Outcome::Invalid(err);
                }
            }
            match step {
                Step::Yield(value, next) => break Outcome::Suspend(value, next),
                Step::Goto(next) => at = next,
                Step::Complete => break Outcome::Complete,
            }
        }
    };
    guard.disarm();

    match outcome {
        Outcome::Suspend(value, next) => {
            header.suspend(next);
            trace!(
                generator = name,
                resume_point = %next,
                site = table.name(next).unwrap_or("?"),
                "suspended"
            );
            Ok(Resumed::Yielded(value))
        }
        Outcome::Complete => {
            header.exhaust();
            trace!(generator = name, "completed");
            Ok(Resumed::Complete)
        }
        Outcome::Invalid(err) => {
            header.exhaust();
            warn!(generator = name, error = %err, "invalid resume target, generator exhausted");
            Err(err)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use yieldpoint_core::GeneratorState;

    fn boxed<S, F>(state: S, body: F) -> Mutex<Box<dyn Frame<(), u32>>>
    where
        S: Send + 'static,
        F: FnMut(&mut S, ResumePoint, &()) -> Step<u32> + Send + 'static,
    {
        Mutex::new(Box::new(BodyFrame::new(state, body)))
    }

    /// Yields 10, 20, then completes.
    fn two_yields() -> Mutex<Box<dyn Frame<(), u32>>> {
        boxed(0u32, |runs: &mut u32, at: ResumePoint, _: &()| {
            *runs += 1;
            match at.index() {
                0 => Step::Yield(10, ResumePoint::new(1)),
                1 => Step::Yield(20, ResumePoint::new(2)),
                _ => Step::Complete,
            }
        })
    }

    #[test]
    fn test_drive_sequence() {
        let header = GeneratorHeader::new();
        let frame = two_yields();
        let table = ResumeTable::new();
        let config = GeneratorConfig::for_testing();

        assert_eq!(
            drive(&header, &frame, &table, &config, &()),
            Ok(Resumed::Yielded(10))
        );
        assert_eq!(header.state(), GeneratorState::Suspended);
        assert_eq!(header.resume_point(), ResumePoint::new(1));

        assert_eq!(
            drive(&header, &frame, &table, &config, &()),
            Ok(Resumed::Yielded(20))
        );
        assert_eq!(
            drive(&header, &frame, &table, &config, &()),
            Ok(Resumed::Complete)
        );
        assert!(header.is_exhausted());
    }

    #[test]
    fn test_exhausted_does_not_dispatch() {
        let header = GeneratorHeader::new();
        let frame = two_yields();
        let table = ResumeTable::new();
        let config = GeneratorConfig::default();

        for _ in 0..3 {
            drive(&header, &frame, &table, &config, &()).unwrap();
        }
        for _ in 0..5 {
            assert_eq!(
                drive(&header, &frame, &table, &config, &()),
                Ok(Resumed::Complete)
            );
        }

        let mut frame = frame.lock();
        let runs = frame.state_mut().downcast_mut::<u32>().copied();
        assert_eq!(runs, Some(3));
    }

    #[test]
    fn test_goto_continues_same_call() {
        let header = GeneratorHeader::new();
        let frame = boxed(Vec::<u32>::new(), |trail: &mut Vec<u32>, at: ResumePoint, _: &()| {
            trail.push(at.index());
            match at.index() {
                0 => Step::Goto(ResumePoint::new(2)),
                2 => Step::Goto(ResumePoint::new(1)),
                1 => Step::Yield(trail.len() as u32, ResumePoint::new(3)),
                _ => Step::Complete,
            }
        });
        let table = ResumeTable::new();
        let config = GeneratorConfig::default();

        assert_eq!(
            drive(&header, &frame, &table, &config, &()),
            Ok(Resumed::Yielded(3))
        );
        assert_eq!(header.resume_point(), ResumePoint::new(3));
    }

    #[test]
    fn test_invalid_target_exhausts() {
        let header = GeneratorHeader::new();
        let frame = boxed((), |_: &mut (), _: ResumePoint, _: &()| {
            Step::Yield(1, ResumePoint::new(9))
        });
        let table = ResumeTable::from_names(&["start", "after"]);
        let config = GeneratorConfig::for_testing();

        assert_eq!(
            drive(&header, &frame, &table, &config, &()),
            Err(GeneratorError::InvalidResumePoint { index: 9, sites: 2 })
        );
        assert!(header.is_exhausted());
        assert_eq!(
            drive(&header, &frame, &table, &config, &()),
            Ok(Resumed::Complete)
        );
    }

    #[test]
    fn test_unchecked_config_skips_validation() {
        let header = GeneratorHeader::new();
        let frame = boxed((), |_: &mut (), _: ResumePoint, _: &()| {
            Step::Yield(1, ResumePoint::new(9))
        });
        let table = ResumeTable::from_names(&["start"]);
        let config = GeneratorConfig::unchecked();

        assert_eq!(
            drive(&header, &frame, &table, &config, &()),
            Ok(Resumed::Yielded(1))
        );
    }

    #[test]
    fn test_wide_target_never_aliases() {
        let header = GeneratorHeader::new();
        let frame = boxed((), |_: &mut (), at: ResumePoint, _: &()| {
            Step::Yield(at.index(), ResumePoint::new((1 << 30) + 1))
        });
        let table = ResumeTable::new();
        let config = GeneratorConfig::unchecked();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            drive(&header, &frame, &table, &config, &())
        }));
        assert!(result.is_err());
        assert!(header.is_exhausted());
        assert_eq!(header.resume_point(), ResumePoint::START);
        assert_eq!(
            drive(&header, &frame, &table, &config, &()),
            Ok(Resumed::Complete)
        );
    }

    #[test]
    fn test_running_header_rejected() {
        let header = GeneratorHeader::new();
        header.try_start().unwrap();
        let frame = two_yields();

        assert_eq!(
            drive(
                &header,
                &frame,
                &ResumeTable::new(),
                &GeneratorConfig::default(),
                &()
            ),
            Err(GeneratorError::AlreadyRunning)
        );
    }

    #[test]
    fn test_panic_exhausts() {
        let header = GeneratorHeader::new();
        let frame = boxed((), |_: &mut (), _: ResumePoint, _: &()| -> Step<u32> {
            panic!("body failure")
        });
        let table = ResumeTable::new();
        let config = GeneratorConfig::default();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            drive(&header, &frame, &table, &config, &())
        }));
        assert!(result.is_err());
        assert!(header.is_exhausted());
        assert!(!frame.is_locked());
    }
}
