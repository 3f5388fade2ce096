//! A generator runs at most one call at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};

use parking_lot::Mutex;
use yieldpoint::{Generator, GeneratorError, GeneratorState, ResumePoint, Resumed, Step};

type Slot = Arc<Mutex<Option<Generator<(), u32>>>>;
type Seen = Arc<Mutex<Vec<Result<Resumed<u32>, GeneratorError>>>>;

/// A generator whose body calls the generator stored in `slot`.
fn self_calling(slot: &Slot, seen: &Seen) -> Generator<(), u32> {
    let slot = Arc::clone(slot);
    let seen = Arc::clone(seen);
    Generator::new(0u32, move |n: &mut u32, _: ResumePoint, _: &()| {
        let me = slot.lock().clone();
        if let Some(me) = me {
            seen.lock().push(me.resume(()));
        }
        *n += 1;
        Step::Yield(*n, ResumePoint::new(1))
    })
}

#[test]
fn test_recursive_call_is_rejected() {
    let slot: Slot = Arc::new(Mutex::new(None));
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let g = self_calling(&slot, &seen);
    *slot.lock() = Some(g.clone());

    assert_eq!(g.call(()), 1);
    assert_eq!(*seen.lock(), vec![Err(GeneratorError::AlreadyRunning)]);

    // The outer call is unaffected and the generator keeps working.
    assert_eq!(g.state(), GeneratorState::Suspended);
    assert_eq!(g.call(()), 2);

    // Break the cycle so the instance can be dropped.
    slot.lock().take();
}

#[test]
#[should_panic(expected = "generator already executing")]
fn test_recursive_call_panics_on_default_surface() {
    let slot: Slot = Arc::new(Mutex::new(None));
    let body_slot = Arc::clone(&slot);
    let g: Generator<(), u32> = Generator::new((), move |_: &mut (), _: ResumePoint, _: &()| {
        let me = body_slot.lock().take();
        match me {
            Some(me) => Step::Yield(me.call(()), ResumePoint::START),
            None => Step::Complete,
        }
    });
    *slot.lock() = Some(g.clone());
    g.call(());
}

#[test]
fn test_concurrent_call_is_rejected() {
    let barrier = Arc::new(Barrier::new(2));
    let release = Arc::new(AtomicBool::new(false));

    let body_barrier = Arc::clone(&barrier);
    let body_release = Arc::clone(&release);
    let g: Generator<(), u32> = Generator::new(0u32, move |n: &mut u32, _: ResumePoint, _: &()| {
        if *n == 0 {
            // Tell the test a call is in flight, then hold it there.
            body_barrier.wait();
            while !body_release.load(Ordering::SeqCst) {
                std::thread::yield_now();
            }
        }
        *n += 1;
        Step::Yield(*n, ResumePoint::new(1))
    });

    let runner = {
        let g = g.clone();
        std::thread::spawn(move || g.call(()))
    };

    barrier.wait();
    assert_eq!(g.state(), GeneratorState::Running);
    assert_eq!(g.resume(()), Err(GeneratorError::AlreadyRunning));
    release.store(true, Ordering::SeqCst);

    assert_eq!(runner.join().unwrap(), 1);
    assert_eq!(g.call(()), 2);
}

#[test]
fn test_exhausted_call_inside_body_is_inert() {
    let done: Generator<(), u32> = Generator::new((), |_: &mut (), _: ResumePoint, _: &()| {
        Step::Complete
    });
    assert_eq!(done.call(()), 0);

    let inner = done.clone();
    let outer: Generator<(), u32> = Generator::new((), move |_: &mut (), _: ResumePoint, _: &()| {
        Step::Yield(inner.call(()) + 40, ResumePoint::new(1))
    });
    assert_eq!(outer.call(()), 40);
    assert_eq!(outer.call(()), 40);
}
