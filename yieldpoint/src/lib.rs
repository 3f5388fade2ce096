//! Resumable generators built as explicit state machines.
//!
//! A generator is a callable that keeps its local state between calls and
//! resumes right after the point where it last produced a value. There is no
//! native coroutine underneath: a body is dispatched with an explicit resume
//! point and returns a [`Step`] saying whether it yielded, jumped, or
//! completed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Generator<P, T>  (Arc, cloned by every holder)            │
//! ├──────────────────────────────────────────────────────────┤
//! │  GeneratorHeader   state + resume index, one atomic u32   │
//! │  Frame             body state S + body closure            │
//! │  ResumeTable       site names, shared per definition      │
//! │  FinalizerSlot     runs once when the last holder drops   │
//! └──────────────────────────────────────────────────────────┘
//!          │ call(params)
//!          ▼
//!   engine::drive ── try_start ─▶ dispatch(at) ─▶ Yield / Goto / Complete
//! ```
//!
//! # Example
//!
//! ```
//! use yieldpoint::{generator, suspend};
//!
//! generator! {
//!     fn fibonacci()() -> u64 {
//!         let a: u64 = 0;
//!         let b: u64 = 1;
//!         resume st {
//!             step => {
//!                 let out = st.a;
//!                 (st.a, st.b) = (st.b, st.a + st.b);
//!                 suspend!(out => step);
//!             }
//!         }
//!     }
//! }
//!
//! let fib = fibonacci();
//! let first: Vec<u64> = fib.iter().take(8).collect();
//! assert_eq!(first, vec![0, 1, 1, 2, 3, 5, 8, 13]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::new_without_default)]

#[macro_use]
pub mod macros;

pub mod config;
pub mod engine;
pub mod finalizer;
pub mod iterator;
pub mod object;

// Re-exports
pub use config::GeneratorConfig;
pub use engine::{BodyFrame, Frame};
pub use finalizer::{Finalizer, FinalizerSlot};
pub use iterator::{GeneratorIter, Resumed};
pub use object::{Generator, GeneratorBuilder};
pub use yieldpoint_core::{
    GeneratorError, GeneratorHeader, GeneratorResult, GeneratorState, MAX_RESUME_POINTS,
    ResumePoint, ResumeTable, ResumeTableBuilder, Step,
};
