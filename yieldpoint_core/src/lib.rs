//! # Yieldpoint Core
//!
//! Leaf types shared by the yieldpoint generator runtime:
//!
//! - **Resume-point state**: `ResumePoint` and the tagged `GeneratorHeader`
//!   that packs lifecycle state and resume index into one atomic word
//! - **Resume sites**: `ResumeTable` naming the sites of a body, the
//!   `ResumeTableBuilder` that rejects duplicate sites, and the `Step` a body
//!   returns from each dispatch
//! - **Error Handling**: `GeneratorError` and `GeneratorResult`

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod resume;
pub mod state;

pub use error::{GeneratorError, GeneratorResult};
pub use resume::{
    MAX_RESUME_POINTS, ResumeAction, ResumeTable, ResumeTableBuilder, START_SITE, Step,
    prepare_resume,
};
pub use state::{GeneratorHeader, GeneratorState, ResumePoint};
