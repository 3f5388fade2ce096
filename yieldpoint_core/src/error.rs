//! Error types and result definitions for yieldpoint.
//!
//! Generators have no error channel of their own: a body that wants to report
//! failure encodes it in its value type. The errors here cover misuse of the
//! construct itself.

use thiserror::Error;

/// The result type used by generator construction and invocation.
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Misuse of a generator or of a resume table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    /// The generator was called while a call was already executing its body,
    /// either recursively from inside the body or from another thread.
    #[error("generator already executing")]
    AlreadyRunning,

    /// Two yield sites of one body were given the same name.
    #[error("duplicate resume point `{name}`")]
    DuplicateResumePoint {
        /// The repeated site name.
        name: String,
    },

    /// A body suspended at, or jumped to, a site its table does not contain.
    #[error("invalid resume point {index} (table has {sites} sites)")]
    InvalidResumePoint {
        /// The offending site index.
        index: u32,
        /// Number of sites in the table.
        sites: usize,
    },

    /// A resume table grew past the header's index range.
    #[error("too many resume points (limit {limit})")]
    TooManyResumePoints {
        /// The maximum number of sites per body.
        limit: usize,
    },
}

impl GeneratorError {
    /// Creates a duplicate-site error.
    pub fn duplicate<S: Into<String>>(name: S) -> Self {
        Self::DuplicateResumePoint { name: name.into() }
    }

    /// Returns true for errors raised while building a resume table.
    #[inline]
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateResumePoint { .. } | Self::TooManyResumePoints { .. }
        )
    }
}
