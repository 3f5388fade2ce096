//! Resume-point state.
//!
//! This module provides the `GeneratorHeader` which uses tagged encoding to
//! pack both the lifecycle state AND the resume index into a single u32, so a
//! single load answers "may this generator run?" and "where does it resume?".
//!
//! # Encoding
//!
//! ```text
//! Bits 0-1:  State (Created=0, Running=1, Suspended=2, Exhausted=3)
//! Bits 2-31: Resume index (yield site ID, max 2^30 - 1)
//! ```
//!
//! The terminal condition lives in the state bits, not in the index. An
//! exhausted header keeps the index of the last site it suspended at.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

// ============================================================================
// Resume Point
// ============================================================================

/// Identifier of a yield site inside a generator body.
///
/// Index 0 is [`ResumePoint::START`], the position before the first statement.
/// Every other site of a body gets its own index when the body is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct ResumePoint(u32);

impl ResumePoint {
    /// The "not yet started" position.
    pub const START: Self = Self(0);

    /// Largest index that fits in a header.
    pub const MAX_INDEX: u32 = GeneratorHeader::MAX_RESUME_INDEX;

    /// Creates a resume point from a site index.
    ///
    /// # Panics
    ///
    /// Panics if `index` exceeds [`ResumePoint::MAX_INDEX`]. A wider index
    /// would alias another site once packed into the header.
    #[inline(always)]
    pub const fn new(index: u32) -> Self {
        assert!(index <= Self::MAX_INDEX, "resume index exceeds 30 bits");
        Self(index)
    }

    /// Returns the site index.
    #[inline(always)]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Returns true for the "not yet started" position.
    #[inline(always)]
    pub const fn is_start(self) -> bool {
        self.0 == 0
    }

    /// Returns the site following this one in declaration order.
    #[inline]
    pub const fn next(self) -> Self {
        Self::new(self.0 + 1)
    }
}

impl fmt::Display for ResumePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_start() {
            f.write_str("@start")
        } else {
            write!(f, "@{}", self.0)
        }
    }
}

impl From<ResumePoint> for u32 {
    #[inline]
    fn from(point: ResumePoint) -> Self {
        point.0
    }
}

// ============================================================================
// Generator State
// ============================================================================

/// Generator lifecycle state.
///
/// Packed into 2 bits for single-instruction comparison.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeneratorState {
    /// Created but never invoked.
    #[default]
    Created = 0,
    /// A call is executing the body (reentry check).
    Running = 1,
    /// Suspended at a yield site.
    Suspended = 2,
    /// The body ran to completion. Further calls do nothing.
    Exhausted = 3,
}

impl GeneratorState {
    /// Number of bits used to encode state.
    pub const BITS: u32 = 2;

    /// Mask for extracting state from header.
    pub const MASK: u32 = (1 << Self::BITS) - 1;

    /// Creates state from raw 2-bit value.
    #[inline(always)]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & Self::MASK {
            0 => Self::Created,
            1 => Self::Running,
            2 => Self::Suspended,
            _ => Self::Exhausted,
        }
    }

    /// Returns true if the generator can be started or resumed.
    #[inline(always)]
    pub const fn is_resumable(self) -> bool {
        matches!(self, Self::Created | Self::Suspended)
    }

    /// Returns true if the body has completed.
    #[inline(always)]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Returns a short lowercase name for logs.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Suspended => "suspended",
            Self::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for GeneratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Generator Header
// ============================================================================

/// Tagged header combining lifecycle state and resume index.
///
/// # Memory Layout
///
/// ```text
/// +-------------------+-------+
/// | Resume Index (30) | State |
/// |                   | (2)   |
/// +-------------------+-------+
/// MSB                       LSB
/// ```
///
/// # Thread Safety
///
/// A generator runs at most one call at a time. `try_start` claims the header
/// with a compare-and-swap, so a second caller (reentrant or from another
/// thread) observes `Running` and backs off instead of racing on body state.
#[repr(transparent)]
pub struct GeneratorHeader {
    bits: AtomicU32,
}

impl GeneratorHeader {
    /// Maximum resume index (2^30 - 1).
    pub const MAX_RESUME_INDEX: u32 = (1 << 30) - 1;

    const RESUME_SHIFT: u32 = GeneratorState::BITS;

    /// Creates a new header in Created state at `ResumePoint::START`.
    #[inline]
    pub const fn new() -> Self {
        Self {
            bits: AtomicU32::new(GeneratorState::Created as u32),
        }
    }

    #[inline(always)]
    const fn encode(state: GeneratorState, point: ResumePoint) -> u32 {
        (point.index() << Self::RESUME_SHIFT) | (state as u32)
    }

    /// Creates a header with specific state and resume point.
    #[inline]
    pub fn with_state(state: GeneratorState, point: ResumePoint) -> Self {
        Self {
            bits: AtomicU32::new(Self::encode(state, point)),
        }
    }

    /// Gets the current state.
    #[inline(always)]
    pub fn state(&self) -> GeneratorState {
        GeneratorState::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Gets the current resume point.
    #[inline(always)]
    pub fn resume_point(&self) -> ResumePoint {
        ResumePoint(self.bits.load(Ordering::Acquire) >> Self::RESUME_SHIFT)
    }

    /// Gets both state and resume point in a single atomic load.
    #[inline(always)]
    pub fn snapshot(&self) -> (GeneratorState, ResumePoint) {
        let bits = self.bits.load(Ordering::Acquire);
        (
            GeneratorState::from_bits(bits),
            ResumePoint(bits >> Self::RESUME_SHIFT),
        )
    }

    /// Transitions to Running if currently resumable.
    ///
    /// Returns the previous state and the point to resume at, or the state
    /// that prevented the transition.
    #[inline]
    pub fn try_start(&self) -> Result<(GeneratorState, ResumePoint), GeneratorState> {
        let mut old = self.bits.load(Ordering::Acquire);
        loop {
            let old_state = GeneratorState::from_bits(old);
            if !old_state.is_resumable() {
                return Err(old_state);
            }

            let new = (old & !GeneratorState::MASK) | (GeneratorState::Running as u32);
            match self
                .bits
                .compare_exchange_weak(old, new, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Ok((old_state, ResumePoint(old >> Self::RESUME_SHIFT))),
                Err(actual) => old = actual,
            }
        }
    }

    /// Transitions to Suspended at `point`. Only valid when Running.
    #[inline]
    pub fn suspend(&self, point: ResumePoint) {
        debug_assert_eq!(self.state(), GeneratorState::Running);
        self.bits
            .store(Self::encode(GeneratorState::Suspended, point), Ordering::Release);
    }

    /// Transitions to Exhausted.
    #[inline]
    pub fn exhaust(&self) {
        // Resume index is kept for debugging
        self.bits
            .fetch_or(GeneratorState::Exhausted as u32, Ordering::AcqRel);
    }

    /// Returns true while a call is executing the body.
    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.state() == GeneratorState::Running
    }

    /// Returns true if the generator can be started or resumed.
    #[inline(always)]
    pub fn is_resumable(&self) -> bool {
        self.state().is_resumable()
    }

    /// Returns true if the body has completed.
    #[inline(always)]
    pub fn is_exhausted(&self) -> bool {
        self.state().is_finished()
    }

    /// Returns the raw bits (for debugging).
    #[inline]
    pub fn raw(&self) -> u32 {
        self.bits.load(Ordering::Relaxed)
    }
}

impl Default for GeneratorHeader {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GeneratorHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (state, point) = self.snapshot();
        f.debug_struct("GeneratorHeader")
            .field("state", &state)
            .field("resume_point", &point)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
