//! Resume sites and dispatch outcomes.
//!
//! A body is dispatched with the resume point it should continue from. Each
//! dispatch returns a [`Step`]: suspend with a value, jump to another site
//! without suspending, or complete.
//!
//! The [`ResumeTable`] names the sites of one body. It is built once per
//! generator definition and shared by every instance of that definition.
//! Site 0 is always the start of the body.
//!
//! # Uniqueness
//!
//! Every site of a body must have its own index, otherwise resumption is
//! ambiguous. `generator!` gets this from the compiler (sites are enum
//! variants). Hand-written bodies go through [`ResumeTableBuilder`], which
//! rejects a repeated name when the table is built, before any instance runs.

use std::borrow::Cow;
use std::fmt;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::error::{GeneratorError, GeneratorResult};
use crate::state::{GeneratorHeader, GeneratorState, ResumePoint};

/// Maximum number of sites in a single body.
pub const MAX_RESUME_POINTS: usize = GeneratorHeader::MAX_RESUME_INDEX as usize + 1;

/// Name given to site 0 by [`ResumeTableBuilder`].
pub const START_SITE: &str = "start";

// ============================================================================
// Step
// ============================================================================

/// Outcome of one dispatch of a generator body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<T> {
    /// Suspend, handing `T` to the caller. The next call resumes at the site.
    Yield(T, ResumePoint),
    /// Continue at the site within the same call.
    Goto(ResumePoint),
    /// The body ran off its end.
    Complete,
}

impl<T> Step<T> {
    /// Returns true if this step suspends the generator.
    #[inline]
    pub fn is_yield(&self) -> bool {
        matches!(self, Self::Yield(..))
    }

    /// Returns the site this step continues at, if any.
    #[inline]
    pub fn target(&self) -> Option<ResumePoint> {
        match self {
            Self::Yield(_, point) | Self::Goto(point) => Some(*point),
            Self::Complete => None,
        }
    }
}

// ============================================================================
// Resume Table
// ============================================================================

/// Names of the sites of one body, indexed by resume point.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResumeTable {
    sites: SmallVec<[Cow<'static, str>; 8]>,
}

impl ResumeTable {
    /// Creates an empty table. An empty table checks nothing.
    #[inline]
    pub fn new() -> Self {
        Self {
            sites: SmallVec::new(),
        }
    }

    /// Creates a table from site names already known to be unique.
    ///
    /// This is the path `generator!` takes; its sites are enum variants, so
    /// the compiler has already rejected duplicates.
    pub fn from_names(names: &'static [&'static str]) -> Self {
        debug_assert!(
            {
                let mut seen = FxHashSet::default();
                names.iter().all(|name| seen.insert(*name))
            },
            "duplicate site name in {names:?}"
        );
        Self {
            sites: names.iter().map(|name| Cow::Borrowed(*name)).collect(),
        }
    }

    /// Returns the name of a site.
    #[inline]
    pub fn name(&self, point: ResumePoint) -> Option<&str> {
        self.sites.get(point.index() as usize).map(|name| name.as_ref())
    }

    /// Looks up a site by name.
    pub fn lookup(&self, name: &str) -> Option<ResumePoint> {
        self.sites
            .iter()
            .position(|site| site == name)
            .map(|index| ResumePoint::new(index as u32))
    }

    /// Returns true if the table has a site at `point`.
    #[inline]
    pub fn contains(&self, point: ResumePoint) -> bool {
        (point.index() as usize) < self.sites.len()
    }

    /// Checks that `point` names a site of this table.
    ///
    /// An empty table accepts every point.
    #[inline]
    pub fn check(&self, point: ResumePoint) -> GeneratorResult<ResumePoint> {
        if self.is_empty() || self.contains(point) {
            Ok(point)
        } else {
            Err(GeneratorError::InvalidResumePoint {
                index: point.index(),
                sites: self.sites.len(),
            })
        }
    }

    /// Returns the number of sites.
    #[inline]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Returns true if the table has no sites.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Iterates over `(point, name)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (ResumePoint, &str)> + '_ {
        self.sites
            .iter()
            .enumerate()
            .map(|(index, name)| (ResumePoint::new(index as u32), name.as_ref()))
    }
}

impl fmt::Debug for ResumeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter().map(|(p, n)| (p.index(), n))).finish()
    }
}

// ============================================================================
// Resume Table Builder
// ============================================================================

/// Builder that assigns sequential indices to named sites.
///
/// The builder starts with the [`START_SITE`] at index 0.
///
/// ```
/// use yieldpoint_core::{ResumePoint, ResumeTableBuilder};
///
/// let mut builder = ResumeTableBuilder::new();
/// let first = builder.site("after_first").unwrap();
/// let second = builder.site("after_second").unwrap();
/// assert_eq!(first, ResumePoint::new(1));
/// assert_eq!(second, ResumePoint::new(2));
/// assert!(builder.site("after_first").is_err());
/// ```
#[derive(Debug)]
pub struct ResumeTableBuilder {
    table: ResumeTable,
    seen: FxHashSet<Cow<'static, str>>,
}

impl ResumeTableBuilder {
    /// Creates a builder holding only the start site.
    pub fn new() -> Self {
        let mut builder = Self {
            table: ResumeTable::new(),
            seen: FxHashSet::default(),
        };
        builder.seen.insert(Cow::Borrowed(START_SITE));
        builder.table.sites.push(Cow::Borrowed(START_SITE));
        builder
    }

    /// Registers a site and returns its resume point.
    pub fn site<N: Into<Cow<'static, str>>>(&mut self, name: N) -> GeneratorResult<ResumePoint> {
        let name = name.into();
        let index = self.table.sites.len();
        if index >= MAX_RESUME_POINTS {
            return Err(GeneratorError::TooManyResumePoints {
                limit: MAX_RESUME_POINTS,
            });
        }
        if !self.seen.insert(name.clone()) {
            return Err(GeneratorError::duplicate(name));
        }
        self.table.sites.push(name);
        Ok(ResumePoint::new(index as u32))
    }

    /// Returns the number of sites registered so far, start included.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Always false: the start site is registered on creation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Finishes the table.
    #[inline]
    pub fn build(self) -> ResumeTable {
        self.table
    }
}

impl Default for ResumeTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Resume Action
// ============================================================================

/// What a call should do after inspecting the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeAction {
    /// The header is now Running; dispatch the body at this point.
    Execute(ResumePoint),
    /// The body has completed; do nothing.
    Exhausted,
    /// Another call is executing the body.
    AlreadyRunning,
}

impl ResumeAction {
    /// Returns true if the body should be dispatched.
    #[inline]
    pub fn should_execute(&self) -> bool {
        matches!(self, Self::Execute(_))
    }
}

/// Claims the header for one call and returns the action to take.
#[inline]
pub fn prepare_resume(header: &GeneratorHeader) -> ResumeAction {
    match header.try_start() {
        Ok((GeneratorState::Created, _)) => ResumeAction::Execute(ResumePoint::START),
        Ok((_, point)) => ResumeAction::Execute(point),
        Err(GeneratorState::Exhausted) => ResumeAction::Exhausted,
        Err(_) => ResumeAction::AlreadyRunning,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_target() {
        assert_eq!(Step::Yield(1, ResumePoint::new(2)).target(), Some(ResumePoint::new(2)));
        assert_eq!(Step::<i32>::Goto(ResumePoint::START).target(), Some(ResumePoint::START));
        assert_eq!(Step::<i32>::Complete.target(), None);
        assert!(Step::Yield((), ResumePoint::START).is_yield());
        assert!(!Step::<()>::Complete.is_yield());
    }

    #[test]
    fn test_table_from_names() {
        let table = ResumeTable::from_names(&["top", "middle", "bottom"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.name(ResumePoint::START), Some("top"));
        assert_eq!(table.lookup("bottom"), Some(ResumePoint::new(2)));
        assert_eq!(table.lookup("nowhere"), None);
        assert_eq!(table.name(ResumePoint::new(3)), None);
    }

    #[test]
    fn test_table_check() {
        let table = ResumeTable::from_names(&["a", "b"]);
        assert_eq!(table.check(ResumePoint::new(1)), Ok(ResumePoint::new(1)));
        assert_eq!(
            table.check(ResumePoint::new(2)),
            Err(GeneratorError::InvalidResumePoint { index: 2, sites: 2 })
        );
    }

    #[test]
    fn test_empty_table_accepts_everything() {
        let table = ResumeTable::new();
        assert!(table.is_empty());
        assert!(table.check(ResumePoint::new(1000)).is_ok());
    }

    #[test]
    fn test_builder_sequential_indices() {
        let mut builder = ResumeTableBuilder::new();
        assert_eq!(builder.len(), 1);
        let a = builder.site("a").unwrap();
        let b = builder.site(String::from("b")).unwrap();
        assert_eq!(a, ResumePoint::new(1));
        assert_eq!(b, ResumePoint::new(2));

        let table = builder.build();
        assert_eq!(table.name(ResumePoint::START), Some(START_SITE));
        assert_eq!(table.name(b), Some("b"));
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let mut builder = ResumeTableBuilder::new();
        builder.site("loop").unwrap();
        let err = builder.site("loop").unwrap_err();
        assert_eq!(err, GeneratorError::duplicate("loop"));
        assert!(err.is_construction_error());
        // The failed registration does not consume an index.
        assert_eq!(builder.site("after").unwrap(), ResumePoint::new(2));
    }

    #[test]
    fn test_builder_rejects_start_name() {
        let mut builder = ResumeTableBuilder::new();
        assert!(builder.site(START_SITE).is_err());
    }

    #[test]
    fn test_table_debug() {
        let table = ResumeTable::from_names(&["x", "y"]);
        assert_eq!(format!("{:?}", table), r#"{0: "x", 1: "y"}"#);
    }

    #[test]
    fn test_prepare_resume_transitions() {
        let header = GeneratorHeader::new();
        assert_eq!(prepare_resume(&header), ResumeAction::Execute(ResumePoint::START));
        assert_eq!(prepare_resume(&header), ResumeAction::AlreadyRunning);

        header.suspend(ResumePoint::new(3));
        let action = prepare_resume(&header);
        assert!(action.should_execute());
        assert_eq!(action, ResumeAction::Execute(ResumePoint::new(3)));

        header.exhaust();
        assert_eq!(prepare_resume(&header), ResumeAction::Exhausted);
        assert!(!ResumeAction::Exhausted.should_execute());
    }
}
