//! Stream versioning for optimistic concurrency control.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version number of an aggregate's event stream.
///
/// Versions start at [`Version::INITIAL`] (0, meaning "no events yet") and
/// increment by one for every event appended. The event store uses the
/// version as the compare-and-swap token for optimistic concurrency: a
/// caller appending events states the version it believes the stream is at,
/// and the append is rejected if another writer got there first.
///
/// # Examples
///
/// ```
/// use ironhorizon_core::version::Version;
///
/// let v0 = Version::INITIAL;
/// let v1 = v0.next();
/// assert_eq!(v1, Version::new(1));
/// assert_eq!(v1.value(), 1);
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u64);

impl Version {
    /// The version of a stream that has never been appended to.
    pub const INITIAL: Self = Self(0);

    /// Construct a version with the given raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw version number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The version reached after appending a single event.
    ///
    /// # Overflow Behavior
    ///
    /// Uses wrapping arithmetic. Reaching `u64::MAX` events on one stream is
    /// not a realistic concern.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// The version reached after appending `count` events.
    #[must_use]
    pub const fn advance(self, count: u64) -> Self {
        Self(self.0.wrapping_add(count))
    }

    /// Whether this is the initial (pre-append) version.
    #[must_use]
    pub const fn is_initial(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Version> for u64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl std::ops::Add<u64> for Version {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        self.advance(rhs)
    }
}
