//! A deterministic clock for stamping test fixtures.
//!
//! Nothing in `ironhorizon-core` requires a clock — events and commands
//! carry no typed timestamp field, only an opaque `metadata` JSON blob — but
//! test authors routinely want a reproducible value to put in that blob
//! (`"recorded_at"`, `"occurred_at"`) without every test hardcoding its own
//! magic timestamp.

use chrono::{DateTime, Utc};

/// Always returns the same instant, making time-dependent test fixtures
/// reproducible.
///
/// # Example
///
/// ```
/// use ironhorizon_testing::clock::{test_clock, FixedClock};
///
/// let clock = test_clock();
/// assert_eq!(clock.now(), clock.now());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a clock fixed at `time`.
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }

    /// The fixed instant this clock always returns.
    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// A default fixed clock for tests (2025-01-01 00:00:00 UTC).
///
/// # Panics
///
/// Panics if the hardcoded timestamp fails to parse, which cannot happen in
/// practice.
#[must_use]
pub fn test_clock() -> FixedClock {
    #[allow(clippy::expect_used)]
    FixedClock::new(
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_always_returns_the_same_instant() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }
}
