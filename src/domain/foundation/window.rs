//! Access window value object - the interval policy.
//!
//! Every validity interval in the system (subscription windows, grant
//! windows) follows the same rules: endpoints are inclusive on both sides,
//! a missing end means unlimited duration, and the start must be strictly
//! before the end when an end exists.

use serde::{Deserialize, Serialize};

use super::{DomainError, Timestamp};

/// A validity window `[from, until]`, inclusive on both endpoints.
///
/// `until = None` means the window is open-ended.
///
/// # Invariants
///
/// - When `until` is present, `from < until` strictly. Equal endpoints are
///   rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessWindow {
    from: Timestamp,
    until: Option<Timestamp>,
}

impl AccessWindow {
    /// Creates a window, validating strict ordering of the endpoints.
    ///
    /// # Errors
    ///
    /// Returns `InvalidWindow` if `until` is present and `until <= from`.
    pub fn new(from: Timestamp, until: Option<Timestamp>) -> Result<Self, DomainError> {
        if let Some(until) = until {
            if until <= from {
                return Err(DomainError::invalid_window(format!(
                    "window end {} must be strictly after start {}",
                    until, from
                )));
            }
        }
        Ok(Self { from, until })
    }

    /// Creates a bounded window.
    pub fn bounded(from: Timestamp, until: Timestamp) -> Result<Self, DomainError> {
        Self::new(from, Some(until))
    }

    /// Creates an open-ended window starting at `from`.
    pub fn unbounded(from: Timestamp) -> Self {
        Self { from, until: None }
    }

    /// Rewrites the end without re-validating ordering.
    ///
    /// Used by grant end-date rewrites, which are specified as unconditional
    /// writes; callers own the direction of the change.
    pub(crate) fn with_end(&self, until: Option<Timestamp>) -> Self {
        Self {
            from: self.from,
            until,
        }
    }

    /// Window start.
    pub fn from(&self) -> Timestamp {
        self.from
    }

    /// Window end, `None` when open-ended.
    pub fn until(&self) -> Option<Timestamp> {
        self.until
    }

    /// True iff `from <= t` and (`until` is absent or `t <= until`).
    pub fn is_active_at(&self, t: Timestamp) -> bool {
        if t < self.from {
            return false;
        }
        match self.until {
            Some(until) => t <= until,
            None => true,
        }
    }

    /// True iff the two windows share at least one instant, under the same
    /// inclusive / open-ended rule as [`is_active_at`](Self::is_active_at).
    pub fn overlaps(&self, other: &AccessWindow) -> bool {
        let starts_before_other_ends = match other.until {
            Some(until) => self.from <= until,
            None => true,
        };
        let other_starts_before_self_ends = match self.until {
            Some(until) => other.from <= until,
            None => true,
        };
        starts_before_other_ends && other_starts_before_self_ends
    }
}
