//! Half-open time slots claimed by scheduled orders.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The interval `[start, end)` an order occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSlot {
    /// `None` when the end would fall outside the representable time range.
    pub fn from_start(start: DateTime<Utc>, duration_minutes: u32) -> Option<Self> {
        let length = TimeDelta::try_minutes(i64::from(duration_minutes))?;
        let end = start.checked_add_signed(length)?;
        Some(Self { start, end })
    }

    /// Two slots overlap when each one starts before the other ends.
    ///
    /// Back-to-back slots (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}
