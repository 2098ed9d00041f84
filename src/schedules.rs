//! Schedules
//!
//! Weekly recurring time slots attached to an activity.

use std::fmt;

use jiff::civil::Time;
use serde::Deserialize;

/// Day of the week a schedule recurs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    /// Monday
    Monday,
    /// Tuesday
    Tuesday,
    /// Wednesday
    Wednesday,
    /// Thursday
    Thursday,
    /// Friday
    Friday,
    /// Saturday
    Saturday,
    /// Sunday
    Sunday,
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        };

        f.write_str(name)
    }
}

/// A weekly slot: `day`, from `start` until `end` on the same day.
///
/// `start < end` is expected of catalog data and is not checked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Schedule {
    day: DayOfWeek,
    start: Time,
    end: Time,
}

impl Schedule {
    /// Creates a new schedule slot.
    #[must_use]
    pub const fn new(day: DayOfWeek, start: Time, end: Time) -> Self {
        Self { day, start, end }
    }

    /// Day the slot recurs on.
    #[must_use]
    pub const fn day(&self) -> DayOfWeek {
        self.day
    }

    /// Start of the slot.
    #[must_use]
    pub const fn start(&self) -> Time {
        self.start
    }

    /// End of the slot.
    #[must_use]
    pub const fn end(&self) -> Time {
        self.end
    }

    /// Whether two slots share a day and their half-open ranges intersect.
    ///
    /// Slots that only touch (`self.end == other.start`) do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Schedule) -> bool {
        self.day == other.day && self.start < other.end && self.end > other.start
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.day,
            self.start.strftime("%H:%M"),
            self.end.strftime("%H:%M")
        )
    }
}
