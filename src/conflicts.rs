//! Schedule conflicts
//!
//! Pairwise overlap detection across the weekly slots of selected activities.

use std::fmt;

use jiff::civil::Time;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    packages::{Activity, Catalog},
    people::PersonUuid,
    registrants::Registrant,
    schedules::{DayOfWeek, Schedule},
};

/// Two activities whose slots overlap on the same day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConflict {
    /// Title of the first activity
    pub first: String,

    /// Title of the second activity
    pub second: String,

    /// The shared day
    pub day: DayOfWeek,

    /// First activity's slot range
    pub first_range: (Time, Time),

    /// Second activity's slot range
    pub second_range: (Time, Time),
}

impl ScheduleConflict {
    /// Whether this conflict is between the two titles, in either order.
    #[must_use]
    pub fn involves(&self, a: &str, b: &str) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

impl fmt::Display for ScheduleConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} and {} overlap on {} ({}-{} and {}-{})",
            self.first,
            self.second,
            self.day,
            self.first_range.0.strftime("%H:%M"),
            self.first_range.1.strftime("%H:%M"),
            self.second_range.0.strftime("%H:%M"),
            self.second_range.1.strftime("%H:%M"),
        )
    }
}

/// A flattened slot, remembering the title of its activity.
struct Slot<'s> {
    title: &'s str,
    schedule: Schedule,
}

/// Find every overlapping pair of slots across `activities`.
///
/// Every pair of slots is compared, including two slots of one activity.
/// Conflicts are reported in discovery order.
#[must_use]
pub fn detect(activities: &[Activity<'_>]) -> Vec<ScheduleConflict> {
    detect_refs(activities.iter())
}

fn detect_refs<'s, 'a: 's>(
    activities: impl IntoIterator<Item = &'s Activity<'a>>,
) -> Vec<ScheduleConflict> {
    let slots: Vec<Slot<'s>> = activities
        .into_iter()
        .flat_map(|activity| {
            activity.schedules.iter().map(move |schedule| Slot {
                title: activity.title.as_str(),
                schedule: *schedule,
            })
        })
        .collect();

    let mut conflicts = Vec::new();

    for (i, a) in slots.iter().enumerate() {
        for b in slots.iter().skip(i + 1) {
            if a.schedule.overlaps(&b.schedule) {
                conflicts.push(ScheduleConflict {
                    first: a.title.to_string(),
                    second: b.title.to_string(),
                    day: a.schedule.day(),
                    first_range: (a.schedule.start(), a.schedule.end()),
                    second_range: (b.schedule.start(), b.schedule.end()),
                });
            }
        }
    }

    conflicts
}

/// Conflicts found among the packages selected by one person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonConflicts {
    /// The person whose selections clash
    pub person: PersonUuid,

    /// Each overlapping pair
    pub conflicts: Vec<ScheduleConflict>,
}

/// Run [`detect`] per person over the activities of every package they have
/// selected in this batch.
///
/// Registrants without a resolved package are skipped. Only people with at
/// least one conflict appear in the output, in order of first appearance.
#[must_use]
pub fn detect_for_registrants(
    registrants: &[Registrant],
    catalog: &Catalog<'_>,
) -> Vec<PersonConflicts> {
    let mut order: SmallVec<[PersonUuid; 4]> = SmallVec::new();
    let mut by_person: FxHashMap<PersonUuid, Vec<&Activity<'_>>> = FxHashMap::default();

    for registrant in registrants {
        let Some(package) = registrant
            .selection()
            .and_then(|selection| catalog.get(selection.package))
        else {
            continue;
        };

        let person = registrant.person().uuid;

        if !by_person.contains_key(&person) {
            order.push(person);
        }

        by_person
            .entry(person)
            .or_default()
            .extend(package.activities.iter());
    }

    order
        .into_iter()
        .filter_map(|person| {
            let activities = by_person.remove(&person)?;
            let conflicts = detect_refs(activities);

            (!conflicts.is_empty()).then_some(PersonConflicts { person, conflicts })
        })
        .collect()
}
