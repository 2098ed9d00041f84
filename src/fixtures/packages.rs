//! Package Fixtures

use jiff::civil::Time;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, clubs::parse_price},
    packages::{Activity, GenderRestriction, Package},
    schedules::{DayOfWeek, Schedule},
};

/// Wrapper for activities and packages in YAML
#[derive(Debug, Deserialize)]
pub struct PackagesFixture {
    /// Activities keyed by fixture name
    #[serde(default)]
    pub activities: FxHashMap<String, ActivityFixture>,

    /// Packages in catalog order
    pub packages: Vec<PackageFixture>,
}

/// Activity Fixture
#[derive(Debug, Deserialize)]
pub struct ActivityFixture {
    /// Activity title
    pub title: String,

    /// Standalone price (e.g., "40 GBP")
    #[serde(default)]
    pub price: Option<String>,

    /// Weekly slots
    #[serde(default)]
    pub schedules: Vec<ScheduleFixture>,
}

/// Schedule Fixture
#[derive(Debug, Deserialize)]
pub struct ScheduleFixture {
    /// Day of the week
    pub day: DayOfWeek,

    /// Start time ("HH:MM")
    pub start: String,

    /// End time ("HH:MM")
    pub end: String,
}

/// Package Fixture
#[derive(Debug, Deserialize)]
pub struct PackageFixture {
    /// Fixture key used for lookups
    pub key: String,

    /// Package name
    pub name: String,

    /// Price for one period (e.g., "60 GBP")
    pub price: String,

    /// Period length in months
    #[serde(default = "default_duration")]
    pub duration_months: u16,

    /// Inclusive minimum age
    #[serde(default)]
    pub age_min: Option<u16>,

    /// Inclusive maximum age
    #[serde(default)]
    pub age_max: Option<u16>,

    /// Gender restriction
    #[serde(default)]
    pub gender: Option<GenderRestriction>,

    /// Keys of the activities the package includes
    #[serde(default)]
    pub activities: Vec<String>,
}

fn default_duration() -> u16 {
    1
}

impl TryFrom<ScheduleFixture> for Schedule {
    type Error = FixtureError;

    fn try_from(fixture: ScheduleFixture) -> Result<Self, Self::Error> {
        Ok(Schedule::new(
            fixture.day,
            parse_time(&fixture.start)?,
            parse_time(&fixture.end)?,
        ))
    }
}

impl TryFrom<ActivityFixture> for Activity<'_> {
    type Error = FixtureError;

    fn try_from(fixture: ActivityFixture) -> Result<Self, Self::Error> {
        let schedules = fixture
            .schedules
            .into_iter()
            .map(Schedule::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let activity = Activity::new(fixture.title, schedules);

        match fixture.price.as_deref() {
            Some(price) => {
                let (minor_units, currency) = parse_price(price)?;

                Ok(activity.with_price(Money::from_minor(minor_units, currency)))
            }
            None => Ok(activity),
        }
    }
}

impl ActivityFixture {
    /// Currency of the standalone price, if the activity has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the price cannot be parsed.
    pub fn currency(&self) -> Result<Option<&'static Currency>, FixtureError> {
        self.price
            .as_deref()
            .map(|price| parse_price(price).map(|(_minor_units, currency)| currency))
            .transpose()
    }
}

impl PackageFixture {
    /// Currency of the package price.
    ///
    /// # Errors
    ///
    /// Returns an error if the price cannot be parsed.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        parse_price(&self.price).map(|(_minor_units, currency)| currency)
    }

    /// Builds the package, resolving activity keys against `activities`.
    ///
    /// # Errors
    ///
    /// Returns an error if the price cannot be parsed or an activity key is
    /// unknown.
    pub fn into_package<'a>(
        self,
        activities: &FxHashMap<String, Activity<'a>>,
    ) -> Result<Package<'a>, FixtureError> {
        let (minor_units, currency) = parse_price(&self.price)?;

        let mut package = Package::new(
            self.name,
            Money::from_minor(minor_units, currency),
            self.duration_months,
        )
        .with_ages(self.age_min, self.age_max);

        if let Some(restriction) = self.gender {
            package = package.with_gender_restriction(restriction);
        }

        for key in self.activities {
            let activity = activities
                .get(&key)
                .cloned()
                .ok_or(FixtureError::ActivityNotFound(key))?;

            package = package.with_activity(activity);
        }

        Ok(package)
    }
}

/// Parse a wall-clock time string ("HH:MM") into a `Time`
///
/// # Errors
///
/// Returns an error if the string is not two colon-separated numbers or is
/// not a valid time of day.
pub fn parse_time(s: &str) -> Result<Time, FixtureError> {
    let invalid = || FixtureError::InvalidTime(s.to_string());

    let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
    let hour = hour.parse::<i8>().map_err(|_err| invalid())?;
    let minute = minute.parse::<i8>().map_err(|_err| invalid())?;

    Time::new(hour, minute, 0, 0).map_err(|_err| invalid())
}
