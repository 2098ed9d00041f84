//! People

use std::fmt;

use jiff::civil::Date;
use serde::Deserialize;

use crate::uuids::TypedUuid;

/// Person UUID
pub type PersonUuid = TypedUuid<Person>;

/// Gender as recorded on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male
    Male,

    /// Female
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("male"),
            Gender::Female => f.write_str("female"),
        }
    }
}

/// A registrant candidate, built from a stored profile or a freshly entered child.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    /// Profile identity
    pub uuid: PersonUuid,

    /// Display name
    pub name: String,

    /// Date of birth, if known
    pub date_of_birth: Option<Date>,

    /// Gender
    pub gender: Gender,

    /// Nationality (free text or ISO code, as the profile store holds it)
    pub nationality: String,

    /// Blood type
    pub blood_type: Option<String>,

    /// Avatar reference in the external file store
    pub avatar: Option<String>,
}

impl Person {
    /// Creates a person with only the fields eligibility needs.
    pub fn new(name: impl Into<String>, date_of_birth: Option<Date>, gender: Gender) -> Self {
        Self {
            uuid: PersonUuid::now_v7(),
            name: name.into(),
            date_of_birth,
            gender,
            nationality: String::new(),
            blood_type: None,
            avatar: None,
        }
    }

    /// Age in whole years on `today`, or `None` without a date of birth.
    #[must_use]
    pub fn age_on(&self, today: Date) -> Option<u16> {
        self.date_of_birth.map(|dob| age_between(dob, today))
    }
}

/// Whole years elapsed between `date_of_birth` and `today`.
///
/// The year difference drops by one until this year's birthday is reached.
/// Birth dates in the future yield zero.
#[must_use]
pub fn age_between(date_of_birth: Date, today: Date) -> u16 {
    let years = i32::from(today.year()) - i32::from(date_of_birth.year());
    let birthday_reached =
        (today.month(), today.day()) >= (date_of_birth.month(), date_of_birth.day());
    let age = if birthday_reached { years } else { years - 1 };

    u16::try_from(age).unwrap_or(0)
}
