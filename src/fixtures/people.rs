//! People Fixtures

use jiff::civil::Date;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::people::{Gender, Person};

/// Wrapper for people in YAML
#[derive(Debug, Deserialize)]
pub struct PeopleFixture {
    /// People keyed by fixture name
    pub people: FxHashMap<String, PersonFixture>,
}

/// Person Fixture
#[derive(Debug, Deserialize)]
pub struct PersonFixture {
    /// Display name
    pub name: String,

    /// Date of birth ("YYYY-MM-DD")
    #[serde(default)]
    pub date_of_birth: Option<Date>,

    /// Gender
    pub gender: Gender,

    /// Nationality
    #[serde(default)]
    pub nationality: Option<String>,
}

impl From<PersonFixture> for Person {
    fn from(fixture: PersonFixture) -> Self {
        let mut person = Person::new(fixture.name, fixture.date_of_birth, fixture.gender);

        if let Some(nationality) = fixture.nationality {
            person.nationality = nationality;
        }

        person
    }
}
