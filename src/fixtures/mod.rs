//! Fixtures
//!
//! Loads clubs, catalogs and people from YAML files laid out as
//! `{base}/clubs/{name}.yml`, `{base}/packages/{name}.yml` and
//! `{base}/people/{name}.yml`.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    clubs::Club,
    fixtures::{clubs::ClubsFixture, packages::PackagesFixture, people::PeopleFixture},
    packages::{Activity, Catalog, CatalogError, Package, PackageKey},
    people::Person,
};

pub mod clubs;
pub mod packages;
pub mod people;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Invalid time format
    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between the club and its packages
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Package not found
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// Activity not found
    #[error("Activity not found: {0}")]
    ActivityNotFound(String),

    /// Person not found
    #[error("Person not found: {0}")]
    PersonNotFound(String),

    /// No club loaded yet
    #[error("No club loaded")]
    NoClub,

    /// Catalog assembly error
    #[error("Failed to build catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Club the fixture set belongs to
    club: Option<Club<'a>>,

    /// Packages, in file order
    catalog: Catalog<'a>,

    /// String key -> catalog key mappings for lookups
    package_keys: FxHashMap<String, PackageKey>,

    /// Activities by string key, including ones no package references
    activities: FxHashMap<String, Activity<'a>>,

    /// People by string key
    people: FxHashMap<String, Person>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl<'a> Fixture<'a> {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            club: None,
            catalog: Catalog::new(),
            package_keys: FxHashMap::default(),
            activities: FxHashMap::default(),
            people: FxHashMap::default(),
            currency: None,
        }
    }

    /// Load a club from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or if its currency
    /// differs from packages already loaded.
    pub fn load_club(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = fs::read_to_string(self.path("clubs", name))?;
        let fixture: ClubsFixture = serde_norway::from_str(&contents)?;

        let club: Club<'a> = fixture.club.try_into()?;

        self.track_currency(club.fees.currency)?;
        self.club = Some(club);

        Ok(self)
    }

    /// Load activities and packages from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, references an
    /// unknown activity, or if there are currency mismatches.
    pub fn load_packages(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = fs::read_to_string(self.path("packages", name))?;
        let fixture: PackagesFixture = serde_norway::from_str(&contents)?;

        for (key, activity_fixture) in fixture.activities {
            if let Some(currency) = activity_fixture.currency()? {
                self.track_currency(currency)?;
            }

            self.activities.insert(key, activity_fixture.try_into()?);
        }

        for package_fixture in fixture.packages {
            self.track_currency(package_fixture.currency()?)?;

            let key = package_fixture.key.clone();
            let package = package_fixture.into_package(&self.activities)?;
            let package_key = self.catalog.insert(package)?;

            self.package_keys.insert(key, package_key);
        }

        Ok(self)
    }

    /// Load people from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_people(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = fs::read_to_string(self.path("people", name))?;
        let fixture: PeopleFixture = serde_norway::from_str(&contents)?;

        self.people.extend(
            fixture
                .people
                .into_iter()
                .map(|(key, person)| (key, Person::from(person))),
        );

        Ok(self)
    }

    /// Load a complete fixture set (club, packages, and people with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture
            .load_club(name)?
            .load_packages(name)?
            .load_people(name)?;

        Ok(fixture)
    }

    /// Get the loaded club
    ///
    /// # Errors
    ///
    /// Returns an error if no club has been loaded.
    pub fn club(&self) -> Result<&Club<'a>, FixtureError> {
        self.club.as_ref().ok_or(FixtureError::NoClub)
    }

    /// Get the catalog of loaded packages
    pub fn catalog(&self) -> &Catalog<'a> {
        &self.catalog
    }

    /// Clones of the loaded packages, in file order
    pub fn packages(&self) -> Vec<Package<'a>> {
        self.catalog
            .iter()
            .map(|(_key, package)| package.clone())
            .collect()
    }

    /// Get a package key by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the package is not found.
    pub fn package_key(&self, key: &str) -> Result<PackageKey, FixtureError> {
        self.package_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::PackageNotFound(key.to_string()))
    }

    /// Get a package by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the package is not found.
    pub fn package(&self, key: &str) -> Result<&Package<'a>, FixtureError> {
        self.catalog
            .get(self.package_key(key)?)
            .ok_or_else(|| FixtureError::PackageNotFound(key.to_string()))
    }

    /// Get an activity by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the activity is not found.
    pub fn activity(&self, key: &str) -> Result<&Activity<'a>, FixtureError> {
        self.activities
            .get(key)
            .ok_or_else(|| FixtureError::ActivityNotFound(key.to_string()))
    }

    /// Get a person by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the person is not found.
    pub fn person(&self, key: &str) -> Result<&Person, FixtureError> {
        self.people
            .get(key)
            .ok_or_else(|| FixtureError::PersonNotFound(key.to_string()))
    }

    /// Currency of the fixture set, once anything priced is loaded
    pub fn currency(&self) -> Option<&'static Currency> {
        self.currency
    }

    fn path(&self, kind: &str, name: &str) -> PathBuf {
        self.base_path.join(kind).join(format!("{name}.yml"))
    }

    fn track_currency(&mut self, currency: &'static Currency) -> Result<(), FixtureError> {
        match self.currency {
            Some(existing) if existing != currency => Err(FixtureError::CurrencyMismatch(
                existing.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            )),
            Some(_) => Ok(()),
            None => {
                self.currency = Some(currency);

                Ok(())
            }
        }
    }
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::GBP};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn from_set_loads_riverside() -> TestResult {
        let fixture = Fixture::from_set("riverside")?;

        let club = fixture.club()?;
        assert_eq!(club.name, "Riverside Sports Club");
        assert_eq!(club.fees.enrollment_fee, Money::from_minor(20_00, GBP));
        assert_eq!(fixture.currency(), Some(GBP));

        let swim = fixture.package("kids-swim")?;
        assert_eq!(swim.name, "Kids Swim");
        assert_eq!(swim.price, Money::from_minor(60_00, GBP));
        assert_eq!(swim.age_min, Some(5));
        assert_eq!(swim.age_max, Some(12));

        assert_eq!(fixture.person("kit")?.name, "Kit");
        assert_eq!(fixture.activity("yoga")?.title, "Yoga");

        Ok(())
    }

    #[test]
    fn packages_keep_file_order() -> TestResult {
        let fixture = Fixture::from_set("riverside")?;

        let names: Vec<_> = fixture
            .packages()
            .into_iter()
            .map(|package| package.name)
            .collect();

        assert_eq!(
            names,
            ["Kids Swim", "Kids Judo", "Adult Fitness", "Ladies Yoga"]
        );

        Ok(())
    }

    #[test]
    fn missing_lookups_return_errors() -> TestResult {
        let fixture = Fixture::from_set("riverside")?;

        assert!(matches!(
            fixture.package("missing"),
            Err(FixtureError::PackageNotFound(_))
        ));
        assert!(matches!(
            fixture.activity("missing"),
            Err(FixtureError::ActivityNotFound(_))
        ));
        assert!(matches!(
            fixture.person("missing"),
            Err(FixtureError::PersonNotFound(_))
        ));

        Ok(())
    }

    #[test]
    fn club_missing_before_load() {
        let fixture = Fixture::new();

        assert!(matches!(fixture.club(), Err(FixtureError::NoClub)));
    }

    #[test]
    fn missing_file_returns_io_error() {
        let mut fixture = Fixture::new();

        let result = fixture.load_packages("does-not-exist");

        assert!(matches!(result, Err(FixtureError::Io(_))));
    }

    #[test]
    fn currency_mismatch_is_rejected() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("clubs"))?;
        fs::create_dir_all(dir.path().join("packages"))?;

        fs::write(
            dir.path().join("clubs").join("mixed.yml"),
            "club:\n  name: Mixed\n  enrollment_fee: 20 GBP\n",
        )?;
        fs::write(
            dir.path().join("packages").join("mixed.yml"),
            "packages:\n  - key: swim\n    name: Swim\n    price: 60 USD\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());
        fixture.load_club("mixed")?;

        let result = fixture.load_packages("mixed");

        assert!(matches!(
            result,
            Err(FixtureError::CurrencyMismatch(expected, found)) if expected == "GBP" && found == "USD"
        ));

        Ok(())
    }

    #[test]
    fn fixture_default_matches_new() {
        let fixture = Fixture::default();

        assert_eq!(fixture.base_path, PathBuf::from("./fixtures"));
        assert!(fixture.catalog.is_empty());
        assert!(fixture.people.is_empty());
    }
}
