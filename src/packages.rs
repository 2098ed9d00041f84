//! Packages
//!
//! Read-only catalog entries a club offers, with their activities and schedules.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{people::Gender, schedules::Schedule, uuids::TypedUuid};

new_key_type! {
    /// Package Key
    pub struct PackageKey;
}

/// Package UUID
pub type PackageUuid = TypedUuid<Package<'static>>;

/// Who a package is open to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderRestriction {
    /// Male members only
    Male,

    /// Female members only
    Female,

    /// Open to everyone
    Mixed,
}

impl GenderRestriction {
    /// The single gender this restriction requires, if any.
    #[must_use]
    pub const fn required_gender(self) -> Option<Gender> {
        match self {
            GenderRestriction::Male => Some(Gender::Male),
            GenderRestriction::Female => Some(Gender::Female),
            GenderRestriction::Mixed => None,
        }
    }
}

/// An activity inside a package.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity<'a> {
    /// Activity title
    pub title: String,

    /// Standalone price, used when composing a custom package
    pub price: Option<Money<'a, Currency>>,

    /// Weekly slots
    pub schedules: SmallVec<[Schedule; 4]>,
}

impl<'a> Activity<'a> {
    /// Creates an activity with the given schedules and no standalone price.
    pub fn new(title: impl Into<String>, schedules: impl IntoIterator<Item = Schedule>) -> Self {
        Self {
            title: title.into(),
            price: None,
            schedules: schedules.into_iter().collect(),
        }
    }

    /// Sets the standalone price.
    #[must_use]
    pub fn with_price(mut self, price: Money<'a, Currency>) -> Self {
        self.price = Some(price);
        self
    }
}

/// Package
#[derive(Debug, Clone, PartialEq)]
pub struct Package<'a> {
    /// External identity
    pub uuid: PackageUuid,

    /// Package name
    pub name: String,

    /// Price for one period
    pub price: Money<'a, Currency>,

    /// Period length in months
    pub duration_months: u16,

    /// Inclusive minimum age
    pub age_min: Option<u16>,

    /// Inclusive maximum age
    pub age_max: Option<u16>,

    /// Gender restriction; `None` behaves like [`GenderRestriction::Mixed`]
    pub gender_restriction: Option<GenderRestriction>,

    /// Activities included in the package
    pub activities: Vec<Activity<'a>>,
}

impl<'a> Package<'a> {
    /// Creates an unrestricted package with no activities.
    pub fn new(name: impl Into<String>, price: Money<'a, Currency>, duration_months: u16) -> Self {
        Self {
            uuid: PackageUuid::now_v7(),
            name: name.into(),
            price,
            duration_months,
            age_min: None,
            age_max: None,
            gender_restriction: None,
            activities: Vec::new(),
        }
    }

    /// Sets the inclusive age bounds.
    #[must_use]
    pub fn with_ages(mut self, age_min: Option<u16>, age_max: Option<u16>) -> Self {
        self.age_min = age_min;
        self.age_max = age_max;
        self
    }

    /// Sets the gender restriction.
    #[must_use]
    pub fn with_gender_restriction(mut self, restriction: GenderRestriction) -> Self {
        self.gender_restriction = Some(restriction);
        self
    }

    /// Adds an activity.
    #[must_use]
    pub fn with_activity(mut self, activity: Activity<'a>) -> Self {
        self.activities.push(activity);
        self
    }
}

/// Errors raised while assembling a catalog.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// Two packages share the same UUID.
    #[error("package {0} is already in the catalog")]
    DuplicatePackage(PackageUuid),

    /// A package has a negative price.
    #[error("package {0} has a negative price")]
    NegativePrice(String),
}

/// In-memory view of a club's package catalog.
#[derive(Debug, Default)]
pub struct Catalog<'a> {
    packages: SlotMap<PackageKey, Package<'a>>,
    keys: FxHashMap<PackageUuid, PackageKey>,
}

impl<'a> Catalog<'a> {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            packages: SlotMap::with_key(),
            keys: FxHashMap::default(),
        }
    }

    /// Builds a catalog from packages supplied by the catalog collaborator.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if a package is duplicated or negatively priced.
    pub fn with_packages(
        packages: impl IntoIterator<Item = Package<'a>>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();

        for package in packages {
            catalog.insert(package)?;
        }

        Ok(catalog)
    }

    /// Adds a package, returning its key.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if a package is duplicated or negatively priced.
    pub fn insert(&mut self, package: Package<'a>) -> Result<PackageKey, CatalogError> {
        if self.keys.contains_key(&package.uuid) {
            return Err(CatalogError::DuplicatePackage(package.uuid));
        }

        if *package.price.amount() < Decimal::ZERO {
            return Err(CatalogError::NegativePrice(package.name));
        }

        let uuid = package.uuid;
        let key = self.packages.insert(package);

        self.keys.insert(uuid, key);

        Ok(key)
    }

    /// Look up a package by key.
    #[must_use]
    pub fn get(&self, key: PackageKey) -> Option<&Package<'a>> {
        self.packages.get(key)
    }

    /// Look up a package key by its external UUID.
    #[must_use]
    pub fn key_for(&self, uuid: PackageUuid) -> Option<PackageKey> {
        self.keys.get(&uuid).copied()
    }

    /// Look up a package key by name.
    #[must_use]
    pub fn key_named(&self, name: &str) -> Option<PackageKey> {
        self.packages
            .iter()
            .find(|(_key, package)| package.name == name)
            .map(|(key, _package)| key)
    }

    /// Iterate over all packages.
    pub fn iter(&self) -> impl Iterator<Item = (PackageKey, &Package<'a>)> {
        self.packages.iter()
    }

    /// Number of packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
