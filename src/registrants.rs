//! Registrants
//!
//! A registrant is one person being enrolled into one package during a
//! registration run. Adults enrolling themselves must carry contact details;
//! children are enrolled by a guardian.

use std::fmt;

use jiff::civil::Date;
use smallvec::SmallVec;

use crate::{
    eligibility::{EligibilityResult, MissingBirthDatePolicy, evaluate_person},
    packages::{Package, PackageKey},
    people::{Person, PersonUuid},
    uuids::TypedUuid,
};

/// Registrant UUID
pub type RegistrantUuid = TypedUuid<Registrant>;

/// Membership type tag chosen at the start of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipType {
    /// The account holder enrolls themselves
    Myself,

    /// A guardian enrolls one or more children
    Child,
}

impl fmt::Display for MembershipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipType::Myself => write!(f, "self"),
            MembershipType::Child => write!(f, "child"),
        }
    }
}

/// Contact details required for a self-enrolling adult.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactInfo {
    /// Email address
    pub email: String,

    /// Phone number, without country code
    pub phone: String,

    /// Dialling code, e.g. `+44`
    pub country_code: String,

    /// Postal address
    pub address: Option<String>,
}

impl ContactInfo {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> SmallVec<[&'static str; 3]> {
        [
            ("email", &self.email),
            ("phone", &self.phone),
            ("country code", &self.country_code),
        ]
        .into_iter()
        .filter(|(_name, value)| value.trim().is_empty())
        .map(|(name, _value)| name)
        .collect()
    }
}

/// Variant-specific registrant data.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrantKind {
    /// An adult enrolling themselves.
    Myself {
        /// Contact details
        contact: ContactInfo,
    },

    /// A child enrolled by a guardian.
    Child {
        /// The guardian acting for the child
        guardian: PersonUuid,

        /// Whether the child's profile must be created on submission
        new_record: bool,
    },
}

/// A resolved package choice, with the eligibility computed when it was made.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Chosen package
    pub package: PackageKey,

    /// Eligibility of the person for `package`
    pub eligibility: EligibilityResult,
}

/// Registrant
#[derive(Debug, Clone, PartialEq)]
pub struct Registrant {
    uuid: RegistrantUuid,
    person: Person,
    kind: RegistrantKind,
    selection: Option<Selection>,
}

impl Registrant {
    /// An adult enrolling themselves.
    #[must_use]
    pub fn myself(person: Person, contact: ContactInfo) -> Self {
        Self::with_kind(person, RegistrantKind::Myself { contact })
    }

    /// A child whose profile already exists.
    #[must_use]
    pub fn child(person: Person, guardian: PersonUuid) -> Self {
        Self::with_kind(
            person,
            RegistrantKind::Child {
                guardian,
                new_record: false,
            },
        )
    }

    /// A freshly entered child whose profile is created on submission.
    #[must_use]
    pub fn new_child(person: Person, guardian: PersonUuid) -> Self {
        Self::with_kind(
            person,
            RegistrantKind::Child {
                guardian,
                new_record: true,
            },
        )
    }

    fn with_kind(person: Person, kind: RegistrantKind) -> Self {
        Self {
            uuid: RegistrantUuid::now_v7(),
            person,
            kind,
            selection: None,
        }
    }

    /// Registrant identity within the run.
    #[must_use]
    pub fn uuid(&self) -> RegistrantUuid {
        self.uuid
    }

    /// The person being enrolled.
    #[must_use]
    pub fn person(&self) -> &Person {
        &self.person
    }

    /// Variant-specific data.
    #[must_use]
    pub fn kind(&self) -> &RegistrantKind {
        &self.kind
    }

    /// Membership type tag.
    #[must_use]
    pub fn membership_type(&self) -> MembershipType {
        match self.kind {
            RegistrantKind::Myself { .. } => MembershipType::Myself,
            RegistrantKind::Child { .. } => MembershipType::Child,
        }
    }

    /// Contact details, for self-enrolling adults.
    #[must_use]
    pub fn contact(&self) -> Option<&ContactInfo> {
        match &self.kind {
            RegistrantKind::Myself { contact } => Some(contact),
            RegistrantKind::Child { .. } => None,
        }
    }

    /// Contact details, mutably, for self-enrolling adults.
    pub fn contact_mut(&mut self) -> Option<&mut ContactInfo> {
        match &mut self.kind {
            RegistrantKind::Myself { contact } => Some(contact),
            RegistrantKind::Child { .. } => None,
        }
    }

    /// The resolved package choice, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Whether a package has been resolved and the person is eligible for it.
    #[must_use]
    pub fn is_enrollable(&self) -> bool {
        self.selection
            .as_ref()
            .is_some_and(|selection| selection.eligibility.eligible)
    }

    /// Resolve `package` for this registrant, evaluating eligibility on `today`.
    ///
    /// The selection is stored whether or not the person is eligible, so the
    /// reason can be shown next to the registrant.
    pub fn select_package(
        &mut self,
        key: PackageKey,
        package: &Package<'_>,
        today: Date,
        policy: MissingBirthDatePolicy,
    ) -> &EligibilityResult {
        let eligibility = evaluate_person(&self.person, package, today, policy);

        &self
            .selection
            .insert(Selection {
                package: key,
                eligibility,
            })
            .eligibility
    }

    /// Drop the resolved package.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use rusty_money::{Money, iso::GBP};
    use testresult::TestResult;

    use crate::{packages::Catalog, people::Gender};

    use super::*;

    #[test]
    fn contact_reports_blank_required_fields() {
        let contact = ContactInfo {
            email: "sam@example.com".to_string(),
            phone: "  ".to_string(),
            country_code: String::new(),
            address: None,
        };

        assert_eq!(contact.missing_fields().as_slice(), &["phone", "country code"]);
    }

    #[test]
    fn only_self_registrants_carry_contact_details() {
        let adult = Registrant::myself(
            Person::new("Sam", None, Gender::Male),
            ContactInfo::default(),
        );
        let child = Registrant::child(Person::new("Kit", None, Gender::Female), adult.person().uuid);

        assert_eq!(adult.membership_type(), MembershipType::Myself);
        assert!(adult.contact().is_some(), "self registrant has contact");
        assert_eq!(child.membership_type(), MembershipType::Child);
        assert!(child.contact().is_none(), "child has no contact of its own");
    }

    #[test]
    fn selecting_a_package_records_eligibility() -> TestResult {
        let mut catalog = Catalog::new();
        let key = catalog.insert(
            Package::new("Kids Swim", Money::from_minor(60_00, GBP), 1).with_ages(Some(5), Some(10)),
        )?;
        let package = catalog.get(key).ok_or("missing package")?;

        let guardian = PersonUuid::now_v7();
        let mut child = Registrant::new_child(
            Person::new("Kit", Some(date(2012, 1, 1)), Gender::Female),
            guardian,
        );

        let result = child
            .select_package(key, package, date(2024, 6, 1), MissingBirthDatePolicy::Permit)
            .clone();

        assert!(!result.eligible, "12 is above the maximum of 10");
        assert!(!child.is_enrollable(), "ineligible selections are not enrollable");
        assert_eq!(child.selection().map(|s| s.package), Some(key));

        child.clear_selection();

        assert!(child.selection().is_none(), "selection cleared");

        Ok(())
    }
}
