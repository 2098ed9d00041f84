//! Eligibility
//!
//! Decides whether a person may enroll in a package based on the package's
//! age bounds and gender restriction.

use jiff::civil::Date;

use crate::{
    packages::Package,
    people::{Gender, Person},
};

/// What to do when a person has no date of birth on file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingBirthDatePolicy {
    /// Skip the age rules, as if they were satisfied.
    #[default]
    Permit,

    /// Treat the person as ineligible for any age-bounded package.
    Block,
}

/// Outcome of an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityResult {
    /// Whether the person may enroll
    pub eligible: bool,

    /// Human-readable reason when ineligible
    pub reason: Option<String>,
}

impl EligibilityResult {
    /// An eligible result.
    #[must_use]
    pub const fn eligible() -> Self {
        Self {
            eligible: true,
            reason: None,
        }
    }

    /// An ineligible result with the given reason.
    pub fn ineligible(reason: impl Into<String>) -> Self {
        Self {
            eligible: false,
            reason: Some(reason.into()),
        }
    }
}

/// Evaluate a person's age and gender against a package.
///
/// Rules apply in order: minimum age, maximum age, gender. The first failing
/// rule decides the reason. An unknown age (`None`) satisfies both age rules.
#[must_use]
pub fn evaluate(age: Option<u16>, gender: Gender, package: &Package<'_>) -> EligibilityResult {
    if let (Some(age), Some(min)) = (age, package.age_min)
        && age < min
    {
        return EligibilityResult::ineligible(format!("Minimum age for this package is {min}"));
    }

    if let (Some(age), Some(max)) = (age, package.age_max)
        && age > max
    {
        return EligibilityResult::ineligible(format!("Maximum age for this package is {max}"));
    }

    if let Some(required) = package
        .gender_restriction
        .and_then(|restriction| restriction.required_gender())
        && required != gender
    {
        return EligibilityResult::ineligible(format!(
            "This package is for {required} members only"
        ));
    }

    EligibilityResult::eligible()
}

/// Evaluate a person against a package on `today`, applying `policy` when the
/// date of birth is missing.
#[must_use]
pub fn evaluate_person(
    person: &Person,
    package: &Package<'_>,
    today: Date,
    policy: MissingBirthDatePolicy,
) -> EligibilityResult {
    let age = person.age_on(today);
    let age_bounded = package.age_min.is_some() || package.age_max.is_some();

    if age.is_none() && age_bounded && policy == MissingBirthDatePolicy::Block {
        return EligibilityResult::ineligible(
            "A date of birth is required to check the age limits of this package",
        );
    }

    evaluate(age, person.gender, package)
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use rusty_money::{Money, iso::GBP};

    use crate::packages::GenderRestriction;

    use super::*;

    fn junior_package() -> Package<'static> {
        Package::new("Juniors", Money::from_minor(40_00, GBP), 1).with_ages(Some(6), Some(12))
    }

    #[test]
    fn age_bounds_are_inclusive() {
        let package = junior_package();

        assert!(!evaluate(Some(5), Gender::Male, &package).eligible, "5 is too young");
        assert!(evaluate(Some(6), Gender::Male, &package).eligible, "6 is the minimum");
        assert!(evaluate(Some(12), Gender::Male, &package).eligible, "12 is the maximum");
        assert!(!evaluate(Some(13), Gender::Male, &package).eligible, "13 is too old");
    }

    #[test]
    fn reasons_name_the_violated_bound() {
        let package = junior_package();

        assert_eq!(
            evaluate(Some(5), Gender::Male, &package).reason.as_deref(),
            Some("Minimum age for this package is 6")
        );
        assert_eq!(
            evaluate(Some(13), Gender::Male, &package).reason.as_deref(),
            Some("Maximum age for this package is 12")
        );
    }

    #[test]
    fn gender_restriction_rejects_other_gender_regardless_of_age() {
        let package = Package::new("Men's Boxing", Money::from_minor(50_00, GBP), 1)
            .with_gender_restriction(GenderRestriction::Male);

        let result = evaluate(Some(30), Gender::Female, &package);

        assert!(!result.eligible, "female registrant must be rejected");
        assert_eq!(
            result.reason.as_deref(),
            Some("This package is for male members only")
        );

        assert!(!evaluate(None, Gender::Female, &package).eligible, "age does not matter");
        assert!(evaluate(Some(30), Gender::Male, &package).eligible, "male accepted");
    }

    #[test]
    fn mixed_or_absent_restriction_accepts_everyone() {
        let mixed = Package::new("Yoga", Money::from_minor(30_00, GBP), 1)
            .with_gender_restriction(GenderRestriction::Mixed);
        let open = Package::new("Pilates", Money::from_minor(30_00, GBP), 1);

        for gender in [Gender::Male, Gender::Female] {
            assert!(evaluate(Some(30), gender, &mixed).eligible, "mixed accepts {gender}");
            assert!(evaluate(Some(30), gender, &open).eligible, "open accepts {gender}");
        }
    }

    #[test]
    fn unknown_age_skips_age_rules() {
        let result = evaluate(None, Gender::Female, &junior_package());

        assert_eq!(result, EligibilityResult::eligible());
    }

    #[test]
    fn evaluation_is_repeatable() {
        let package = junior_package();

        assert_eq!(
            evaluate(Some(13), Gender::Female, &package),
            evaluate(Some(13), Gender::Female, &package)
        );
    }

    #[test]
    fn missing_birth_date_follows_policy() {
        let person = Person::new("Alex", None, Gender::Female);
        let today = date(2024, 6, 1);
        let package = junior_package();

        let permitted = evaluate_person(&person, &package, today, MissingBirthDatePolicy::Permit);
        let blocked = evaluate_person(&person, &package, today, MissingBirthDatePolicy::Block);

        assert!(permitted.eligible, "permissive policy lets the person through");
        assert!(!blocked.eligible, "blocking policy requires a date of birth");
    }

    #[test]
    fn block_policy_ignores_packages_without_age_bounds() {
        let person = Person::new("Alex", None, Gender::Female);
        let package = Package::new("Open Gym", Money::from_minor(25_00, GBP), 1);

        let result =
            evaluate_person(&person, &package, date(2024, 6, 1), MissingBirthDatePolicy::Block);

        assert!(result.eligible, "no age bounds means nothing to check");
    }

    #[test]
    fn person_age_is_computed_from_birth_date() {
        let person = Person::new("Jo", Some(date(2016, 3, 14)), Gender::Male);
        let package = junior_package();

        let policy = MissingBirthDatePolicy::Permit;

        let young = evaluate_person(&person, &package, date(2021, 6, 1), policy);
        let fits = evaluate_person(&person, &package, date(2024, 6, 1), policy);

        assert!(!young.eligible, "5 years old on 2021-06-01");
        assert!(fits.eligible, "8 years old on 2024-06-01");
    }
}
