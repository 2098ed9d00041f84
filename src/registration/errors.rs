//! Registration errors

use thiserror::Error;

use crate::{
    collaborators::{CollaboratorError, CommittedEnrollment},
    conflicts::ScheduleConflict,
    packages::{CatalogError, PackageUuid},
    pricing::PricingError,
    registrants::{MembershipType, RegistrantUuid},
    registration::Step,
};

/// A step validator rejected a forward transition.
///
/// These are user-facing: the flow stays where it is and the message can be
/// shown next to the offending registrant or field.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// No membership type has been chosen.
    #[error("choose who the membership is for")]
    NoMembershipType,

    /// The registrant list is empty.
    #[error("add at least one person to register")]
    NoRegistrants,

    /// A registrant does not match the chosen membership type.
    #[error("{name} does not fit a {expected} membership")]
    MembershipTypeMismatch {
        /// Offending registrant
        registrant: RegistrantUuid,

        /// Person name
        name: String,

        /// Chosen membership type
        expected: MembershipType,
    },

    /// A registrant has no package.
    #[error("choose a package for {name}")]
    MissingPackage {
        /// Offending registrant
        registrant: RegistrantUuid,

        /// Person name
        name: String,
    },

    /// A registrant is not eligible for the chosen package.
    #[error("{reason}")]
    Ineligible {
        /// Offending registrant
        registrant: RegistrantUuid,

        /// Reason from the eligibility check
        reason: String,
    },

    /// A required contact field is blank.
    #[error("{field} is required for {name}")]
    MissingContact {
        /// Offending registrant
        registrant: RegistrantUuid,

        /// Person name
        name: String,

        /// Blank field
        field: &'static str,
    },

    /// A person's selected activities overlap.
    #[error("{person}: {conflict}")]
    ScheduleConflict {
        /// Person name
        person: String,

        /// First conflict found for the person
        conflict: ScheduleConflict,
    },

    /// Neither payment proof nor pay-later was given.
    #[error("upload a proof of payment or choose to pay later")]
    MissingPayment,
}

/// A post-commit hook that failed on every attempt. Never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{hook} failed after {attempts} attempt(s): {error}")]
pub struct HookFailure {
    /// Hook name
    pub hook: &'static str,

    /// Attempts made
    pub attempts: u8,

    /// Error from the last attempt
    pub error: CollaboratorError,
}

/// Submission stopped before every registrant was committed.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Creating a profile, member or enrollment failed.
    ///
    /// Registrants in `committed` were fully written and stay written. The
    /// post-commit hooks have already run for them.
    #[error("registering {registrant} failed after {} committed", committed.len())]
    Fatal {
        /// Registrant being processed
        registrant: RegistrantUuid,

        /// Registrants committed before the failure
        committed: Vec<CommittedEnrollment>,

        /// Collaborator failure
        #[source]
        source: CollaboratorError,

        /// Hooks run for `committed` that failed on every attempt
        hook_failures: Vec<HookFailure>,
    },
}

/// Errors raised by registration flow operations.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The operation is not allowed at the current step.
    #[error("cannot {action} at the {step} step")]
    InvalidStep {
        /// Attempted operation
        action: &'static str,

        /// Current step
        step: Step,
    },

    /// The registrant is not part of this registration.
    #[error("registrant {0} is not part of this registration")]
    UnknownRegistrant(RegistrantUuid),

    /// Contact details were given for a child registrant.
    #[error("registrant {0} is a child and has no contact details of their own")]
    NoContactDetails(RegistrantUuid),

    /// The package is not offered by the club.
    #[error("package {0} is not offered by this club")]
    UnknownPackage(PackageUuid),

    /// An enrollment period runs past the supported date range.
    #[error("enrollment period of {months} months from {start} is out of range")]
    PeriodOutOfRange {
        /// Period start
        start: jiff::civil::Date,

        /// Period length
        months: u16,
    },

    /// The club's catalog could not be assembled.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Wrapped validation error.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Wrapped collaborator error.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// Wrapped pricing error.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Wrapped submission error.
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}
