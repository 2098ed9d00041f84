//! Turnstile prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    clubs::{Club, ClubUuid},
    collaborators::{
        CollaboratorError, Collaborators, CommittedBatch, CommittedEnrollment, Enrollment,
        FeeConfigSource, Member, MembershipStore, NewEnrollment, NewMember, NotificationSender,
        PackageCatalog, PaymentEvidence, ProfileStore, Recipient, TransactionLedger,
        WorkflowTrigger,
    },
    conflicts::{PersonConflicts, ScheduleConflict, detect, detect_for_registrants},
    discounts::{BUNDLE_DISCOUNT_RATE, BUNDLE_MIN_ACTIVITIES, DiscountError},
    eligibility::{EligibilityResult, MissingBirthDatePolicy, evaluate, evaluate_person},
    fees::{ClubDiscount, ClubFeeConfig},
    fixtures::{Fixture, FixtureError},
    packages::{
        Activity, Catalog, CatalogError, GenderRestriction, Package, PackageKey, PackageUuid,
    },
    people::{Gender, Person, PersonUuid},
    pricing::{
        PriceLine, PricingError, PricingResult, format_amount, price, price_custom_package,
        total_price,
    },
    receipt::{Receipt, ReceiptError},
    registrants::{
        ContactInfo, MembershipType, Registrant, RegistrantKind, RegistrantUuid, Selection,
    },
    registration::{
        AccountOrigin, AvailablePackage, DEFAULT_HOOK_ATTEMPTS, HookFailure, PaymentDetails,
        Registration, RegistrationContext, RegistrationError, Step, SubmissionError,
        SubmissionReport, ValidationError,
    },
    schedules::{DayOfWeek, Schedule},
    uuids::TypedUuid,
};
