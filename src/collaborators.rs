//! Collaborators
//!
//! External systems the registration flow talks to. Each is an async trait
//! with a generated mock, so the flow can be driven without any real storage,
//! mail or workflow backend behind it.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::civil::Date;
use mockall::automock;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    clubs::ClubUuid,
    fees::ClubFeeConfig,
    packages::{Package, PackageUuid},
    people::{Person, PersonUuid},
    receipt::Receipt,
    registrants::{ContactInfo, MembershipType, RegistrantUuid},
    uuids::TypedUuid,
};

/// Member UUID
pub type MemberUuid = TypedUuid<Member>;

/// Enrollment UUID
pub type EnrollmentUuid = TypedUuid<Enrollment>;

/// Failure reported by an external collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The collaborator could not be reached.
    #[error("service unavailable")]
    Unavailable,

    /// The requested record does not exist.
    #[error("record not found")]
    NotFound,

    /// The collaborator refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// How the batch is being paid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvidence {
    /// Reference to an uploaded proof of payment
    Proof(String),

    /// Payment is settled later at the club
    PayLater,
}

/// Member record to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMember {
    /// Club the membership belongs to
    pub club: ClubUuid,

    /// Person becoming a member
    pub person: PersonUuid,

    /// Membership type
    pub membership_type: MembershipType,

    /// Contact details, for self-enrolling adults
    pub contact: Option<ContactInfo>,
}

/// Member Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Member identity
    pub uuid: MemberUuid,

    /// Club the membership belongs to
    pub club: ClubUuid,

    /// Member person
    pub person: PersonUuid,
}

/// Package enrollment to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEnrollment {
    /// Enrolled member
    pub member: MemberUuid,

    /// Enrolled package
    pub package: PackageUuid,

    /// First day of the enrollment
    pub start: Date,

    /// Day the enrollment lapses
    pub end: Date,

    /// Package price charged
    pub price: Money<'static, Currency>,

    /// Payment evidence for the batch
    pub payment: PaymentEvidence,
}

/// Enrollment Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    /// Enrollment identity
    pub uuid: EnrollmentUuid,

    /// Enrolled member
    pub member: MemberUuid,

    /// Enrolled package
    pub package: PackageUuid,

    /// First day of the enrollment
    pub start: Date,

    /// Day the enrollment lapses
    pub end: Date,
}

/// A registrant whose member and enrollment records were both created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedEnrollment {
    /// Registrant within the run
    pub registrant: RegistrantUuid,

    /// Person enrolled; for new children, the newly created profile
    pub person: PersonUuid,

    /// Created member record
    pub member: Member,

    /// Created enrollment record
    pub enrollment: Enrollment,
}

/// Everything committed by one successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedBatch {
    /// Club enrolled into
    pub club: ClubUuid,

    /// Committed registrants, in submission order
    pub enrollments: Vec<CommittedEnrollment>,

    /// Amount payable for the batch
    pub grand_total: Money<'static, Currency>,

    /// Payment evidence for the batch
    pub payment: PaymentEvidence,
}

/// Who a receipt is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Display name
    pub name: String,

    /// Email address
    pub email: String,
}

/// Source of the packages a club offers.
#[automock]
#[async_trait]
pub trait PackageCatalog: Send + Sync {
    /// Lists every package offered by `club`.
    async fn packages(&self, club: ClubUuid) -> Result<Vec<Package<'static>>, CollaboratorError>;
}

/// Person profiles.
#[automock]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Retrieves a single person.
    async fn person(&self, id: PersonUuid) -> Result<Person, CollaboratorError>;

    /// Creates a child profile under `guardian`, returning the stored person.
    async fn create_child(
        &self,
        guardian: PersonUuid,
        child: Person,
    ) -> Result<Person, CollaboratorError>;
}

/// Member and enrollment records.
#[automock]
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Creates a member record.
    async fn create_member(&self, member: NewMember) -> Result<Member, CollaboratorError>;

    /// Creates a package enrollment for an existing member.
    async fn create_enrollment(
        &self,
        enrollment: NewEnrollment,
    ) -> Result<Enrollment, CollaboratorError>;

    /// Whether `person` currently holds an active membership at `club`.
    async fn has_active_membership(
        &self,
        club: ClubUuid,
        person: PersonUuid,
    ) -> Result<bool, CollaboratorError>;

    /// Whether `person` is currently enrolled in `package`.
    async fn has_active_enrollment(
        &self,
        person: PersonUuid,
        package: PackageUuid,
    ) -> Result<bool, CollaboratorError>;
}

/// Club fee configuration.
#[automock]
#[async_trait]
pub trait FeeConfigSource: Send + Sync {
    /// Retrieves the fee configuration of `club`.
    async fn fee_config(&self, club: ClubUuid)
    -> Result<ClubFeeConfig<'static>, CollaboratorError>;
}

/// Receipt delivery.
#[automock]
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Sends `receipt` to `recipient`.
    async fn send_receipt(
        &self,
        recipient: Recipient,
        receipt: Receipt<'static>,
    ) -> Result<(), CollaboratorError>;
}

/// Downstream workflow automation.
#[automock]
#[async_trait]
pub trait WorkflowTrigger: Send + Sync {
    /// Signals that `batch` was registered.
    async fn registration_completed(&self, batch: CommittedBatch) -> Result<(), CollaboratorError>;
}

/// Financial transaction records.
#[automock]
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Records the payment of `batch`.
    async fn record(&self, batch: CommittedBatch) -> Result<(), CollaboratorError>;
}

/// The full set of collaborators a registration needs.
#[derive(Clone)]
pub struct Collaborators {
    /// Package catalog
    pub catalog: Arc<dyn PackageCatalog>,

    /// Profile store
    pub profiles: Arc<dyn ProfileStore>,

    /// Membership store
    pub memberships: Arc<dyn MembershipStore>,

    /// Fee configuration source
    pub fees: Arc<dyn FeeConfigSource>,

    /// Receipt delivery
    pub notifications: Arc<dyn NotificationSender>,

    /// Workflow automation
    pub workflows: Arc<dyn WorkflowTrigger>,

    /// Transaction ledger
    pub ledger: Arc<dyn TransactionLedger>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
