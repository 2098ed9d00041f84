//! Submission
//!
//! Commits registrants one at a time, then runs the post-commit hooks. A
//! commit failure stops the batch; a hook failure is only reported.

use std::{fmt, num::NonZeroU8, sync::Arc};

use async_trait::async_trait;
use jiff::{Span, civil::Date};
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use tracing::{info, warn};

use crate::{
    clubs::ClubUuid,
    collaborators::{
        CollaboratorError, CommittedBatch, CommittedEnrollment, Member, MembershipStore,
        NewEnrollment, NewMember, NotificationSender, PaymentEvidence, ProfileStore, Recipient,
        TransactionLedger, WorkflowTrigger,
    },
    packages::PackageUuid,
    people::PersonUuid,
    receipt::Receipt,
    registrants::{Registrant, RegistrantKind},
    registration::errors::{HookFailure, RegistrationError, SubmissionError},
};

/// Outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionReport {
    /// Everything that was committed
    pub batch: CommittedBatch,

    /// Receipt for the batch
    pub receipt: Receipt<'static>,

    /// Hooks that failed on every attempt
    pub hook_failures: Vec<HookFailure>,
}

/// A registrant ready to be written, with its enrollment period resolved.
#[derive(Debug, Clone)]
pub(crate) struct PlannedEnrollment {
    pub(crate) registrant: Registrant,
    pub(crate) package: PackageUuid,
    pub(crate) price: Money<'static, Currency>,
    pub(crate) start: Date,
    pub(crate) end: Date,
}

/// Child profiles and member records already written, keyed by the person
/// the registrant was added with.
///
/// A person registered for several packages gets one child profile and one
/// member record. Survives a failed submission so a retry reuses them.
#[derive(Debug, Clone, Default)]
pub(crate) struct CreatedRecords {
    children: FxHashMap<PersonUuid, PersonUuid>,
    members: FxHashMap<PersonUuid, Member>,
}

/// Last day of an enrollment of `months` starting on `start`.
///
/// # Errors
///
/// Returns [`RegistrationError::PeriodOutOfRange`] if the end falls outside
/// the supported date range.
pub fn enrollment_end(start: Date, months: u16) -> Result<Date, RegistrationError> {
    Span::new()
        .try_months(months)
        .and_then(|span| start.checked_add(span))
        .map_err(|_err| RegistrationError::PeriodOutOfRange { start, months })
}

/// Writes each planned registrant: child profile when new, member record, then
/// enrollment. Profiles and members already in `created` are reused. Stops at
/// the first failure.
#[tracing::instrument(
    name = "registration.submission.commit",
    skip(profiles, memberships, created, plan, payment),
    fields(club = %club, registrants = plan.len()),
    err
)]
pub(crate) async fn commit(
    club: ClubUuid,
    profiles: &dyn ProfileStore,
    memberships: &dyn MembershipStore,
    created: &mut CreatedRecords,
    plan: &[PlannedEnrollment],
    payment: &PaymentEvidence,
) -> Result<Vec<CommittedEnrollment>, SubmissionError> {
    let mut committed = Vec::with_capacity(plan.len());

    for planned in plan {
        match commit_one(club, profiles, memberships, created, planned, payment).await {
            Ok(enrollment) => {
                info!(
                    registrant = %enrollment.registrant,
                    enrollment_uuid = %enrollment.enrollment.uuid,
                    "committed enrollment"
                );

                committed.push(enrollment);
            }
            Err(source) => {
                return Err(SubmissionError::Fatal {
                    registrant: planned.registrant.uuid(),
                    committed,
                    source,
                    hook_failures: Vec::new(),
                });
            }
        }
    }

    Ok(committed)
}

async fn commit_one(
    club: ClubUuid,
    profiles: &dyn ProfileStore,
    memberships: &dyn MembershipStore,
    created: &mut CreatedRecords,
    planned: &PlannedEnrollment,
    payment: &PaymentEvidence,
) -> Result<CommittedEnrollment, CollaboratorError> {
    let registrant = &planned.registrant;
    let source = registrant.person().uuid;

    let person = match registrant.kind() {
        RegistrantKind::Child {
            guardian,
            new_record: true,
        } => match created.children.get(&source) {
            Some(child) => *child,
            None => {
                let child = profiles
                    .create_child(*guardian, registrant.person().clone())
                    .await?
                    .uuid;

                created.children.insert(source, child);
                child
            }
        },
        RegistrantKind::Child { .. } | RegistrantKind::Myself { .. } => source,
    };

    let member = match created.members.get(&source) {
        Some(member) => member.clone(),
        None => {
            let member = memberships
                .create_member(NewMember {
                    club,
                    person,
                    membership_type: registrant.membership_type(),
                    contact: registrant.contact().cloned(),
                })
                .await?;

            created.members.insert(source, member.clone());
            member
        }
    };

    let enrollment = memberships
        .create_enrollment(NewEnrollment {
            member: member.uuid,
            package: planned.package,
            start: planned.start,
            end: planned.end,
            price: planned.price,
            payment: payment.clone(),
        })
        .await?;

    Ok(CommittedEnrollment {
        registrant: registrant.uuid(),
        person,
        member,
        enrollment,
    })
}

/// A best-effort side effect run after the batch is committed.
#[async_trait]
pub trait PostCommitHook: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Runs the hook once.
    async fn run(
        &self,
        batch: &CommittedBatch,
        receipt: &Receipt<'static>,
    ) -> Result<(), CollaboratorError>;
}

/// Signals the workflow trigger.
#[derive(Clone)]
pub struct WorkflowHook(pub Arc<dyn WorkflowTrigger>);

#[async_trait]
impl PostCommitHook for WorkflowHook {
    fn name(&self) -> &'static str {
        "workflow"
    }

    async fn run(
        &self,
        batch: &CommittedBatch,
        _receipt: &Receipt<'static>,
    ) -> Result<(), CollaboratorError> {
        self.0.registration_completed(batch.clone()).await
    }
}

/// Records the batch in the transaction ledger.
#[derive(Clone)]
pub struct LedgerHook(pub Arc<dyn TransactionLedger>);

#[async_trait]
impl PostCommitHook for LedgerHook {
    fn name(&self) -> &'static str {
        "transactions"
    }

    async fn run(
        &self,
        batch: &CommittedBatch,
        _receipt: &Receipt<'static>,
    ) -> Result<(), CollaboratorError> {
        self.0.record(batch.clone()).await
    }
}

/// Emails the receipt.
#[derive(Clone)]
pub struct ReceiptHook {
    /// Delivery collaborator
    pub sender: Arc<dyn NotificationSender>,

    /// Who receives the receipt; without one the hook fails
    pub recipient: Option<Recipient>,
}

#[async_trait]
impl PostCommitHook for ReceiptHook {
    fn name(&self) -> &'static str {
        "receipt"
    }

    async fn run(
        &self,
        _batch: &CommittedBatch,
        receipt: &Receipt<'static>,
    ) -> Result<(), CollaboratorError> {
        let Some(recipient) = self.recipient.clone() else {
            return Err(CollaboratorError::Rejected(
                "no email address to send the receipt to".to_string(),
            ));
        };

        self.sender.send_receipt(recipient, receipt.clone()).await
    }
}

impl fmt::Debug for WorkflowHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WorkflowHook").finish_non_exhaustive()
    }
}

impl fmt::Debug for LedgerHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LedgerHook").finish_non_exhaustive()
    }
}

impl fmt::Debug for ReceiptHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiptHook")
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}

/// Runs every hook in order, each up to `attempts` times.
///
/// Returns the hooks that failed on every attempt. Nothing already committed
/// is undone.
#[tracing::instrument(
    name = "registration.submission.hooks",
    skip(hooks, batch, receipt),
    fields(club = %batch.club, hooks = hooks.len())
)]
pub async fn run_hooks(
    hooks: &[Box<dyn PostCommitHook>],
    batch: &CommittedBatch,
    receipt: &Receipt<'static>,
    attempts: NonZeroU8,
) -> Vec<HookFailure> {
    let mut failures = Vec::new();

    for hook in hooks {
        let mut last_error = None;

        for attempt in 1..=attempts.get() {
            match hook.run(batch, receipt).await {
                Ok(()) => {
                    last_error = None;
                    break;
                }
                Err(error) => {
                    warn!(hook = hook.name(), attempt, %error, "post-commit hook failed");
                    last_error = Some(error);
                }
            }
        }

        if let Some(error) = last_error {
            failures.push(HookFailure {
                hook: hook.name(),
                attempts: attempts.get(),
                error,
            });
        }
    }

    failures
}
