//! Registration
//!
//! The step-gated enrollment flow. Existing accounts go
//! `SelectType → PackageSelection → PaymentReview → Submitted`, skipping
//! package selection when a preselected package already applies cleanly. New
//! accounts go `SelectType → Details → Review → Submitted`.
//!
//! Forward moves run the validator of the step being left. Backward moves
//! retrace the path actually taken and never validate.

use std::{fmt, num::NonZeroU8, sync::Arc};

use jiff::civil::Date;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::info;

use crate::{
    clubs::ClubUuid,
    collaborators::{Collaborators, CommittedBatch, CommittedEnrollment, PaymentEvidence, Recipient},
    eligibility::{EligibilityResult, MissingBirthDatePolicy, evaluate_person},
    fees::{ClubDiscount, ClubFeeConfig},
    packages::{Catalog, PackageKey, PackageUuid},
    people::PersonUuid,
    pricing::price,
    receipt::Receipt,
    registrants::{ContactInfo, MembershipType, Registrant, RegistrantKind, RegistrantUuid},
};

pub mod errors;
pub mod submission;
pub mod validation;

pub use errors::{HookFailure, RegistrationError, SubmissionError, ValidationError};
pub use submission::{
    LedgerHook, PostCommitHook, ReceiptHook, SubmissionReport, WorkflowHook, enrollment_end,
    run_hooks,
};
pub use validation::PaymentDetails;

use submission::{CreatedRecords, PlannedEnrollment};

/// Attempts per post-commit hook unless configured otherwise.
pub const DEFAULT_HOOK_ATTEMPTS: NonZeroU8 = match NonZeroU8::new(3) {
    Some(attempts) => attempts,
    None => NonZeroU8::MIN,
};

/// A step of the registration flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Choose who the membership is for and add registrants
    SelectType,

    /// Choose a package per registrant (existing accounts)
    PackageSelection,

    /// Review the quote and attach payment (existing accounts)
    PaymentReview,

    /// Enter registrant details and packages (new accounts)
    Details,

    /// Review the quote and attach payment (new accounts)
    Review,

    /// Enrollments committed
    Submitted,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::SelectType => "select-type",
            Step::PackageSelection => "package-selection",
            Step::PaymentReview => "payment-review",
            Step::Details => "details",
            Step::Review => "review",
            Step::Submitted => "submitted",
        };

        f.write_str(name)
    }
}

/// Whether the account driving the flow already existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountOrigin {
    /// A signed-in account
    Existing,

    /// An account created as part of this registration
    New,
}

/// Request-scoped data for one registration run.
#[derive(Debug, Clone)]
pub struct RegistrationContext {
    /// Club being enrolled into
    pub club: ClubUuid,

    /// Club name, used as the receipt heading
    pub club_name: String,

    /// Date eligibility and enrollment periods are computed from
    pub today: Date,

    /// Account origin, which picks the flow
    pub origin: AccountOrigin,

    /// Account holder; guardian of any children registered
    pub account: PersonUuid,

    /// Receipt recipient when no self-enrolling registrant has an email
    pub recipient: Option<Recipient>,
}

/// A catalog package offered to a registrant.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailablePackage {
    /// Catalog key
    pub key: PackageKey,

    /// External identity
    pub uuid: PackageUuid,

    /// Package name
    pub name: String,

    /// Whether the registrant may take it, and why not
    pub eligibility: EligibilityResult,
}

/// One registration run.
#[derive(Debug)]
pub struct Registration {
    context: RegistrationContext,
    services: Collaborators,
    catalog: Catalog<'static>,
    fees: ClubFeeConfig<'static>,
    discount: Option<ClubDiscount<'static>>,
    policy: MissingBirthDatePolicy,
    hook_attempts: NonZeroU8,
    step: Step,
    history: SmallVec<[Step; 4]>,
    membership_type: Option<MembershipType>,
    registrants: Vec<Registrant>,
    preselected: Option<PackageUuid>,
    first_timers: Option<FxHashSet<PersonUuid>>,
    payment: PaymentDetails,
    created: CreatedRecords,
}

impl Registration {
    /// Starts a registration: loads the club's catalog and fee configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a collaborator fails or the catalog is invalid.
    #[tracing::instrument(
        name = "registration.start",
        skip(context, services),
        fields(club = %context.club, origin = ?context.origin),
        err
    )]
    pub async fn start(
        context: RegistrationContext,
        services: Collaborators,
    ) -> Result<Self, RegistrationError> {
        let packages = services.catalog.packages(context.club).await?;
        let fees = services.fees.fee_config(context.club).await?;
        let catalog = Catalog::with_packages(packages)?;

        info!(packages = catalog.len(), "registration started");

        Ok(Self {
            context,
            services,
            catalog,
            fees,
            discount: None,
            policy: MissingBirthDatePolicy::default(),
            hook_attempts: DEFAULT_HOOK_ATTEMPTS,
            step: Step::SelectType,
            history: SmallVec::new(),
            membership_type: None,
            registrants: Vec::new(),
            preselected: None,
            first_timers: None,
            payment: PaymentDetails::default(),
            created: CreatedRecords::default(),
        })
    }

    /// Sets how a missing date of birth is treated.
    #[must_use]
    pub fn with_policy(mut self, policy: MissingBirthDatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the attempts per post-commit hook.
    #[must_use]
    pub fn with_hook_attempts(mut self, attempts: NonZeroU8) -> Self {
        self.hook_attempts = attempts;
        self
    }

    /// Applies a club discount, for walk-in and admin registrations.
    #[must_use]
    pub fn with_discount(mut self, discount: ClubDiscount<'static>) -> Self {
        self.discount = Some(discount);
        self
    }

    /// Current step.
    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    /// Request context.
    #[must_use]
    pub fn context(&self) -> &RegistrationContext {
        &self.context
    }

    /// The club's catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog<'static> {
        &self.catalog
    }

    /// The club's fee configuration.
    #[must_use]
    pub fn fees(&self) -> &ClubFeeConfig<'static> {
        &self.fees
    }

    /// Chosen membership type.
    #[must_use]
    pub fn membership_type(&self) -> Option<MembershipType> {
        self.membership_type
    }

    /// Registrants, in the order they were added.
    #[must_use]
    pub fn registrants(&self) -> &[Registrant] {
        &self.registrants
    }

    /// First-timers frozen on entering a review step.
    #[must_use]
    pub fn first_timers(&self) -> Option<&FxHashSet<PersonUuid>> {
        self.first_timers.as_ref()
    }

    /// Payment details entered so far.
    #[must_use]
    pub fn payment(&self) -> &PaymentDetails {
        &self.payment
    }

    /// Chooses who the membership is for.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidStep`] outside type selection.
    pub fn choose_type(&mut self, membership_type: MembershipType) -> Result<(), RegistrationError> {
        self.ensure_step("choose a membership type", &[Step::SelectType])?;
        self.membership_type = Some(membership_type);

        Ok(())
    }

    /// Preselects a package, applied to every registrant without one.
    ///
    /// # Errors
    ///
    /// Returns an error outside type selection or if the club does not offer
    /// the package.
    pub fn preselect(&mut self, package: PackageUuid) -> Result<(), RegistrationError> {
        self.ensure_step("preselect a package", &[Step::SelectType])?;

        if self.catalog.key_for(package).is_none() {
            return Err(RegistrationError::UnknownPackage(package));
        }

        self.preselected = Some(package);

        let unresolved: SmallVec<[RegistrantUuid; 4]> = self
            .registrants
            .iter()
            .filter(|registrant| registrant.selection().is_none())
            .map(Registrant::uuid)
            .collect();

        for registrant in unresolved {
            self.apply(registrant, package)?;
        }

        Ok(())
    }

    /// Adds a registrant, applying any preselected package.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidStep`] on the review steps.
    pub fn add_registrant(
        &mut self,
        registrant: Registrant,
    ) -> Result<RegistrantUuid, RegistrationError> {
        self.ensure_editable("add a registrant")?;

        let uuid = registrant.uuid();

        self.registrants.push(registrant);

        if let Some(package) = self.preselected {
            self.apply(uuid, package)?;
        }

        Ok(uuid)
    }

    /// Adds a stored profile as a registrant of the chosen membership type.
    ///
    /// Children are registered under the account holder. Self-enrolling adults
    /// start with empty contact details, to be filled in with
    /// [`Registration::set_contact`].
    ///
    /// # Errors
    ///
    /// Returns an error if no membership type was chosen or the profile store
    /// fails.
    #[tracing::instrument(name = "registration.add_profile", skip(self), err)]
    pub async fn add_profile(&mut self, id: PersonUuid) -> Result<RegistrantUuid, RegistrationError> {
        self.ensure_editable("add a registrant")?;

        let membership_type = self
            .membership_type
            .ok_or(ValidationError::NoMembershipType)?;

        let person = self.services.profiles.person(id).await?;

        let registrant = match membership_type {
            MembershipType::Myself => Registrant::myself(person, ContactInfo::default()),
            MembershipType::Child => Registrant::child(person, self.context.account),
        };

        self.add_registrant(registrant)
    }

    /// Removes a registrant.
    ///
    /// # Errors
    ///
    /// Returns an error on the review steps or if the registrant is unknown.
    pub fn remove_registrant(&mut self, uuid: RegistrantUuid) -> Result<Registrant, RegistrationError> {
        self.ensure_editable("remove a registrant")?;

        let idx = self
            .registrants
            .iter()
            .position(|registrant| registrant.uuid() == uuid)
            .ok_or(RegistrationError::UnknownRegistrant(uuid))?;

        Ok(self.registrants.remove(idx))
    }

    /// Replaces a self-enrolling registrant's contact details.
    ///
    /// # Errors
    ///
    /// Returns an error on the review steps or if the registrant is unknown or
    /// a child.
    pub fn set_contact(
        &mut self,
        uuid: RegistrantUuid,
        contact: ContactInfo,
    ) -> Result<(), RegistrationError> {
        self.ensure_editable("edit contact details")?;

        let slot = self
            .registrant_mut(uuid)?
            .contact_mut()
            .ok_or(RegistrationError::NoContactDetails(uuid))?;

        *slot = contact;

        Ok(())
    }

    /// Selects `package` for a registrant, returning the eligibility result.
    ///
    /// Ineligible selections are kept so the reason can be shown; they block
    /// the next forward transition.
    ///
    /// # Errors
    ///
    /// Returns an error on the review steps, or if the registrant or package
    /// is unknown.
    pub fn select_package(
        &mut self,
        registrant: RegistrantUuid,
        package: PackageUuid,
    ) -> Result<&EligibilityResult, RegistrationError> {
        self.ensure_editable("select a package")?;
        self.apply(registrant, package)
    }

    /// Packages a registrant may choose from: everything the club offers that
    /// the person is not already actively enrolled in, each with its
    /// eligibility.
    ///
    /// # Errors
    ///
    /// Returns an error if the registrant is unknown or the membership store
    /// fails.
    pub async fn available_packages(
        &self,
        registrant: RegistrantUuid,
    ) -> Result<Vec<AvailablePackage>, RegistrationError> {
        let registrant = self.registrant(registrant)?;
        let person = registrant.person();
        let stored = !matches!(
            registrant.kind(),
            RegistrantKind::Child {
                new_record: true,
                ..
            }
        );

        let mut available = Vec::with_capacity(self.catalog.len());

        for (key, package) in self.catalog.iter() {
            if stored
                && self
                    .services
                    .memberships
                    .has_active_enrollment(person.uuid, package.uuid)
                    .await?
            {
                continue;
            }

            available.push(AvailablePackage {
                key,
                uuid: package.uuid,
                name: package.name.clone(),
                eligibility: evaluate_person(person, package, self.context.today, self.policy),
            });
        }

        Ok(available)
    }

    /// Sets or clears the proof-of-payment reference.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidStep`] outside the review steps.
    pub fn set_payment_proof(&mut self, proof: Option<String>) -> Result<(), RegistrationError> {
        self.ensure_step("attach payment", &[Step::PaymentReview, Step::Review])?;
        self.payment.proof = proof;

        Ok(())
    }

    /// Chooses to pay later at the club.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidStep`] outside the review steps.
    pub fn set_pay_later(&mut self, pay_later: bool) -> Result<(), RegistrationError> {
        self.ensure_step("attach payment", &[Step::PaymentReview, Step::Review])?;
        self.payment.pay_later = pay_later;

        Ok(())
    }

    /// Validates the current step and moves forward.
    ///
    /// On failure the flow stays where it is. The review steps move on only
    /// through [`Registration::submit`].
    ///
    /// # Errors
    ///
    /// Returns the validation error, [`RegistrationError::InvalidStep`] from a
    /// review or final step, or a membership store failure while looking up
    /// first-timers.
    #[tracing::instrument(name = "registration.next", skip(self), fields(step = %self.step), err)]
    pub async fn next(&mut self) -> Result<Step, RegistrationError> {
        let target = match self.step {
            Step::SelectType => {
                validation::select_type(self.membership_type, &self.registrants)?;

                match self.context.origin {
                    AccountOrigin::New => Step::Details,
                    AccountOrigin::Existing
                        if self.preselected.is_some()
                            && validation::selections(&self.registrants, &self.catalog)
                                .is_ok() =>
                    {
                        Step::PaymentReview
                    }
                    AccountOrigin::Existing => Step::PackageSelection,
                }
            }
            Step::PackageSelection => {
                validation::selections(&self.registrants, &self.catalog)?;
                Step::PaymentReview
            }
            Step::Details => {
                validation::details(&self.registrants, &self.catalog)?;
                Step::Review
            }
            step @ (Step::PaymentReview | Step::Review | Step::Submitted) => {
                return Err(RegistrationError::InvalidStep {
                    action: "advance",
                    step,
                });
            }
        };

        match target {
            Step::PaymentReview => self.first_timers = Some(self.query_first_timers().await?),
            Step::Review => self.first_timers = Some(self.persons().collect()),
            Step::SelectType | Step::PackageSelection | Step::Details | Step::Submitted => {}
        }

        self.history.push(self.step);
        self.step = target;

        info!(step = %target, "moved forward");

        Ok(target)
    }

    /// Returns to the previous step without validating.
    ///
    /// Frozen first-timers are cleared, so the next forward move looks them
    /// up again.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidStep`] at the first step or after
    /// submission.
    pub fn back(&mut self) -> Result<Step, RegistrationError> {
        let invalid = RegistrationError::InvalidStep {
            action: "go back",
            step: self.step,
        };

        if self.step == Step::Submitted {
            return Err(invalid);
        }

        let previous = self.history.pop().ok_or(invalid)?;

        self.step = previous;
        self.first_timers = None;

        info!(step = %previous, "moved back");

        Ok(previous)
    }

    /// Prices the registrants with the frozen first-timers.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidStep`] before first-timers are
    /// known, or a pricing error.
    pub fn quote(&self) -> Result<Receipt<'static>, RegistrationError> {
        self.receipt_for(&self.registrants)
    }

    /// Commits every registrant, then runs the post-commit hooks.
    ///
    /// Registrants are written one at a time. If one fails, the rest are not
    /// attempted. Those already written stay written, get their post-commit
    /// hooks, and are dropped from this registration, so a retry only
    /// processes the remainder. Child profiles and member records written
    /// before the failure are reused by the retry.
    ///
    /// # Errors
    ///
    /// Returns an error outside the review steps, without payment evidence,
    /// on a pricing failure, or with [`SubmissionError::Fatal`] when a write
    /// fails. Hook failures are not errors; see
    /// [`SubmissionReport::hook_failures`].
    #[tracing::instrument(
        name = "registration.submit",
        skip(self),
        fields(club = %self.context.club, registrants = self.registrants.len()),
        err
    )]
    pub async fn submit(&mut self) -> Result<SubmissionReport, RegistrationError> {
        self.ensure_step("submit", &[Step::PaymentReview, Step::Review])?;

        let payment = validation::payment(&self.payment)?;
        let receipt = self.quote()?;
        let plan = self.plan()?;

        let committed = match submission::commit(
            self.context.club,
            self.services.profiles.as_ref(),
            self.services.memberships.as_ref(),
            &mut self.created,
            &plan,
            &payment,
        )
        .await
        {
            Ok(committed) => committed,
            Err(SubmissionError::Fatal {
                registrant,
                committed,
                source,
                ..
            }) => {
                let hook_failures = self.finish_partial(&committed, &payment).await?;

                return Err(SubmissionError::Fatal {
                    registrant,
                    committed,
                    source,
                    hook_failures,
                }
                .into());
            }
        };

        let batch = CommittedBatch {
            club: self.context.club,
            enrollments: committed,
            grand_total: receipt.grand_total(),
            payment,
        };

        let hook_failures = self.run_post_commit(&batch, &receipt).await;

        self.history.push(self.step);
        self.step = Step::Submitted;

        info!(
            enrollments = batch.enrollments.len(),
            hook_failures = hook_failures.len(),
            "registration submitted"
        );

        Ok(SubmissionReport {
            batch,
            receipt,
            hook_failures,
        })
    }

    /// Runs the hooks for the registrants committed before a fatal write
    /// error, then drops them from the flow. Their persons no longer count as
    /// first-timers since the enrollment fee was charged with them.
    async fn finish_partial(
        &mut self,
        committed: &[CommittedEnrollment],
        payment: &PaymentEvidence,
    ) -> Result<Vec<HookFailure>, RegistrationError> {
        if committed.is_empty() {
            return Ok(Vec::new());
        }

        let done: FxHashSet<RegistrantUuid> =
            committed.iter().map(|entry| entry.registrant).collect();
        let (written, remaining): (Vec<Registrant>, Vec<Registrant>) = self
            .registrants
            .iter()
            .cloned()
            .partition(|registrant| done.contains(&registrant.uuid()));

        let receipt = self.receipt_for(&written)?;
        let batch = CommittedBatch {
            club: self.context.club,
            enrollments: committed.to_vec(),
            grand_total: receipt.grand_total(),
            payment: payment.clone(),
        };

        let hook_failures = self.run_post_commit(&batch, &receipt).await;

        if let Some(first_timers) = self.first_timers.as_mut() {
            for registrant in &written {
                first_timers.remove(&registrant.person().uuid);
            }
        }

        self.registrants = remaining;

        info!(
            enrollments = batch.enrollments.len(),
            hook_failures = hook_failures.len(),
            "partial registration committed"
        );

        Ok(hook_failures)
    }

    async fn run_post_commit(
        &self,
        batch: &CommittedBatch,
        receipt: &Receipt<'static>,
    ) -> Vec<HookFailure> {
        let hooks: [Box<dyn PostCommitHook>; 3] = [
            Box::new(WorkflowHook(Arc::clone(&self.services.workflows))),
            Box::new(LedgerHook(Arc::clone(&self.services.ledger))),
            Box::new(ReceiptHook {
                sender: Arc::clone(&self.services.notifications),
                recipient: self.recipient(),
            }),
        ];

        run_hooks(&hooks, batch, receipt, self.hook_attempts).await
    }

    fn receipt_for(&self, registrants: &[Registrant]) -> Result<Receipt<'static>, RegistrationError> {
        let first_timers = self
            .first_timers
            .as_ref()
            .ok_or(RegistrationError::InvalidStep {
                action: "quote",
                step: self.step,
            })?;

        let pricing = price(
            registrants,
            &self.catalog,
            &self.fees,
            first_timers,
            self.discount.as_ref(),
        )?;

        Ok(Receipt::new(self.context.club_name.clone(), pricing))
    }

    fn ensure_step(&self, action: &'static str, allowed: &[Step]) -> Result<(), RegistrationError> {
        if allowed.contains(&self.step) {
            Ok(())
        } else {
            Err(RegistrationError::InvalidStep {
                action,
                step: self.step,
            })
        }
    }

    fn ensure_editable(&self, action: &'static str) -> Result<(), RegistrationError> {
        self.ensure_step(
            action,
            &[Step::SelectType, Step::PackageSelection, Step::Details],
        )
    }

    fn registrant(&self, uuid: RegistrantUuid) -> Result<&Registrant, RegistrationError> {
        self.registrants
            .iter()
            .find(|registrant| registrant.uuid() == uuid)
            .ok_or(RegistrationError::UnknownRegistrant(uuid))
    }

    fn registrant_mut(&mut self, uuid: RegistrantUuid) -> Result<&mut Registrant, RegistrationError> {
        self.registrants
            .iter_mut()
            .find(|registrant| registrant.uuid() == uuid)
            .ok_or(RegistrationError::UnknownRegistrant(uuid))
    }

    fn apply(
        &mut self,
        registrant: RegistrantUuid,
        package: PackageUuid,
    ) -> Result<&EligibilityResult, RegistrationError> {
        let today = self.context.today;
        let policy = self.policy;

        let (key, package) = self
            .catalog
            .key_for(package)
            .and_then(|key| Some((key, self.catalog.get(key)?)))
            .ok_or(RegistrationError::UnknownPackage(package))?;

        let target = self
            .registrants
            .iter_mut()
            .find(|candidate| candidate.uuid() == registrant)
            .ok_or(RegistrationError::UnknownRegistrant(registrant))?;

        Ok(target.select_package(key, package, today, policy))
    }

    /// Distinct persons in the batch, in order of first appearance.
    fn persons(&self) -> impl Iterator<Item = PersonUuid> + '_ {
        let mut seen = FxHashSet::default();

        self.registrants
            .iter()
            .map(|registrant| registrant.person().uuid)
            .filter(move |person| seen.insert(*person))
    }

    async fn query_first_timers(&self) -> Result<FxHashSet<PersonUuid>, RegistrationError> {
        let mut first_timers = FxHashSet::default();
        let new_records: FxHashSet<PersonUuid> = self
            .registrants
            .iter()
            .filter(|registrant| {
                matches!(
                    registrant.kind(),
                    RegistrantKind::Child {
                        new_record: true,
                        ..
                    }
                )
            })
            .map(|registrant| registrant.person().uuid)
            .collect();

        for person in self.persons() {
            let returning = !new_records.contains(&person)
                && self
                    .services
                    .memberships
                    .has_active_membership(self.context.club, person)
                    .await?;

            if !returning {
                first_timers.insert(person);
            }
        }

        Ok(first_timers)
    }

    fn plan(&self) -> Result<Vec<PlannedEnrollment>, RegistrationError> {
        let today = self.context.today;

        self.registrants
            .iter()
            .map(|registrant| {
                let package = registrant
                    .selection()
                    .and_then(|selection| self.catalog.get(selection.package))
                    .ok_or_else(|| ValidationError::MissingPackage {
                        registrant: registrant.uuid(),
                        name: registrant.person().name.clone(),
                    })?;

                Ok(PlannedEnrollment {
                    registrant: registrant.clone(),
                    package: package.uuid,
                    price: package.price,
                    start: today,
                    end: enrollment_end(today, package.duration_months)?,
                })
            })
            .collect()
    }

    fn recipient(&self) -> Option<Recipient> {
        self.registrants
            .iter()
            .find_map(|registrant| {
                registrant
                    .contact()
                    .filter(|contact| !contact.email.trim().is_empty())
                    .map(|contact| Recipient {
                        name: registrant.person().name.clone(),
                        email: contact.email.clone(),
                    })
            })
            .or_else(|| self.context.recipient.clone())
    }
}
