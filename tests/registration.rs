//! Integration tests driving a full registration against the Riverside
//! fixture set, with in-memory collaborators standing in for the club's
//! storage, mail and workflow backends.
//!
//! Riverside charges a 20 GBP enrollment fee and has VAT configured but no
//! registration number, so no VAT is charged. Kids Swim (60 GBP, ages 5-12)
//! runs Saturday 08:00-09:00 and overlaps Kids Judo (08:30-09:30).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jiff::civil::{Date, date};
use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::GBP};
use testresult::TestResult;

use turnstile::{
    clubs::ClubUuid,
    collaborators::{
        CollaboratorError, Collaborators, CommittedBatch, Enrollment, EnrollmentUuid,
        FeeConfigSource, Member, MemberUuid, MembershipStore, NewEnrollment, NewMember,
        NotificationSender, PackageCatalog, PaymentEvidence, ProfileStore, Recipient,
        TransactionLedger, WorkflowTrigger,
    },
    fees::ClubFeeConfig,
    fixtures::{Fixture, FixtureError},
    packages::{Package, PackageUuid},
    people::{Person, PersonUuid},
    receipt::Receipt,
    registrants::MembershipType,
    registration::{
        AccountOrigin, Registration, RegistrationContext, RegistrationError, Step,
        ValidationError,
    },
};

const TODAY: Date = date(2024, 6, 1);

/// Everything the in-memory club has written.
#[derive(Debug, Default)]
struct Written {
    members: Vec<NewMember>,
    enrollments: Vec<NewEnrollment>,
    children: Vec<Person>,
    receipts: Vec<(Recipient, Receipt<'static>)>,
    batches: Vec<CommittedBatch>,
    ledger: Vec<CommittedBatch>,
}

/// A club backed by fixture data and in-memory records.
#[derive(Debug)]
struct InMemoryClub {
    packages: Vec<Package<'static>>,
    fees: ClubFeeConfig<'static>,
    people: Vec<Person>,
    active_members: FxHashSet<PersonUuid>,
    written: Mutex<Written>,
}

impl InMemoryClub {
    fn riverside() -> Result<Self, FixtureError> {
        let fixture: Fixture<'static> = Fixture::from_set("riverside")?;

        let people = ["kit", "ash", "sam", "rowan"]
            .into_iter()
            .map(|key| fixture.person(key).cloned())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            packages: fixture.packages(),
            fees: fixture.club()?.fees.clone(),
            people,
            active_members: FxHashSet::default(),
            written: Mutex::new(Written::default()),
        })
    }

    fn person_named(&self, name: &str) -> Option<&Person> {
        self.people.iter().find(|person| person.name == name)
    }

    fn package_named(&self, name: &str) -> Option<PackageUuid> {
        self.packages
            .iter()
            .find(|package| package.name == name)
            .map(|package| package.uuid)
    }

    fn written<T>(&self, read: impl FnOnce(&mut Written) -> T) -> Result<T, CollaboratorError> {
        let mut written = self
            .written
            .lock()
            .map_err(|_err| CollaboratorError::Unavailable)?;

        Ok(read(&mut written))
    }
}

#[async_trait]
impl PackageCatalog for InMemoryClub {
    async fn packages(&self, _club: ClubUuid) -> Result<Vec<Package<'static>>, CollaboratorError> {
        Ok(self.packages.clone())
    }
}

#[async_trait]
impl ProfileStore for InMemoryClub {
    async fn person(&self, id: PersonUuid) -> Result<Person, CollaboratorError> {
        self.people
            .iter()
            .find(|person| person.uuid == id)
            .cloned()
            .ok_or(CollaboratorError::NotFound)
    }

    async fn create_child(
        &self,
        _guardian: PersonUuid,
        child: Person,
    ) -> Result<Person, CollaboratorError> {
        let stored = Person {
            uuid: PersonUuid::now_v7(),
            ..child
        };

        self.written(|written| written.children.push(stored.clone()))?;

        Ok(stored)
    }
}

#[async_trait]
impl MembershipStore for InMemoryClub {
    async fn create_member(&self, member: NewMember) -> Result<Member, CollaboratorError> {
        let created = Member {
            uuid: MemberUuid::now_v7(),
            club: member.club,
            person: member.person,
        };

        self.written(|written| written.members.push(member))?;

        Ok(created)
    }

    async fn create_enrollment(
        &self,
        enrollment: NewEnrollment,
    ) -> Result<Enrollment, CollaboratorError> {
        let created = Enrollment {
            uuid: EnrollmentUuid::now_v7(),
            member: enrollment.member,
            package: enrollment.package,
            start: enrollment.start,
            end: enrollment.end,
        };

        self.written(|written| written.enrollments.push(enrollment))?;

        Ok(created)
    }

    async fn has_active_membership(
        &self,
        _club: ClubUuid,
        person: PersonUuid,
    ) -> Result<bool, CollaboratorError> {
        Ok(self.active_members.contains(&person))
    }

    async fn has_active_enrollment(
        &self,
        _person: PersonUuid,
        _package: PackageUuid,
    ) -> Result<bool, CollaboratorError> {
        Ok(false)
    }
}

#[async_trait]
impl FeeConfigSource for InMemoryClub {
    async fn fee_config(
        &self,
        _club: ClubUuid,
    ) -> Result<ClubFeeConfig<'static>, CollaboratorError> {
        Ok(self.fees.clone())
    }
}

#[async_trait]
impl NotificationSender for InMemoryClub {
    async fn send_receipt(
        &self,
        recipient: Recipient,
        receipt: Receipt<'static>,
    ) -> Result<(), CollaboratorError> {
        self.written(|written| written.receipts.push((recipient, receipt)))
    }
}

#[async_trait]
impl WorkflowTrigger for InMemoryClub {
    async fn registration_completed(&self, batch: CommittedBatch) -> Result<(), CollaboratorError> {
        self.written(|written| written.batches.push(batch))
    }
}

#[async_trait]
impl TransactionLedger for InMemoryClub {
    async fn record(&self, batch: CommittedBatch) -> Result<(), CollaboratorError> {
        self.written(|written| written.ledger.push(batch))
    }
}

fn collaborators(club: &Arc<InMemoryClub>) -> Collaborators {
    Collaborators {
        catalog: club.clone(),
        profiles: club.clone(),
        memberships: club.clone(),
        fees: club.clone(),
        notifications: club.clone(),
        workflows: club.clone(),
        ledger: club.clone(),
    }
}

fn context(account: PersonUuid, origin: AccountOrigin) -> RegistrationContext {
    RegistrationContext {
        club: ClubUuid::now_v7(),
        club_name: "Riverside Sports Club".to_string(),
        today: TODAY,
        origin,
        account,
        recipient: Some(Recipient {
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
        }),
    }
}

#[tokio::test]
async fn kids_swim_registration_end_to_end() -> TestResult {
    let club = Arc::new(InMemoryClub::riverside()?);
    let parent = club.person_named("Sam").ok_or("Sam missing")?.uuid;
    let kit = club.person_named("Kit").ok_or("Kit missing")?.uuid;
    let kids_swim = club.package_named("Kids Swim").ok_or("Kids Swim missing")?;

    let mut registration = Registration::start(
        context(parent, AccountOrigin::Existing),
        collaborators(&club),
    )
    .await?;

    registration.choose_type(MembershipType::Child)?;
    registration.preselect(kids_swim)?;
    registration.add_profile(kit).await?;

    assert_eq!(registration.next().await?, Step::PaymentReview);

    let quote = registration.quote()?;
    assert_eq!(quote.grand_total(), Money::from_minor(80_00, GBP));

    registration.set_pay_later(true)?;

    let report = registration.submit().await?;

    assert_eq!(registration.step(), Step::Submitted);
    assert!(report.hook_failures.is_empty(), "{:?}", report.hook_failures);
    assert_eq!(report.batch.grand_total, Money::from_minor(80_00, GBP));
    assert_eq!(report.batch.payment, PaymentEvidence::PayLater);

    let [committed] = report.batch.enrollments.as_slice() else {
        return Err("expected exactly one enrollment".into());
    };
    assert_eq!(committed.person, kit);
    assert_eq!(committed.enrollment.package, kids_swim);
    assert_eq!(committed.enrollment.start, TODAY);
    assert_eq!(committed.enrollment.end, date(2024, 7, 1));

    club.written(|written| {
        assert_eq!(written.members.len(), 1, "one member record");
        assert_eq!(written.enrollments.len(), 1, "one enrollment record");
        assert!(written.children.is_empty(), "Kit already had a profile");
        assert_eq!(written.batches.len(), 1, "workflow triggered once");
        assert_eq!(written.ledger.len(), 1, "ledger recorded once");

        let [(recipient, receipt)] = written.receipts.as_slice() else {
            return Err("expected exactly one receipt");
        };
        assert_eq!(recipient.email, "sam@example.com");
        assert_eq!(receipt.grand_total(), Money::from_minor(80_00, GBP));

        Ok(())
    })??;

    Ok(())
}

#[tokio::test]
async fn overlapping_package_for_the_same_child_is_rejected() -> TestResult {
    let club = Arc::new(InMemoryClub::riverside()?);
    let parent = club.person_named("Sam").ok_or("Sam missing")?.uuid;
    let kit = club.person_named("Kit").ok_or("Kit missing")?.uuid;
    let kids_swim = club.package_named("Kids Swim").ok_or("Kids Swim missing")?;
    let kids_judo = club.package_named("Kids Judo").ok_or("Kids Judo missing")?;

    let mut registration = Registration::start(
        context(parent, AccountOrigin::Existing),
        collaborators(&club),
    )
    .await?;

    registration.choose_type(MembershipType::Child)?;
    let swim = registration.add_profile(kit).await?;
    let judo = registration.add_profile(kit).await?;

    assert_eq!(registration.next().await?, Step::PackageSelection);

    registration.select_package(swim, kids_swim)?;
    registration.select_package(judo, kids_judo)?;

    let result = registration.next().await;

    assert!(
        matches!(
            result,
            Err(RegistrationError::Validation(ValidationError::ScheduleConflict { ref person, ref conflict }))
                if person == "Kit" && conflict.involves("Swim Lessons", "Judo")
        ),
        "expected schedule conflict, got {result:?}"
    );
    assert_eq!(registration.step(), Step::PackageSelection);

    registration.remove_registrant(judo)?;

    assert_eq!(registration.next().await?, Step::PaymentReview);
    assert_eq!(
        registration.quote()?.grand_total(),
        Money::from_minor(80_00, GBP)
    );

    Ok(())
}

#[tokio::test]
async fn returning_member_pays_no_enrollment_fee() -> TestResult {
    let mut club = InMemoryClub::riverside()?;
    let parent = club.person_named("Sam").ok_or("Sam missing")?.uuid;
    let kit = club.person_named("Kit").ok_or("Kit missing")?.uuid;
    let kids_swim = club.package_named("Kids Swim").ok_or("Kids Swim missing")?;
    club.active_members.insert(kit);
    let club = Arc::new(club);

    let mut registration = Registration::start(
        context(parent, AccountOrigin::Existing),
        collaborators(&club),
    )
    .await?;

    registration.choose_type(MembershipType::Child)?;
    registration.preselect(kids_swim)?;
    registration.add_profile(kit).await?;
    registration.next().await?;

    assert_eq!(
        registration.quote()?.grand_total(),
        Money::from_minor(60_00, GBP)
    );

    Ok(())
}

#[tokio::test]
async fn too_old_for_kids_swim_is_blocked() -> TestResult {
    let club = Arc::new(InMemoryClub::riverside()?);
    let parent = club.person_named("Sam").ok_or("Sam missing")?.uuid;
    let ash = club.person_named("Ash").ok_or("Ash missing")?.uuid;
    let kids_swim = club.package_named("Kids Swim").ok_or("Kids Swim missing")?;

    let mut registration = Registration::start(
        context(parent, AccountOrigin::Existing),
        collaborators(&club),
    )
    .await?;

    registration.choose_type(MembershipType::Child)?;
    let registrant = registration.add_profile(ash).await?;

    assert_eq!(registration.next().await?, Step::PackageSelection);

    let eligibility = registration.select_package(registrant, kids_swim)?;
    assert!(!eligibility.eligible, "Ash is 14");

    let result = registration.next().await;

    assert!(
        matches!(
            result,
            Err(RegistrationError::Validation(ValidationError::Ineligible { ref reason, .. }))
                if reason == "Maximum age for this package is 12"
        ),
        "expected ineligible, got {result:?}"
    );

    club.written(|written| {
        assert!(written.members.is_empty(), "nothing written");
    })?;

    Ok(())
}
