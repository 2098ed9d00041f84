//! Quote Example
//!
//! This example prices a batch of registrants, or a custom package, against a
//! fixture set and prints the receipt.
//!
//! Use `-f` to load a fixture set by name
//! Use `-r person=package` to add a registrant (repeatable)
//! Use `-c person=activity,activity` to price a custom package instead
//! Use `--returning` to skip the enrollment fee
//! Use `--vat-number` to charge the club's VAT rate

use std::io;

use anyhow::{Result, bail};
use clap::Parser;
use jiff::Zoned;
use rustc_hash::FxHashSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use turnstile::{
    eligibility::MissingBirthDatePolicy,
    fixtures::Fixture,
    people::PersonUuid,
    pricing::{price, price_custom_package},
    receipt::Receipt,
    registrants::{ContactInfo, Registrant},
    utils::ExampleQuoteArgs,
};

/// Quote Example
pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = ExampleQuoteArgs::parse();

    let fixture = Fixture::from_set(&args.fixture)?;
    let club = fixture.club()?;
    let today = Zoned::now().date();

    let mut fees = club.fees.clone();
    fees.vat_registration_number = args.vat_number;

    let pricing = if let Some((person_key, activity_keys)) = &args.custom {
        let person = fixture.person(person_key)?;

        let activities = activity_keys
            .split(',')
            .map(|key| fixture.activity(key.trim()).cloned())
            .collect::<Result<Vec<_>, _>>()?;

        price_custom_package(person, &activities, &fees, !args.returning)?
    } else {
        if args.registrants.is_empty() {
            bail!("add at least one registrant with -r person=package");
        }

        let guardian = PersonUuid::now_v7();
        let mut registrants = Vec::with_capacity(args.registrants.len());

        for (person_key, package_key) in &args.registrants {
            let person = fixture.person(person_key)?.clone();
            let key = fixture.package_key(package_key)?;
            let package = fixture.package(package_key)?;

            let mut registrant = if person.age_on(today).is_some_and(|age| age >= 18) {
                Registrant::myself(person, ContactInfo::default())
            } else {
                Registrant::child(person, guardian)
            };

            let eligibility =
                registrant.select_package(key, package, today, MissingBirthDatePolicy::Permit);

            if let Some(reason) = &eligibility.reason {
                warn!(person = person_key, package = package_key, reason, "not eligible");
            }

            registrants.push(registrant);
        }

        let first_timers: FxHashSet<PersonUuid> = if args.returning {
            FxHashSet::default()
        } else {
            registrants
                .iter()
                .map(|registrant| registrant.person().uuid)
                .collect()
        };

        price(&registrants, fixture.catalog(), &fees, &first_timers, None)?
    };

    info!(club = %club.name, lines = pricing.lines().len(), "priced quote");

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    Receipt::new(club.name.clone(), pricing).write_to(&mut handle)?;

    Ok(())
}
