//! Pricing
//!
//! Itemized totals for a registration batch. Amounts keep full decimal
//! precision throughout; rounding happens only in [`format_amount`].

use rust_decimal::{Decimal, RoundingStrategy};
use rustc_hash::FxHashSet;
use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    discounts::{DiscountError, bundle_discount, club_discount, percent_of},
    fees::{ClubDiscount, ClubFeeConfig},
    packages::{Activity, Catalog},
    people::{Person, PersonUuid},
    registrants::{Registrant, RegistrantUuid},
};

/// Errors that can occur while pricing.
#[derive(Debug, Error)]
pub enum PricingError {
    /// A price is in a different currency from the club's fee configuration.
    #[error("{item} is priced in {found}, but the club charges in {expected}")]
    CurrencyMismatch {
        /// Package or activity name
        item: String,

        /// Club currency
        expected: &'static str,

        /// Item currency
        found: &'static str,
    },

    /// An activity in a custom package has no standalone price.
    #[error("activity {0} has no standalone price")]
    UnpricedActivity(String),

    /// Wrapped discount calculation error.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// One priced line: a registrant's package, or an activity in a custom package.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceLine<'a> {
    /// Registrant the line belongs to, when priced per registrant
    pub registrant: Option<RegistrantUuid>,

    /// Person name
    pub person: String,

    /// Package or activity name
    pub description: String,

    /// Line amount
    pub amount: Money<'a, Currency>,
}

/// Itemized pricing for a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingResult<'a> {
    lines: Vec<PriceLine<'a>>,
    package_subtotal: Money<'a, Currency>,
    bundle_discount: Money<'a, Currency>,
    first_timers: usize,
    enrollment_subtotal: Money<'a, Currency>,
    subtotal: Money<'a, Currency>,
    discount: Money<'a, Currency>,
    vat: Money<'a, Currency>,
    grand_total: Money<'a, Currency>,
    unresolved: SmallVec<[RegistrantUuid; 2]>,
    currency: &'static Currency,
}

impl<'a> PricingResult<'a> {
    /// Priced lines, in input order.
    #[must_use]
    pub fn lines(&self) -> &[PriceLine<'a>] {
        &self.lines
    }

    /// Sum of package (or custom activity) prices.
    #[must_use]
    pub fn package_subtotal(&self) -> Money<'a, Currency> {
        self.package_subtotal
    }

    /// Multi-activity bundle reduction (custom packages only).
    #[must_use]
    pub fn bundle_discount(&self) -> Money<'a, Currency> {
        self.bundle_discount
    }

    /// Number of first-time registrants charged the enrollment fee.
    #[must_use]
    pub fn first_timers(&self) -> usize {
        self.first_timers
    }

    /// Enrollment fees for first-time registrants.
    #[must_use]
    pub fn enrollment_subtotal(&self) -> Money<'a, Currency> {
        self.enrollment_subtotal
    }

    /// Packages after any bundle reduction, plus enrollment fees.
    #[must_use]
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Club-level discount (walk-in/admin path only).
    #[must_use]
    pub fn discount(&self) -> Money<'a, Currency> {
        self.discount
    }

    /// VAT on the discounted subtotal.
    #[must_use]
    pub fn vat(&self) -> Money<'a, Currency> {
        self.vat
    }

    /// Amount payable.
    #[must_use]
    pub fn grand_total(&self) -> Money<'a, Currency> {
        self.grand_total
    }

    /// Registrants that were skipped for lacking a resolved package.
    #[must_use]
    pub fn unresolved(&self) -> &[RegistrantUuid] {
        &self.unresolved
    }

    /// Currency of every amount.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

/// Sums `prices`, starting from zero in `currency`.
///
/// # Errors
///
/// Returns a [`MoneyError`] on currency mismatch.
pub fn total_price<'a>(
    prices: impl IntoIterator<Item = Money<'a, Currency>>,
    currency: &'static Currency,
) -> Result<Money<'a, Currency>, MoneyError> {
    prices
        .into_iter()
        .try_fold(Money::from_minor(0, currency), |acc, price| acc.add(price))
}

/// Price a batch of registrants on the walk-in/admin path.
///
/// Every resolved registrant contributes its package price. Each person in
/// `first_timers` who appears in the batch pays the enrollment fee once. An
/// optional club `discount` comes off before VAT. Registrants without a
/// resolved package contribute nothing and are listed in
/// [`PricingResult::unresolved`].
///
/// # Errors
///
/// Returns a [`PricingError`] on currency mismatch or arithmetic overflow.
pub fn price<'a>(
    registrants: &[Registrant],
    catalog: &Catalog<'a>,
    fees: &ClubFeeConfig<'a>,
    first_timers: &FxHashSet<PersonUuid>,
    discount: Option<&ClubDiscount<'a>>,
) -> Result<PricingResult<'a>, PricingError> {
    let mut lines = Vec::with_capacity(registrants.len());
    let mut unresolved = SmallVec::new();
    let mut charged: FxHashSet<PersonUuid> = FxHashSet::default();

    for registrant in registrants {
        let Some(package) = registrant
            .selection()
            .and_then(|selection| catalog.get(selection.package))
        else {
            unresolved.push(registrant.uuid());
            continue;
        };

        ensure_currency(&package.name, package.price, fees.currency)?;

        let person = registrant.person();

        if first_timers.contains(&person.uuid) {
            charged.insert(person.uuid);
        }

        lines.push(PriceLine {
            registrant: Some(registrant.uuid()),
            person: person.name.clone(),
            description: package.name.clone(),
            amount: package.price,
        });
    }

    let reduction = discount.map_or(Reduction::None, Reduction::Club);

    compose(lines, charged.len(), reduction, fees, unresolved)
}

/// Price a custom package built from individual activities for one person.
///
/// Choosing [`crate::discounts::BUNDLE_MIN_ACTIVITIES`] or more activities
/// takes 15% off their combined price. No club discount applies on this path.
///
/// # Errors
///
/// Returns a [`PricingError`] if an activity has no price, is in another
/// currency, or arithmetic overflows.
pub fn price_custom_package<'a>(
    person: &Person,
    activities: &[Activity<'a>],
    fees: &ClubFeeConfig<'a>,
    first_timer: bool,
) -> Result<PricingResult<'a>, PricingError> {
    let lines = activities
        .iter()
        .map(|activity| {
            let amount = activity
                .price
                .ok_or_else(|| PricingError::UnpricedActivity(activity.title.clone()))?;

            ensure_currency(&activity.title, amount, fees.currency)?;

            Ok(PriceLine {
                registrant: None,
                person: person.name.clone(),
                description: activity.title.clone(),
                amount,
            })
        })
        .collect::<Result<Vec<_>, PricingError>>()?;

    let gross = total_price(lines.iter().map(|line| line.amount), fees.currency)?;
    let reduction = Reduction::Bundle(bundle_discount(activities.len(), gross)?);

    compose(
        lines,
        usize::from(first_timer),
        reduction,
        fees,
        SmallVec::new(),
    )
}

/// The single reduction a computation may carry.
#[derive(Clone, Copy)]
enum Reduction<'r, 'a> {
    None,
    Bundle(Money<'a, Currency>),
    Club(&'r ClubDiscount<'a>),
}

fn compose<'a>(
    lines: Vec<PriceLine<'a>>,
    first_timers: usize,
    reduction: Reduction<'_, 'a>,
    fees: &ClubFeeConfig<'a>,
    unresolved: SmallVec<[RegistrantUuid; 2]>,
) -> Result<PricingResult<'a>, PricingError> {
    let currency = fees.currency;
    let zero = Money::from_minor(0, currency);

    ensure_currency("enrollment fee", fees.enrollment_fee, currency)?;

    let package_subtotal = total_price(lines.iter().map(|line| line.amount), currency)?;

    let bundle = match reduction {
        Reduction::Bundle(amount) => amount,
        Reduction::None | Reduction::Club(_) => zero,
    };

    let enrollment_subtotal = Money::from_decimal(
        fees.enrollment_fee.amount() * Decimal::from(first_timers),
        currency,
    );

    let subtotal = package_subtotal.sub(bundle)?.add(enrollment_subtotal)?;

    let discount = match reduction {
        Reduction::Club(discount) => club_discount(discount, subtotal)?,
        Reduction::None | Reduction::Bundle(_) => zero,
    };

    let taxable = subtotal.sub(discount)?;

    let vat = if fees.vat_applies() {
        Money::from_decimal(percent_of(fees.vat_percentage, *taxable.amount())?, currency)
    } else {
        zero
    };

    let grand_total = taxable.add(vat)?;

    Ok(PricingResult {
        lines,
        package_subtotal,
        bundle_discount: bundle,
        first_timers,
        enrollment_subtotal,
        subtotal,
        discount,
        vat,
        grand_total,
        unresolved,
        currency,
    })
}

fn ensure_currency(
    item: &str,
    price: Money<'_, Currency>,
    expected: &'static Currency,
) -> Result<(), PricingError> {
    let found = price.currency();

    if found == expected {
        Ok(())
    } else {
        Err(PricingError::CurrencyMismatch {
            item: item.to_string(),
            expected: expected.iso_alpha_code,
            found: found.iso_alpha_code,
        })
    }
}

/// Formats an amount for display: two decimal places when there is a
/// fractional part, none otherwise (`GBP 70`, `GBP 73.50`).
#[must_use]
pub fn format_amount(money: &Money<'_, Currency>) -> String {
    let amount = money.amount();
    let code = money.currency().iso_alpha_code;

    if amount.fract().is_zero() {
        format!("{code} {:.0}", amount.trunc())
    } else {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        format!("{code} {rounded:.2}")
    }
}
