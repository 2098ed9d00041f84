//! Discounts
//!
//! The two discount mechanisms: the custom-package bundle reduction and the
//! club-level discount of the walk-in/admin path. They never apply to the
//! same subtotal.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::fees::ClubDiscount;

/// Minimum number of activities in one custom package for the bundle discount.
pub const BUNDLE_MIN_ACTIVITIES: usize = 3;

/// Bundle discount rate, as a fraction.
pub const BUNDLE_DISCOUNT_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Percentage calculation overflowed the decimal range.
    #[error("percentage calculation overflowed")]
    PercentConversion,

    /// A fixed discount is in a different currency from the subtotal.
    #[error("discount currency {found} does not match {expected}")]
    CurrencyMismatch {
        /// Subtotal currency
        expected: &'static str,

        /// Discount currency
        found: &'static str,
    },
}

/// `percent` of `amount`, at full precision.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the product overflows.
pub fn percent_of(percent: Percentage, amount: Decimal) -> Result<Decimal, DiscountError> {
    (percent * Decimal::ONE) // Percentage doesn't expose its inner Decimal
        .checked_mul(amount)
        .ok_or(DiscountError::PercentConversion)
}

/// Bundle reduction for a custom package of `activity_count` activities
/// totalling `total`. Zero below [`BUNDLE_MIN_ACTIVITIES`].
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the product overflows.
pub fn bundle_discount<'a>(
    activity_count: usize,
    total: Money<'a, Currency>,
) -> Result<Money<'a, Currency>, DiscountError> {
    if activity_count < BUNDLE_MIN_ACTIVITIES {
        return Ok(Money::from_minor(0, total.currency()));
    }

    let amount = percent_of(Percentage::from(BUNDLE_DISCOUNT_RATE), *total.amount())?;

    Ok(Money::from_decimal(amount, total.currency()))
}

/// Club discount on `subtotal`, capped so it never exceeds the subtotal.
///
/// # Errors
///
/// Returns an error if a fixed amount is in another currency, or the
/// percentage calculation overflows.
pub fn club_discount<'a>(
    discount: &ClubDiscount<'a>,
    subtotal: Money<'a, Currency>,
) -> Result<Money<'a, Currency>, DiscountError> {
    let currency = subtotal.currency();

    let amount = match discount {
        ClubDiscount::Percentage(percent) => percent_of(*percent, *subtotal.amount())?,
        ClubDiscount::Amount(money) => {
            if money.currency() != currency {
                return Err(DiscountError::CurrencyMismatch {
                    expected: currency.iso_alpha_code,
                    found: money.currency().iso_alpha_code,
                });
            }

            *money.amount()
        }
    };

    let capped = amount.clamp(Decimal::ZERO, (*subtotal.amount()).max(Decimal::ZERO));

    Ok(Money::from_decimal(capped, currency))
}
