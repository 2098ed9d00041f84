//! Club fee configuration

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};

/// Club-level fees applied on top of package prices.
#[derive(Debug, Clone)]
pub struct ClubFeeConfig<'a> {
    /// One-time fee per first-time registrant
    pub enrollment_fee: Money<'a, Currency>,

    /// VAT rate as a fraction (0.05 for 5%)
    pub vat_percentage: Percentage,

    /// VAT registration number; VAT is charged only when this is present
    pub vat_registration_number: Option<String>,

    /// Currency all prices are charged in
    pub currency: &'static Currency,
}

impl ClubFeeConfig<'_> {
    /// A configuration with no enrollment fee and no VAT.
    #[must_use]
    pub fn free(currency: &'static Currency) -> Self {
        Self {
            enrollment_fee: Money::from_minor(0, currency),
            vat_percentage: Percentage::from(Decimal::ZERO),
            vat_registration_number: None,
            currency,
        }
    }

    /// Whether VAT is charged at all.
    ///
    /// A club without a non-blank VAT registration number must not charge VAT,
    /// whatever rate is configured.
    #[must_use]
    pub fn vat_applies(&self) -> bool {
        self.vat_registration_number
            .as_deref()
            .is_some_and(|number| !number.trim().is_empty())
    }
}

/// A club-level discount supplied on the walk-in/admin pricing path.
#[derive(Debug, Clone, Copy)]
pub enum ClubDiscount<'a> {
    /// A fraction of the subtotal (e.g. 10% off)
    Percentage(Percentage),

    /// A fixed amount off the subtotal
    Amount(Money<'a, Currency>),
}
