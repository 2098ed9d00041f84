//! Club Fixtures

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{AED, Currency, EUR, GBP, SAR, USD},
};
use serde::Deserialize;

use crate::{clubs::Club, fees::ClubFeeConfig, fixtures::FixtureError};

/// Wrapper for a club in YAML
#[derive(Debug, Deserialize)]
pub struct ClubsFixture {
    /// The club
    pub club: ClubFixture,
}

/// Club Fixture
#[derive(Debug, Deserialize)]
pub struct ClubFixture {
    /// Club name
    pub name: String,

    /// One-time enrollment fee (e.g., "20 GBP")
    pub enrollment_fee: String,

    /// VAT rate (e.g., "5%" or "0.05")
    #[serde(default)]
    pub vat_percentage: Option<String>,

    /// VAT registration number; VAT is charged only when present
    #[serde(default)]
    pub vat_registration_number: Option<String>,
}

impl TryFrom<ClubFixture> for Club<'_> {
    type Error = FixtureError;

    fn try_from(fixture: ClubFixture) -> Result<Self, Self::Error> {
        let (minor_units, currency) = parse_price(&fixture.enrollment_fee)?;

        let vat_percentage = fixture
            .vat_percentage
            .as_deref()
            .map(parse_percentage)
            .transpose()?
            .unwrap_or_else(|| Percentage::from(Decimal::ZERO));

        Ok(Club::new(
            fixture.name,
            ClubFeeConfig {
                enrollment_fee: Money::from_minor(minor_units, currency),
                vat_percentage,
                vat_registration_number: fixture.vat_registration_number,
                currency,
            },
        ))
    }
}

/// Parse price string (e.g., "2.99 GBP") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(currency_code), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, parse_currency(currency_code)?))
}

/// Look up a supported ISO currency by code.
///
/// # Errors
///
/// Returns [`FixtureError::UnknownCurrency`] for any other code.
pub fn parse_currency(code: &str) -> Result<&'static Currency, FixtureError> {
    match code {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        "AED" => Ok(AED),
        "SAR" => Ok(SAR),
        other => Err(FixtureError::UnknownCurrency(other.to_string())),
    }
}

/// Parse percentage string (e.g., "5%" or "0.05") into a `Percentage`
///
/// # Errors
///
/// Returns an error if the string cannot be parsed as a decimal.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();

    let (number, scale) = match trimmed.strip_suffix('%') {
        Some(percent) => (percent.trim(), Decimal::ONE_HUNDRED),
        None => (trimmed, Decimal::ONE),
    };

    let value = number
        .parse::<Decimal>()
        .ok()
        .and_then(|value| value.checked_div(scale))
        .ok_or_else(|| FixtureError::InvalidPercentage(s.to_string()))?;

    Ok(Percentage::from(value))
}
