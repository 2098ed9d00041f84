//! Receipt
//!
//! Display-ready, itemized summary of a pricing result. Rendered as a table
//! for people and handed to the notification sender after submission.

use std::io;

use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::pricing::{PricingResult, format_amount};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// IO error
    #[error("failed to write receipt: {0}")]
    Io(#[from] io::Error),
}

/// Itemized receipt for one registration batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt<'a> {
    club: String,
    pricing: PricingResult<'a>,
}

impl<'a> Receipt<'a> {
    /// Create a receipt for `club` from a pricing result.
    pub fn new(club: impl Into<String>, pricing: PricingResult<'a>) -> Self {
        Self {
            club: club.into(),
            pricing,
        }
    }

    /// Club name shown in the heading.
    #[must_use]
    pub fn club(&self) -> &str {
        &self.club
    }

    /// Underlying pricing.
    #[must_use]
    pub fn pricing(&self) -> &PricingResult<'a> {
        &self.pricing
    }

    /// Amount payable.
    #[must_use]
    pub fn grand_total(&self) -> Money<'a, Currency> {
        self.pricing.grand_total()
    }

    /// Summary lines below the itemized rows, in display order.
    ///
    /// Lines that do not apply (no bundle discount, no club discount, no
    /// enrollment fee) are left out; VAT is always listed.
    #[must_use]
    pub fn summary(&self) -> Vec<(String, String)> {
        let pricing = &self.pricing;
        let mut rows = Vec::with_capacity(6);

        rows.push((
            "Packages".to_string(),
            format_amount(&pricing.package_subtotal()),
        ));

        if !pricing.bundle_discount().amount().is_zero() {
            rows.push((
                "Bundle discount".to_string(),
                format!("-{}", format_amount(&pricing.bundle_discount())),
            ));
        }

        if pricing.first_timers() > 0 {
            rows.push((
                format!("Enrollment fee x{}", pricing.first_timers()),
                format_amount(&pricing.enrollment_subtotal()),
            ));
        }

        if !pricing.discount().amount().is_zero() {
            rows.push((
                "Discount".to_string(),
                format!("-{}", format_amount(&pricing.discount())),
            ));
        }

        rows.push(("VAT".to_string(), format_amount(&pricing.vat())));
        rows.push(("Total".to_string(), format_amount(&pricing.grand_total())));

        rows
    }

    /// Writes the receipt as a table.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Member", "Item", "Amount"]);

        for (idx, line) in self.pricing.lines().iter().enumerate() {
            builder.push_record([
                format!("#{:<3}", idx + 1),
                line.person.clone(),
                line.description.clone(),
                format_amount(&line.amount),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(3..4), Alignment::right());

        writeln!(out, "\n{}\n{table}", self.club)?;

        let label_width = self
            .summary()
            .iter()
            .map(|(label, _value)| label.len())
            .max()
            .unwrap_or(0);

        for (label, value) in self.summary() {
            writeln!(out, " {label:>label_width$}  {value}")?;
        }

        writeln!(out)?;

        Ok(())
    }
}
