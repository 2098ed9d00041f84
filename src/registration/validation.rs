//! Step validators
//!
//! Each validator reports the first problem it finds, in registrant order.

use crate::{
    collaborators::PaymentEvidence,
    conflicts::detect_for_registrants,
    packages::Catalog,
    registrants::{MembershipType, Registrant},
    registration::errors::ValidationError,
};

/// Payment details collected on the review steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentDetails {
    /// Reference to an uploaded proof of payment
    pub proof: Option<String>,

    /// Settle the payment later at the club
    pub pay_later: bool,
}

impl PaymentDetails {
    /// The evidence to attach to enrollments, if any was given.
    ///
    /// An uploaded proof wins over pay-later.
    #[must_use]
    pub fn evidence(&self) -> Option<PaymentEvidence> {
        match (&self.proof, self.pay_later) {
            (Some(proof), _) if !proof.trim().is_empty() => {
                Some(PaymentEvidence::Proof(proof.clone()))
            }
            (_, true) => Some(PaymentEvidence::PayLater),
            _ => None,
        }
    }
}

/// Leaving the type selection: a type was chosen, at least one registrant was
/// added, and every registrant fits the chosen type.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn select_type(
    chosen: Option<MembershipType>,
    registrants: &[Registrant],
) -> Result<MembershipType, ValidationError> {
    let chosen = chosen.ok_or(ValidationError::NoMembershipType)?;

    if registrants.is_empty() {
        return Err(ValidationError::NoRegistrants);
    }

    if let Some(registrant) = registrants
        .iter()
        .find(|registrant| registrant.membership_type() != chosen)
    {
        return Err(ValidationError::MembershipTypeMismatch {
            registrant: registrant.uuid(),
            name: registrant.person().name.clone(),
            expected: chosen,
        });
    }

    Ok(chosen)
}

/// Leaving package selection: every registrant has an eligible package and no
/// person's selected activities overlap.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn selections(registrants: &[Registrant], catalog: &Catalog<'_>) -> Result<(), ValidationError> {
    if registrants.is_empty() {
        return Err(ValidationError::NoRegistrants);
    }

    for registrant in registrants {
        let Some(selection) = registrant
            .selection()
            .filter(|selection| catalog.get(selection.package).is_some())
        else {
            return Err(ValidationError::MissingPackage {
                registrant: registrant.uuid(),
                name: registrant.person().name.clone(),
            });
        };

        if !selection.eligibility.eligible {
            return Err(ValidationError::Ineligible {
                registrant: registrant.uuid(),
                reason: selection
                    .eligibility
                    .reason
                    .clone()
                    .unwrap_or_else(|| "Not eligible for this package".to_string()),
            });
        }
    }

    if let Some(found) = detect_for_registrants(registrants, catalog).into_iter().next()
        && let Some(conflict) = found.conflicts.into_iter().next()
    {
        let person = registrants
            .iter()
            .find(|registrant| registrant.person().uuid == found.person)
            .map(|registrant| registrant.person().name.clone())
            .unwrap_or_default();

        return Err(ValidationError::ScheduleConflict { person, conflict });
    }

    Ok(())
}

/// Leaving the details step: selections are valid and every self-enrolling
/// adult has complete contact details.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn details(registrants: &[Registrant], catalog: &Catalog<'_>) -> Result<(), ValidationError> {
    selections(registrants, catalog)?;

    for registrant in registrants {
        if let Some(field) = registrant
            .contact()
            .and_then(|contact| contact.missing_fields().into_iter().next())
        {
            return Err(ValidationError::MissingContact {
                registrant: registrant.uuid(),
                name: registrant.person().name.clone(),
                field,
            });
        }
    }

    Ok(())
}

/// Submitting: proof of payment was given or pay-later was chosen.
///
/// # Errors
///
/// Returns [`ValidationError::MissingPayment`] otherwise.
pub fn payment(details: &PaymentDetails) -> Result<PaymentEvidence, ValidationError> {
    details.evidence().ok_or(ValidationError::MissingPayment)
}
