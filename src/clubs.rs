//! Clubs

use crate::{fees::ClubFeeConfig, uuids::TypedUuid};

/// Club UUID
pub type ClubUuid = TypedUuid<Club<'static>>;

/// A club offering packages, with its fee configuration.
#[derive(Debug, Clone)]
pub struct Club<'a> {
    /// External identity
    pub uuid: ClubUuid,

    /// Display name, used as the receipt heading
    pub name: String,

    /// Enrollment fee, VAT and currency
    pub fees: ClubFeeConfig<'a>,
}

impl<'a> Club<'a> {
    /// Creates a club with a fresh identity.
    pub fn new(name: impl Into<String>, fees: ClubFeeConfig<'a>) -> Self {
        Self {
            uuid: ClubUuid::now_v7(),
            name: name.into(),
            fees,
        }
    }
}
