//! Turnstile
//!
//! Turnstile is the enrollment engine behind a sports club's membership
//! sign-up: it checks package eligibility, detects weekly schedule conflicts,
//! prices batches of registrants with enrollment fees, bundle discounts and
//! VAT, and drives the multi-step registration flow through to committed
//! memberships and enrollments.

pub mod clubs;
pub mod collaborators;
pub mod conflicts;
pub mod discounts;
pub mod eligibility;
pub mod fees;
pub mod fixtures;
pub mod packages;
pub mod people;
pub mod prelude;
pub mod pricing;
pub mod receipt;
pub mod registrants;
pub mod registration;
pub mod schedules;
pub mod utils;
pub mod uuids;
