//! Domain services for the RSVP backend.
//!
//! Services contain business logic that operates on domain models.

pub mod roster;

pub use roster::{plan_reconciliation, GuestUpdate, NewGuest, PlanError, RosterPlan};
