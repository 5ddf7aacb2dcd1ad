//! Domain models for the RSVP backend.

pub mod guest;
pub mod invitation;
pub mod roster;
pub mod session;

pub use guest::{Attendance, Guest, GuestRsvp, MealOptions};
pub use invitation::{Invitation, InvitationKey, InvitationMode, NewInvitation};
pub use roster::{RosterSubmission, RosterView, SubmittedGuest};
pub use session::Session;
