//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod guest;
pub mod invitation;
pub mod login_attempt;
pub mod session;

pub use guest::GuestEntity;
pub use invitation::{InvitationEntity, InvitationWithCountEntity};
pub use login_attempt::AttemptWindowEntity;
pub use session::SessionEntity;
