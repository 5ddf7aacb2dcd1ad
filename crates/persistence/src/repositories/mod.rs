//! Repository implementations for database operations.

pub mod guest;
pub mod invitation;
pub mod login_attempt;
pub mod session;

pub use guest::{GuestRepository, RosterTransaction};
pub use invitation::InvitationRepository;
pub use login_attempt::LoginAttemptRepository;
pub use session::SessionRepository;
