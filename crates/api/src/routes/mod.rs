pub mod auth;
pub mod health;
pub mod invite_link;
pub mod rsvp;
