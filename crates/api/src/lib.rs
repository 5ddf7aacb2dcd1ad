//! Invitation-gated RSVP service.
//!
//! Guests log in with a printed invitation code (or an email address) and
//! manage the guest roster of their own invitation. The HTTP surface lives
//! in [`app`]; business rules live in [`services`].

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod services;
