//! Domain layer for the RSVP backend.
//!
//! This crate contains:
//! - Domain models (Invitation, Guest, Session) and request/response DTOs
//! - The roster reconciliation planner
//! - Domain error types

pub mod models;
pub mod services;
