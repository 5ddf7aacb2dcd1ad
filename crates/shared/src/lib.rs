//! Shared utilities and common types for the RSVP backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Secret key handling, keyed IP hashing and random identifiers
//! - Signed session tokens
//! - Invitation key and input validation

pub mod crypto;
pub mod token;
pub mod validation;
