//! Custom Axum extractors.

pub mod client_ip;
pub mod session;

pub use client_ip::ClientIp;
pub use session::CurrentSession;
