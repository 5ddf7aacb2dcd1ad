//! HTTP middleware components.

pub mod logging;
pub mod metrics;
pub mod security_headers;
pub mod session_auth;
pub mod trace_id;

pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use security_headers::{same_origin_middleware, security_headers_middleware};
pub use session_auth::{require_session, AUTH_REQUIRED_REDIRECT};
pub use trace_id::{trace_id, RequestId, REQUEST_ID_HEADER};
