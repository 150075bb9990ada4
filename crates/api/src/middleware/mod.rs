//! HTTP middleware components.

pub mod logging;
pub mod rate_limit;
pub mod trace_id;

pub use rate_limit::{auth_rate_limit, general_rate_limit, RateLimiterState, RateLimiters};
pub use trace_id::{trace_id, RequestId, REQUEST_ID_HEADER};
