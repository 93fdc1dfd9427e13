//! API middleware components

pub mod gate;
pub mod request_counter;

pub use gate::{auth_gate, RateLimitStatus, RequestApiKey, API_KEY_HEADER};
pub use request_counter::request_counter;
