//! API types - wire shapes and error responses

pub mod error;
pub mod json;

pub use error::{
    format_reset_human, rate_limit_headers, ApiError, GateError, MessageResponse,
    ProvisioningError, ProvisioningErrorBody,
};
pub use json::Json;
