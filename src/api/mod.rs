//! API layer - HTTP endpoints and middleware

pub mod admin;
pub mod catalog;
pub mod health;
pub mod middleware;
pub mod policy;
pub mod router;
pub mod state;
pub mod status;
pub mod types;

pub use policy::{AccessPolicy, RouteClass};
pub use router::create_router;
pub use state::AppState;
