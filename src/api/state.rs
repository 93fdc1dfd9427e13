//! Application state for shared services
//!
//! One process-wide context object constructed at startup and threaded
//! explicitly into the gate, the handlers and the shutdown path; nothing here
//! relies on import-time side effects.

use std::sync::Arc;

use crate::api::policy::AccessPolicy;
use crate::domain::catalog::Catalog;
use crate::domain::identity::IdentityStore;
use crate::domain::store::KeyValueStore;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::infrastructure::response_cache::ResponseCache;
use crate::infrastructure::usage::UsageCounters;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    pub identities: Arc<dyn IdentityStore>,
    pub catalog: Arc<dyn Catalog>,
    pub limiter: Arc<RateLimiter>,
    pub response_cache: Arc<ResponseCache>,
    pub usage: Arc<UsageCounters>,
    pub policy: Arc<AccessPolicy>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        identities: Arc<dyn IdentityStore>,
        catalog: Arc<dyn Catalog>,
        limiter: Arc<RateLimiter>,
        response_cache: Arc<ResponseCache>,
        usage: Arc<UsageCounters>,
        policy: Arc<AccessPolicy>,
    ) -> Self {
        Self {
            store,
            identities,
            catalog,
            limiter,
            response_cache,
            usage,
            policy,
        }
    }
}
