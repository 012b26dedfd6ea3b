//! Geolocation providers.
//!
//! This module provides:
//! - Provider identifiers and resolved provider configurations
//! - Request URL construction (`%s` templates, `fields`/`token` parameters)
//! - The registry of built-in providers and their rate budgets

mod registry;
mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use registry::{ProviderRegistry, FALLBACK_PROVIDER};
pub use types::{LookupRequest, Provider, ProviderConfig, ProviderId, RateBudget};
