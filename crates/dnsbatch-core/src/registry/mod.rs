//! Plugin-based provider registry
//!
//! The registry allows DNS providers to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains in the binary.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dnsbatch_core::registry::ProviderRegistry;
//! use dnsbatch_core::config::ProviderConfig;
//!
//! let registry = ProviderRegistry::new();
//! dnsbatch_provider_route53::register(&registry);
//!
//! let config = ProviderConfig::Route53 { region: None, profile: None };
//! let provider = registry.create_provider(&config).await?;
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Provider registry for plugin-based DNS provider creation
///
/// The registry maintains a map of provider type names to factory objects,
/// allowing dynamic instantiation of providers based on configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes. Factories are reference counted so the lock
/// is never held across an `.await`.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered DNS provider factories
    providers: RwLock<HashMap<String, Arc<dyn DnsProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS provider factory
    ///
    /// Registering the same name twice replaces the earlier factory.
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "route53")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn DnsProviderFactory>) {
        let name = name.into();
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        providers.insert(name, Arc::from(factory));
    }

    /// Create a DNS provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If provider type is not registered or creation fails
    pub async fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        config.validate()?;

        let provider_type = config.type_name();
        let factory = {
            let providers = self
                .providers
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            providers
                .get(provider_type)
                .cloned()
                .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?
        };

        factory.create(config).await
    }

    /// List all registered provider types, sorted by name
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        providers.contains_key(name)
    }
}
