//! Name-keyed registry of source adapters.

use crate::error::AdapterError;
use crate::{Adapter, builtin};

/// Context holding every registered adapter.
///
/// Create one with [`AdapterRegistry::with_builtins`] at start-up and look
/// adapters up by the name used in source configs.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn Adapter>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl AdapterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// Registry with every built-in adapter.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register(builtin::Enigma2Adapter)
            .register(builtin::NeutrinoAdapter)
            .register(builtin::DvbSiAdapter)
            .register(builtin::M3uAdapter)
            .register(builtin::JsonApiAdapter)
            .register(builtin::AstraAdapter)
            .register(builtin::ArdAdapter)
            .register(builtin::DvbT2DeAdapter)
            .register(builtin::SimpliTvAtAdapter)
            .register(builtin::WilhelmTelDeAdapter)
            .register(builtin::VodafoneDeAdapter);
        registry
    }

    /// Register an adapter, replacing any earlier one with the same name.
    pub fn register<A: Adapter + 'static>(&mut self, adapter: A) -> &mut Self {
        self.adapters.retain(|a| a.name() != adapter.name());
        self.adapters.push(Box::new(adapter));
        self
    }

    pub fn get(&self, name: &str) -> Result<&dyn Adapter, AdapterError> {
        self.adapters
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
            .ok_or_else(|| AdapterError::UnknownAdapter(name.to_string()))
    }

    pub fn adapters(&self) -> impl Iterator<Item = &dyn Adapter> {
        self.adapters.iter().map(|a| a.as_ref())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.adapters.iter().map(|a| a.name()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = AdapterRegistry::with_builtins();
        let names = registry.names();
        assert_eq!(names.len(), 11);
        assert!(names.contains(&"enigma2"));
        assert!(names.contains(&"provider_vodafone_de"));
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_unknown_adapter() {
        let registry = AdapterRegistry::with_builtins();
        let err = registry.get("nope").err().unwrap();
        assert_eq!(err.to_string(), "adapter nope not registered");
    }
}
