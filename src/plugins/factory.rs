//! Plugin factory tables
//!
//! Construction is resolved through explicit tables built at startup rather
//! than any runtime discovery: each table maps a module name to a factory
//! closure taking the plugin's config fragment.

use std::collections::HashMap;
use crate::application::errors::RegistryError;
use super::trait_def::Plugin;

/// Constructs a plugin instance from its config fragment
pub type PluginFactory = Box<dyn Fn(&serde_json::Value) -> Result<Box<dyn Plugin>, RegistryError> + Send + Sync>;

/// A named set of plugin factories (the "package" a plugin comes from)
#[derive(Default)]
pub struct FactoryTable {
    factories: HashMap<String, PluginFactory>,
}

impl FactoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factory under `module`, replacing any previous one
    pub fn insert<F>(&mut self, module: impl Into<String>, factory: F)
    where
        F: Fn(&serde_json::Value) -> Result<Box<dyn Plugin>, RegistryError> + Send + Sync + 'static,
    {
        self.factories.insert(module.into(), Box::new(factory));
    }

    /// Builder-style insert
    pub fn with<F>(mut self, module: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&serde_json::Value) -> Result<Box<dyn Plugin>, RegistryError> + Send + Sync + 'static,
    {
        self.insert(module, factory);
        self
    }

    pub fn get(&self, module: &str) -> Option<&PluginFactory> {
        self.factories.get(module)
    }

    pub fn contains(&self, module: &str) -> bool {
        self.factories.contains_key(module)
    }

    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
