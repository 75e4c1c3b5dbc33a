use std::collections::BTreeMap;
use std::sync::OnceLock;

use tracing::info;

use crate::component::{scrape, Component};
use crate::error::{ReleaseError, Result};

/// Metadata and factory for one component type
#[derive(Clone)]
pub struct Registration {
    pub name: &'static str,
    pub description: &'static str,
    pub version: Option<&'static str>,
    pub build: fn() -> Box<dyn Component>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("version", &self.version)
            .finish()
    }
}

/// Immutable name to [Registration] mapping
#[derive(Debug, Default)]
pub struct Registry {
    entries: BTreeMap<&'static str, Registration>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Registration> {
        self.entries.get(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    pub fn registrations(&self) -> impl Iterator<Item = &Registration> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a fresh instance of the named component
    pub fn create(&self, name: &str) -> Result<Box<dyn Component>> {
        self.get(name)
            .map(|registration| (registration.build)())
            .ok_or_else(|| ReleaseError::not_found(format!("component '{}'", name)))
    }
}

/// Collects registrations before the registry is frozen
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: BTreeMap<&'static str, Registration>,
}

impl RegistryBuilder {
    /// Add a registration; names must be unique
    pub fn register(mut self, registration: Registration) -> Result<Self> {
        if self.entries.contains_key(registration.name) {
            return Err(ReleaseError::config(format!(
                "component '{}' is registered twice",
                registration.name
            )));
        }
        self.entries.insert(registration.name, registration);
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry {
            entries: self.entries,
        }
    }
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Install `registry` as the process-wide registry
///
/// Succeeds exactly once per process.
pub fn install(registry: Registry) -> Result<&'static Registry> {
    let count = registry.len();
    REGISTRY
        .set(registry)
        .map_err(|_| ReleaseError::config("component registry is already installed"))?;
    info!(components = count, "installed component registry");
    global().ok_or_else(|| ReleaseError::config("component registry is not installed"))
}

/// The process-wide registry, once installed
pub fn global() -> Option<&'static Registry> {
    REGISTRY.get()
}

/// Registry of the components shipped with the binary
pub fn builtin() -> Result<Registry> {
    Ok(Registry::builder().register(scrape::registration())?.build())
}
