//! Named factory builders
//!
//! Settings refer to factories by name; the catalog turns those names into
//! factory instances. It always knows the generic `"object"` factory.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::factory::{ObjectFactory, PoolFactory};

type FactoryBuilder = Box<dyn Fn() -> Box<dyn PoolFactory>>;

/// Factory builders by name.
pub struct FactoryCatalog {
    builders: FxHashMap<String, FactoryBuilder>,
}

impl FactoryCatalog {
    /// Create a catalog containing the generic `"object"` factory.
    #[must_use]
    pub fn new() -> Self {
        let mut catalog = Self {
            builders: FxHashMap::default(),
        };
        catalog.register("object", || Box::new(ObjectFactory));
        catalog
    }

    /// Register a builder under `name`, replacing any previous one.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        builder: impl Fn() -> Box<dyn PoolFactory> + 'static,
    ) {
        let name = name.into();
        if self.builders.insert(name.clone(), Box::new(builder)).is_some() {
            log::warn!("Factory '{name}' was already in the catalog, replaced");
        }
    }

    /// Build the factory registered under `name`.
    #[must_use]
    pub fn build(&self, name: &str) -> Option<Box<dyn PoolFactory>> {
        self.builders.get(name).map(|builder| builder())
    }

    /// Check if a factory is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }
}

impl Default for FactoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FactoryCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.builders.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_object_factory() {
        let catalog = FactoryCatalog::new();

        assert!(catalog.contains("object"));
        assert_eq!(catalog.build("object").map(|f| f.name()), Some("object"));
        assert!(catalog.build("missing").is_none());
    }
}
