//! Alias → component factory table built once at startup.
//!
//! The master definition is validated against this table by constructing each
//! referenced component, so unknown aliases and broken factories fail before
//! any version is applied.
use crate::component::Component;
use crate::error::{ComponentError, DefinitionError};
use indexmap::IndexMap;

/// Builds a fresh component instance.
pub type ComponentFactory = Box<dyn Fn() -> Result<Box<dyn Component>, ComponentError>>;

/// Registered component implementations keyed by alias.
#[derive(Default)]
pub struct ComponentRegistry {
    factories: IndexMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in component.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::components::register_builtin(&mut registry);
        registry
    }

    /// Register `factory` under `alias`, replacing any earlier entry.
    pub fn register<F>(&mut self, alias: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn Component>, ComponentError> + 'static,
    {
        self.factories.insert(alias.to_string(), Box::new(factory));
        self
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.factories.contains_key(alias)
    }

    /// Aliases in registration order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Construct the component registered under `alias`.
    pub fn create(&self, alias: &str) -> Result<Box<dyn Component>, DefinitionError> {
        let factory = self
            .factories
            .get(alias)
            .ok_or_else(|| DefinitionError::UnknownComponent {
                alias: alias.to_string(),
            })?;
        factory().map_err(|source| DefinitionError::Construction {
            alias: alias.to_string(),
            source,
        })
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("aliases", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_aliases_are_registered_in_order() {
        let registry = ComponentRegistry::with_builtin();
        let aliases: Vec<&str> = registry.aliases().collect();
        assert_eq!(
            aliases,
            vec!["pages", "categories", "customer_groups", "customers", "webforms"]
        );
        for alias in aliases {
            let component = registry.create(alias).expect("construct builtin");
            assert_eq!(component.alias(), alias);
        }
    }

    #[test]
    fn unknown_alias_is_a_definition_error() {
        let registry = ComponentRegistry::new();
        let err = registry.create("blocks").err().expect("unknown alias");
        assert!(matches!(err, DefinitionError::UnknownComponent { alias } if alias == "blocks"));
    }

    #[test]
    fn failing_factory_surfaces_as_construction_error() {
        let mut registry = ComponentRegistry::new();
        registry.register("broken", || {
            Err(ComponentError::Construction(
                "missing store dependency".to_string(),
            ))
        });
        let err = registry.create("broken").err().expect("construction fails");
        assert!(err.to_string().contains("missing store dependency"), "{err}");
    }
}
