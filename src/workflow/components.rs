//! Components command: what the registry can dispatch.
use crate::cli::ComponentsArgs;
use crate::registry::ComponentRegistry;
use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ComponentInfo {
    pub alias: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Print every registered alias with its display name and description.
pub fn run_components(args: &ComponentsArgs) -> Result<()> {
    let infos = describe_components(&ComponentRegistry::with_builtin());
    if args.json {
        let text = serde_json::to_string_pretty(&infos).context("serialize components")?;
        println!("{text}");
        return Ok(());
    }
    for info in &infos {
        match (&info.name, &info.error) {
            (Some(name), _) => println!(
                "{:<16} {name}: {}",
                info.alias,
                info.description.as_deref().unwrap_or_default()
            ),
            (None, Some(error)) => println!("{:<16} unavailable: {error}", info.alias),
            (None, None) => println!("{}", info.alias),
        }
    }
    Ok(())
}

fn describe_components(registry: &ComponentRegistry) -> Vec<ComponentInfo> {
    registry
        .aliases()
        .map(|alias| match registry.create(alias) {
            Ok(component) => ComponentInfo {
                alias: alias.to_string(),
                name: Some(component.name().to_string()),
                description: Some(component.description().to_string()),
                error: None,
            },
            Err(err) => ComponentInfo {
                alias: alias.to_string(),
                name: None,
                description: None,
                error: Some(err.to_string()),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComponentError;

    #[test]
    fn builtin_components_are_described() {
        let infos = describe_components(&ComponentRegistry::with_builtin());
        assert_eq!(infos.len(), 5);
        assert!(infos
            .iter()
            .all(|info| info.name.is_some() && info.error.is_none()));
    }

    #[test]
    fn construction_failure_is_reported_not_fatal() {
        let mut registry = ComponentRegistry::new();
        registry.register("blocks", || {
            Err(ComponentError::Construction("no block repository".to_string()))
        });
        let infos = describe_components(&registry);
        assert_eq!(infos[0].alias, "blocks");
        assert!(infos[0]
            .error
            .as_deref()
            .is_some_and(|error| error.contains("no block repository")));
    }
}
