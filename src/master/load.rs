//! Master definition loading and validation.
//!
//! Validation scans every version and component and reports all findings at
//! once. Component aliases are checked by constructing the registered
//! implementation so a broken factory surfaces before anything is applied.
use super::{ComponentConfig, ComponentSet, EnvOverlay, MasterDefinition, SourceRef, VersionNumber};
use crate::error::{DefinitionError, DefinitionIssue, IssueKind};
use crate::registry::ComponentRegistry;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const VERSIONS_KEY: &str = "versions";

#[derive(Debug, Deserialize)]
struct RawComponent {
    enabled: Option<bool>,
    sources: Option<Vec<String>>,
    env: Option<IndexMap<String, Option<RawOverlay>>>,
}

#[derive(Debug, Deserialize)]
struct RawOverlay {
    sources: Option<Vec<String>>,
}

impl MasterDefinition {
    /// Read, parse, and validate the master definition at `path`.
    pub fn load(path: &Path, registry: &ComponentRegistry) -> Result<Self, DefinitionError> {
        if !path.is_file() {
            return Err(DefinitionError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path).map_err(|source| DefinitionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "found master definition");
        Self::from_yaml(&text, path, registry)
    }

    /// Parse and validate a master definition held in memory.
    pub fn from_yaml(
        text: &str,
        path: &Path,
        registry: &ComponentRegistry,
    ) -> Result<Self, DefinitionError> {
        let document: Value =
            serde_yaml::from_str(text).map_err(|source| DefinitionError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        let versions = document
            .get(VERSIONS_KEY)
            .and_then(Value::as_mapping)
            .ok_or_else(|| DefinitionError::NoVersions {
                path: path.to_path_buf(),
            })?;
        if versions.is_empty() {
            return Err(DefinitionError::NoVersions {
                path: path.to_path_buf(),
            });
        }

        let mut validator = Validator {
            registry,
            issues: Vec::new(),
        };
        let parsed = validator.versions(versions);
        if !validator.issues.is_empty() {
            return Err(DefinitionError::Invalid {
                path: path.to_path_buf(),
                issues: validator.issues,
            });
        }
        Ok(MasterDefinition {
            path: PathBuf::from(path),
            versions: parsed,
        })
    }
}

struct Validator<'a> {
    registry: &'a ComponentRegistry,
    issues: Vec<DefinitionIssue>,
}

impl Validator<'_> {
    fn push(&mut self, version: Option<VersionNumber>, alias: Option<&str>, kind: IssueKind) {
        self.issues.push(DefinitionIssue {
            version,
            alias: alias.map(str::to_string),
            kind,
        });
    }

    fn versions(&mut self, versions: &Mapping) -> BTreeMap<VersionNumber, ComponentSet> {
        let mut parsed = BTreeMap::new();
        let mut previous: Option<VersionNumber> = None;
        for (key, components) in versions {
            let Some(version) = version_key(key) else {
                self.push(None, None, IssueKind::InvalidVersionKey(render_key(key)));
                continue;
            };
            if let Some(previous) = previous.filter(|previous| *previous >= version) {
                self.push(Some(version), None, IssueKind::VersionOutOfOrder { previous });
                continue;
            }
            previous = Some(version);
            let set = match components {
                Value::Null => ComponentSet::new(),
                Value::Mapping(components) => self.components(version, components),
                _ => {
                    self.push(Some(version), None, IssueKind::NotAMapping);
                    continue;
                }
            };
            parsed.insert(version, set);
        }
        parsed
    }

    fn components(&mut self, version: VersionNumber, components: &Mapping) -> ComponentSet {
        let mut set = ComponentSet::new();
        for (key, entry) in components {
            let alias = render_key(key);
            if let Some(config) = self.component(version, &alias, entry) {
                set.insert(alias, config);
            }
        }
        set
    }

    fn component(
        &mut self,
        version: VersionNumber,
        alias: &str,
        entry: &Value,
    ) -> Option<ComponentConfig> {
        if !entry.is_mapping() {
            self.push(Some(version), Some(alias), IssueKind::NotAMapping);
            return None;
        }
        let raw: RawComponent = match serde_yaml::from_value(entry.clone()) {
            Ok(raw) => raw,
            Err(err) => {
                self.push(
                    Some(version),
                    Some(alias),
                    IssueKind::MalformedComponent(err.to_string()),
                );
                return None;
            }
        };

        let config = ComponentConfig {
            enabled: raw.enabled.unwrap_or(false),
            sources: to_sources(raw.sources),
            env: raw
                .env
                .unwrap_or_default()
                .into_iter()
                .map(|(name, overlay)| {
                    let sources = overlay.and_then(|overlay| overlay.sources);
                    (name, EnvOverlay { sources: to_sources(sources) })
                })
                .collect(),
        };

        let mut valid = true;
        if raw.enabled.is_none() {
            self.push(Some(version), Some(alias), IssueKind::MissingEnabled);
            valid = false;
        }
        if config.total_sources() == 0 {
            self.push(Some(version), Some(alias), IssueKind::NoSources);
            valid = false;
        }
        if !self.registry.contains(alias) {
            self.push(Some(version), Some(alias), IssueKind::UnknownComponent);
            valid = false;
        } else {
            tracing::trace!(component = alias, "does the component exist?");
            if let Err(err) = self.registry.create(alias) {
                let message = match err {
                    DefinitionError::Construction { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                self.push(Some(version), Some(alias), IssueKind::Construction(message));
                valid = false;
            }
        }
        valid.then_some(config)
    }
}

fn to_sources(sources: Option<Vec<String>>) -> Vec<SourceRef> {
    sources
        .unwrap_or_default()
        .into_iter()
        .map(SourceRef::new)
        .collect()
}

fn version_key(key: &Value) -> Option<VersionNumber> {
    match key {
        Value::Number(number) => number
            .as_u64()
            .and_then(|value| u32::try_from(value).ok())
            .map(VersionNumber::new),
        Value::String(text) if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) => {
            text.parse().ok()
        }
        _ => None,
    }
}

fn render_key(key: &Value) -> String {
    match key {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => "~".to_string(),
        other => serde_yaml::to_string(other)
            .map(|text| text.trim().to_string())
            .unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}
