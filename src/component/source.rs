//! Source resolution and the small set of text formats components read.
use crate::error::ComponentError;
use crate::master::SourceRef;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Text formats recognised by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Yaml,
    Csv,
    Json,
}

impl SourceFormat {
    fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(SourceFormat::Yaml),
            "csv" => Some(SourceFormat::Csv),
            "json" => Some(SourceFormat::Json),
            _ => None,
        }
    }
}

/// A source locator bound to a concrete place to read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    File { reference: SourceRef, path: PathBuf },
    Url { reference: SourceRef },
}

impl ResolvedSource {
    pub fn resolve(reference: &SourceRef, root: &Path) -> Self {
        let raw = reference.as_str();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return ResolvedSource::Url {
                reference: reference.clone(),
            };
        }
        let path = Path::new(raw);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        };
        ResolvedSource::File {
            reference: reference.clone(),
            path,
        }
    }

    pub fn reference(&self) -> &SourceRef {
        match self {
            ResolvedSource::File { reference, .. } | ResolvedSource::Url { reference } => {
                reference
            }
        }
    }

    /// File sources must exist up front; URLs are checked when fetched.
    pub fn ensure_reachable(&self) -> Result<(), ComponentError> {
        match self {
            ResolvedSource::File { reference, path } if !path.is_file() => {
                Err(ComponentError::SourceNotFound {
                    source_ref: reference.to_string(),
                    path: path.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    pub fn format(&self) -> Option<SourceFormat> {
        let name = match self {
            ResolvedSource::File { path, .. } => path.to_string_lossy().into_owned(),
            ResolvedSource::Url { reference } => {
                let raw = reference.as_str();
                let end = raw.find(['?', '#']).unwrap_or(raw.len());
                raw[..end].to_string()
            }
        };
        let file_name = name.rsplit('/').next().unwrap_or(&name);
        let (_, extension) = file_name.rsplit_once('.')?;
        SourceFormat::from_extension(extension)
    }

    /// Require one of `accepted` formats, naming them in the error.
    pub fn expect_format(
        &self,
        accepted: &[SourceFormat],
        expected: &'static str,
    ) -> Result<SourceFormat, ComponentError> {
        match self.format() {
            Some(format) if accepted.contains(&format) => Ok(format),
            _ => Err(ComponentError::UnsupportedFormat {
                source_ref: self.reference().to_string(),
                expected,
            }),
        }
    }

    pub fn read_to_string(&self) -> Result<String, ComponentError> {
        match self {
            ResolvedSource::File { reference, path } => {
                fs::read_to_string(path).map_err(|source| ComponentError::Read {
                    source_ref: reference.to_string(),
                    source,
                })
            }
            ResolvedSource::Url { reference } => {
                let mut response = fetch(reference)?;
                response
                    .body_mut()
                    .read_to_string()
                    .map_err(|source| fetch_error(reference, source))
            }
        }
    }

    /// Raw bytes, for binary resources such as images.
    pub fn read_bytes(&self) -> Result<Vec<u8>, ComponentError> {
        match self {
            ResolvedSource::File { reference, path } => {
                fs::read(path).map_err(|source| ComponentError::Read {
                    source_ref: reference.to_string(),
                    source,
                })
            }
            ResolvedSource::Url { reference } => {
                let mut response = fetch(reference)?;
                response
                    .body_mut()
                    .read_to_vec()
                    .map_err(|source| fetch_error(reference, source))
            }
        }
    }
}

fn fetch(reference: &SourceRef) -> Result<ureq::http::Response<ureq::Body>, ComponentError> {
    ureq::get(reference.as_str())
        .call()
        .map_err(|source| fetch_error(reference, source))
}

fn fetch_error(reference: &SourceRef, source: ureq::Error) -> ComponentError {
    ComponentError::Fetch {
        source_ref: reference.to_string(),
        source: Box::new(source),
    }
}

/// Parse YAML into a JSON value tree; an empty document is `null`.
pub fn parse_yaml(source: &ResolvedSource, text: &str) -> Result<Value, ComponentError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str(text).map_err(|err| ComponentError::parse(source.reference().as_str(), err))
}

pub fn parse_json(source: &ResolvedSource, text: &str) -> Result<Value, ComponentError> {
    serde_json::from_str(text).map_err(|err| ComponentError::parse(source.reference().as_str(), err))
}

/// Parse CSV whose first row names the columns; one object per data row.
pub fn parse_csv(
    source: &ResolvedSource,
    text: &str,
) -> Result<Vec<Map<String, Value>>, ComponentError> {
    let source_ref = source.reference().as_str();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|err| ComponentError::parse(source_ref, err))?
        .clone();
    if headers.is_empty() {
        return Err(ComponentError::parse(source_ref, "missing header row"));
    }
    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|err| ComponentError::parse(source_ref, err))?;
        let fields = headers
            .iter()
            .zip(row.iter())
            .map(|(column, value)| (column.to_string(), Value::String(value.to_string())))
            .collect();
        rows.push(fields);
    }
    Ok(rows)
}
