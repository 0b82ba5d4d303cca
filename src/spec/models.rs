//! Canonical operation records extracted from specification documents.

use crate::discovery::ApiVersion;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// HTTP verbs recognised in `paths.<template>.<method>` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "patch" => Ok(Self::Patch),
            "delete" => Ok(Self::Delete),
            "head" => Ok(Self::Head),
            _ => Err(()),
        }
    }
}

/// Where a parameter travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
    FormData,
}

impl ParameterLocation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Body => "body",
            Self::FormData => "formData",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ParameterLocation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path" => Ok(Self::Path),
            "query" => Ok(Self::Query),
            "header" => Ok(Self::Header),
            "body" => Ok(Self::Body),
            "formData" => Ok(Self::FormData),
            _ => Err(()),
        }
    }
}

/// A single operation parameter with its language-neutral type surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    /// `string`, `integer`, `array<T>`, or a bare definition name.
    /// Never contains `$ref` text.
    pub type_string: String,
    pub description: String,
}

/// One response entry keyed by a three-digit status or `default`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status_code: String,
    pub description: String,
    /// Absent when the response carries no schema.
    pub schema_type: Option<String>,
}

/// The wire contract of a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub operation_id: String,
    pub http_method: HttpMethod,
    /// Path template with `{name}` placeholders, verbatim from the document.
    pub path_template: String,
    pub parameters: Vec<Parameter>,
    pub responses: BTreeMap<String, Response>,
    pub description: String,
}

/// Identifies a named schema definition with source traceability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionKey {
    pub file_name: String,
    pub definition_name: String,
    /// 1-based line of the definition in its source file; 0 when the
    /// raw text could not be located.
    pub line_number: usize,
}

/// Scans a document's raw text for its `#/definitions/*` entries and
/// records each with a source line number.
#[must_use]
pub fn definition_keys(file_name: &str, document: &Value, raw_text: &str) -> Vec<DefinitionKey> {
    let Some(definitions) = document.get("definitions").and_then(Value::as_object) else {
        return Vec::new();
    };
    let lines: Vec<&str> = raw_text.lines().collect();
    let definitions_start = lines
        .iter()
        .position(|line| line.contains("\"definitions\""))
        .unwrap_or(0);
    definitions
        .keys()
        .map(|name| {
            let needle = format!("\"{name}\"");
            let line_number = lines
                .iter()
                .enumerate()
                .skip(definitions_start)
                .find(|(_, line)| line.contains(&needle))
                .map_or(0, |(idx, _)| idx + 1);
            DefinitionKey {
                file_name: file_name.to_string(),
                definition_name: name.clone(),
                line_number,
            }
        })
        .collect()
}

/// Transforms a file name into PascalCase for duplicate-definition
/// disambiguation: `network-interfaces.json` becomes `NetworkInterfaces`.
#[must_use]
pub fn pascal_case_file_name(file_name: &str) -> String {
    let stem = file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem);
    stem.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect()
}

/// Accumulates definitions across documents and resolves name clashes
/// for the downstream code generator.
#[derive(Debug, Default)]
pub struct DefinitionCatalog {
    entries: Vec<(DefinitionKey, ApiVersion)>,
}

impl DefinitionCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every definition of `document` under its source file.
    pub fn add_document(
        &mut self,
        file_name: &str,
        api_version: &ApiVersion,
        document: &Value,
        raw_text: &str,
    ) {
        for key in definition_keys(file_name, document, raw_text) {
            self.entries.push((key, api_version.clone()));
        }
    }

    /// Definition names claimed by more than one source file, sorted.
    #[must_use]
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for (key, _) in &self.entries {
            *counts.entry(key.definition_name.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Maps each emitted name to the definition that owns it.
    ///
    /// Unique definitions keep their own name. Duplicates are prefixed
    /// with their source file name in PascalCase; when even that
    /// collides (the same file name in two version directories), the
    /// entry with the newer date wins.
    #[must_use]
    pub fn resolve(&self) -> IndexMap<String, DefinitionKey> {
        let duplicates: std::collections::HashSet<String> =
            self.duplicate_names().into_iter().collect();
        let mut resolved: IndexMap<String, (DefinitionKey, ApiVersion)> = IndexMap::new();
        for (key, version) in &self.entries {
            let emitted = if duplicates.contains(&key.definition_name) {
                format!(
                    "{}{}",
                    pascal_case_file_name(&key.file_name),
                    key.definition_name
                )
            } else {
                key.definition_name.clone()
            };
            match resolved.get(&emitted) {
                Some((_, existing)) if existing.date >= version.date => {}
                _ => {
                    resolved.insert(emitted, (key.clone(), version.clone()));
                }
            }
        }
        resolved
            .into_iter()
            .map(|(name, (key, _))| (name, key))
            .collect()
    }
}
