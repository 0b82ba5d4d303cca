//! Extraction of canonical operation records from Swagger 2.0 documents.
//!
//! The extractor walks the untyped JSON tree; it never raises. Partial
//! catalog discovery must not abort a generator run, so every failure
//! path logs and returns `None` (or skips the offending entry).

use crate::discovery::SpecificationFile;
use crate::spec::models::{
    definition_keys, DefinitionKey, HttpMethod, OperationRecord, Parameter, ParameterLocation,
    Response,
};
use crate::spec::resolver::ReferenceResolver;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Bound on `$ref` chains and nested arrays during type extraction.
const MAX_TYPE_DEPTH: usize = 32;

/// Primitive type names returned verbatim by the type rules.
const PRIMITIVE_TYPES: &[&str] = &["string", "integer", "number", "boolean", "object"];

/// An operation record together with the raw material the code
/// generator consumes: the untouched operation node, the document
/// root, and the document's definitions with source line numbers.
#[derive(Debug, Clone)]
pub struct ExtractedOperation {
    pub record: OperationRecord,
    pub source: SpecificationFile,
    pub raw_operation: Value,
    pub raw_document: Value,
    pub definitions: Vec<DefinitionKey>,
}

/// Extract the operation record for `operation_id` from `file`.
///
/// Returns `None` when the file is unreadable, not JSON, or does not
/// define the operation.
#[must_use]
pub fn extract_operation(
    file: &SpecificationFile,
    operation_id: &str,
    resolver: &ReferenceResolver,
) -> Option<OperationRecord> {
    extract_detailed(file, operation_id, resolver).map(|detailed| detailed.record)
}

/// Extract the operation plus the raw generator-side material.
#[must_use]
pub fn extract_detailed(
    file: &SpecificationFile,
    operation_id: &str,
    resolver: &ReferenceResolver,
) -> Option<ExtractedOperation> {
    let raw_text = match std::fs::read_to_string(&file.path) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(path = %file.path.display(), %err, "specification not readable");
            return None;
        }
    };
    let document: Value = match serde_json::from_str(&raw_text) {
        Ok(document) => document,
        Err(err) => {
            tracing::debug!(path = %file.path.display(), %err, "specification not valid JSON");
            return None;
        }
    };
    let (template, method, operation) = find_operation(&document, operation_id)?;
    let record = build_record(
        operation_id,
        method,
        template,
        operation,
        &document,
        &file.path,
        resolver,
    );
    let raw_operation = operation.clone();
    let file_name = file
        .path
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    let definitions = definition_keys(&file_name, &document, &raw_text);
    Some(ExtractedOperation {
        record,
        source: file.clone(),
        raw_operation,
        raw_document: document,
        definitions,
    })
}

/// Locate `paths.<template>.<method>` whose `operationId` matches.
fn find_operation<'a>(
    document: &'a Value,
    operation_id: &str,
) -> Option<(&'a str, HttpMethod, &'a Value)> {
    let paths = document.get("paths")?.as_object()?;
    for (template, path_item) in paths {
        let Some(methods) = path_item.as_object() else {
            continue;
        };
        for (verb, operation) in methods {
            let Ok(method) = HttpMethod::from_str(verb) else {
                continue;
            };
            if operation.get("operationId").and_then(Value::as_str) == Some(operation_id) {
                return Some((template.as_str(), method, operation));
            }
        }
    }
    None
}

fn build_record(
    operation_id: &str,
    method: HttpMethod,
    template: &str,
    operation: &Value,
    document: &Value,
    base_path: &Path,
    resolver: &ReferenceResolver,
) -> OperationRecord {
    let description = operation
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut parameters = Vec::new();
    if let Some(entries) = operation.get("parameters").and_then(Value::as_array) {
        for entry in entries {
            match extract_parameter(entry, document, base_path, resolver) {
                Some(parameter) => parameters.push(parameter),
                None => {
                    tracing::debug!(operation_id, "skipping unresolvable parameter");
                }
            }
        }
    }

    let mut responses = BTreeMap::new();
    if let Some(entries) = operation.get("responses").and_then(Value::as_object) {
        for (status, entry) in entries {
            match extract_response(status, entry, document, base_path, resolver) {
                Some(response) => {
                    responses.insert(status.clone(), response);
                }
                None => {
                    tracing::debug!(operation_id, status = %status, "skipping unresolvable response");
                }
            }
        }
    }

    OperationRecord {
        operation_id: operation_id.to_string(),
        http_method: method,
        path_template: template.to_string(),
        parameters,
        responses,
        description,
    }
}

/// Resolve a parameter entry (possibly a `$ref`) into a [`Parameter`].
/// Unresolvable entries are dropped by the caller.
fn extract_parameter(
    entry: &Value,
    document: &Value,
    base_path: &Path,
    resolver: &ReferenceResolver,
) -> Option<Parameter> {
    let node = deref(entry, document, base_path, resolver)?;
    let name = node.get("name")?.as_str()?.to_string();
    let location = node
        .get("in")
        .and_then(Value::as_str)
        .and_then(|s| ParameterLocation::from_str(s).ok())?;
    let required = node
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let type_string = extract_type_string(&node, document, base_path, resolver, 0);
    let description = node
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(Parameter {
        name,
        location,
        required,
        type_string,
        description,
    })
}

fn extract_response(
    status: &str,
    entry: &Value,
    document: &Value,
    base_path: &Path,
    resolver: &ReferenceResolver,
) -> Option<Response> {
    let node = deref(entry, document, base_path, resolver)?;
    let description = node
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let schema_type = node
        .get("schema")
        .map(|schema| extract_type_string(schema, document, base_path, resolver, 0));
    Some(Response {
        status_code: status.to_string(),
        description,
        schema_type,
    })
}

/// Follow one `$ref` hop when present; otherwise return the node as-is.
fn deref(
    entry: &Value,
    document: &Value,
    base_path: &Path,
    resolver: &ReferenceResolver,
) -> Option<Value> {
    match entry.get("$ref").and_then(Value::as_str) {
        Some(reference) => resolver.resolve(reference, document, base_path),
        None => Some(entry.clone()),
    }
}

/// The language-neutral type surface of a schema-ish node.
///
/// Rules, in order: a recognised `type` field wins (`array` recurses
/// into `items`); a `schema` sub-object is recursed into; a `$ref` is
/// resolved and re-examined, falling back to the bare definition name;
/// anything else is `object`.
#[must_use]
pub fn extract_type_string(
    node: &Value,
    document: &Value,
    base_path: &Path,
    resolver: &ReferenceResolver,
    depth: usize,
) -> String {
    if depth >= MAX_TYPE_DEPTH {
        tracing::debug!("type extraction depth limit reached");
        return "object".to_string();
    }
    if let Some(type_name) = node.get("type").and_then(Value::as_str) {
        if type_name == "array" {
            let item_type = node.get("items").map_or_else(
                || "object".to_string(),
                |items| extract_type_string(items, document, base_path, resolver, depth + 1),
            );
            return format!("array<{item_type}>");
        }
        if PRIMITIVE_TYPES.contains(&type_name) {
            return type_name.to_string();
        }
    }
    if let Some(schema) = node.get("schema") {
        return extract_type_string(schema, document, base_path, resolver, depth + 1);
    }
    if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
        if let Some(target) = resolver.resolve(reference, document, base_path) {
            if target.get("type").is_some() {
                return extract_type_string(&target, document, base_path, resolver, depth + 1);
            }
        }
        return definition_name(reference);
    }
    "object".to_string()
}

/// The substring after the final `/` of a reference.
fn definition_name(reference: &str) -> String {
    reference
        .rsplit('/')
        .next()
        .unwrap_or(reference)
        .to_string()
}
