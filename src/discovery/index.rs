//! Locates the specification file that defines a named operation.

use crate::constants;
use crate::discovery::version::SpecificationFile;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walks a curated specification tree and answers "which file defines
/// operation X", preferring stable versions and newer dates.
///
/// Lookups are memoized per `operation_id` (negative results included).
/// The index is intended for single-threaded generator runs; share the
/// underlying tree, not the index.
pub struct SpecificationIndex {
    root: PathBuf,
    cache: HashMap<String, Option<SpecificationFile>>,
}

impl SpecificationIndex {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
        }
    }

    /// Returns the best specification file defining `operation_id`, or
    /// `None` when the tree holds no such operation.
    ///
    /// Never fails: directory I/O problems are logged and treated as
    /// *not found*.
    pub fn find_operation(&mut self, operation_id: &str) -> Option<SpecificationFile> {
        if let Some(hit) = self.cache.get(operation_id) {
            return hit.clone();
        }
        let best = self.find_all(operation_id).into_iter().next();
        self.cache.insert(operation_id.to_string(), best.clone());
        best
    }

    /// All candidate files defining `operation_id`, ordered by
    /// preference: stable ahead of preview, newer date ahead of older,
    /// lexicographic path as the final tie-break.
    #[must_use]
    pub fn find_all(&self, operation_id: &str) -> Vec<SpecificationFile> {
        let mut candidates: Vec<SpecificationFile> = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(root = %self.root.display(), %err, "specification walk error");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !is_candidate_path(path) {
                continue;
            }
            if file_defines_operation(path, operation_id) {
                candidates.push(SpecificationFile::new(path.to_path_buf()));
            }
        }
        sort_by_preference(&mut candidates);
        candidates
    }

    /// Drops all memoized lookups. Useful for long-running generator
    /// processes observing a changing tree.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Stable preference order: stable first, then newer date, then path.
fn sort_by_preference(candidates: &mut [SpecificationFile]) {
    candidates.sort_by(|a, b| {
        b.api_version
            .stable
            .cmp(&a.api_version.stable)
            .then_with(|| b.api_version.date.cmp(&a.api_version.date))
            .then_with(|| a.path.cmp(&b.path))
    });
}

/// Path-level filter applied before any file is opened.
fn is_candidate_path(path: &Path) -> bool {
    if path.extension().and_then(|e| e.to_str()) != Some(constants::SPEC_EXTENSION) {
        return false;
    }
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if constants::EXCLUDED_FILE_NAMES.contains(&file_name) {
        return false;
    }
    if file_name
        .to_ascii_lowercase()
        .contains(constants::EXCLUDED_README)
    {
        return false;
    }
    let mut in_plane = false;
    for component in path.components() {
        let Some(segment) = component.as_os_str().to_str() else {
            continue;
        };
        if constants::EXCLUDED_SEGMENTS.contains(&segment) {
            return false;
        }
        if segment == constants::SEGMENT_RESOURCE_MANAGER
            || segment == constants::SEGMENT_DATA_PLANE
        {
            in_plane = true;
        }
    }
    in_plane
}

/// Two-stage containment test: a cheap substring probe, then a JSON
/// parse with an exact `paths.*.*.operationId` match.
fn file_defines_operation(path: &Path, operation_id: &str) -> bool {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to read candidate");
            return false;
        }
    };
    if !content.contains(operation_id) {
        return false;
    }
    let Ok(document) = serde_json::from_str::<Value>(&content) else {
        tracing::debug!(path = %path.display(), "skipping unparseable candidate");
        return false;
    };
    document_defines_operation(&document, operation_id)
}

fn document_defines_operation(document: &Value, operation_id: &str) -> bool {
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return false;
    };
    paths.values().any(|path_item| {
        path_item.as_object().is_some_and(|methods| {
            methods.values().any(|operation| {
                operation.get("operationId").and_then(Value::as_str) == Some(operation_id)
            })
        })
    })
}
