//! JSON `$ref` resolution across document and file boundaries.

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Resolves `$ref` strings against a root document, loading and caching
/// external files as they are first referenced.
///
/// The cache maps canonical path strings to parsed documents; entries
/// are immutable once inserted and missing files are negative-cached.
/// The resolver is shared freely across threads.
#[derive(Debug, Default)]
pub struct ReferenceResolver {
    cache: Mutex<HashMap<PathBuf, Option<Arc<Value>>>>,
}

impl ReferenceResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `reference` and return an owned copy of the target node.
    ///
    /// Accepted forms:
    /// - `#/a/b/c` — pointer within `root`;
    /// - `relPath#/a/b/c` — pointer within the file at `relPath`,
    ///   resolved against the parent directory of `base_path`;
    /// - `relPath#/` — the root of that file.
    ///
    /// Any other shape, a missing file, or a dangling pointer yields
    /// `None`.
    #[must_use]
    pub fn resolve(&self, reference: &str, root: &Value, base_path: &Path) -> Option<Value> {
        let Some((file_part, pointer)) = reference.split_once('#') else {
            tracing::debug!(reference, "unsupported reference shape");
            return None;
        };
        if !pointer.is_empty() && !pointer.starts_with('/') {
            tracing::debug!(reference, "unsupported reference pointer");
            return None;
        }
        if file_part.is_empty() {
            return eval_pointer(root, pointer);
        }
        if file_part.contains("://") {
            tracing::debug!(reference, "remote references are not supported");
            return None;
        }
        let target = base_path.parent()?.join(file_part);
        let document = self.load(&target)?;
        eval_pointer(&document, pointer)
    }

    /// Load a document through the cache, keyed by canonical path.
    fn load(&self, path: &Path) -> Option<Arc<Value>> {
        let key = canonical_key(path);
        let mut cache = self.cache.lock().expect("reference cache poisoned");
        if let Some(entry) = cache.get(&key) {
            return entry.clone();
        }
        let loaded = read_document(&key);
        cache.insert(key, loaded.clone());
        loaded
    }

    /// Number of cached external documents, negative entries included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.lock().expect("reference cache poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all cached documents. For long-running generator runs.
    pub fn clear(&self) {
        self.cache.lock().expect("reference cache poisoned").clear();
    }
}

fn read_document(path: &Path) -> Option<Arc<Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "external reference not readable");
            return None;
        }
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(document) => Some(Arc::new(document)),
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "external reference not valid JSON");
            None
        }
    }
}

/// Canonicalize when the file exists; otherwise normalize lexically so
/// different relative spellings of a missing file share one cache key.
fn canonical_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| lexical_normalize(path))
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Walk a slash-separated pointer. `/` and the empty pointer address
/// the document root; source inputs never embed `/` or `~` in keys, so
/// no escape handling is required.
fn eval_pointer(document: &Value, pointer: &str) -> Option<Value> {
    if pointer.is_empty() || pointer == "/" {
        return Some(document.clone());
    }
    document.pointer(pointer).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root() -> Value {
        json!({
            "definitions": {
                "Widget": {"type": "object"},
                "Name": {"type": "string"}
            },
            "parameters": {
                "ApiVersion": {"name": "api-version", "in": "query"}
            }
        })
    }

    #[test]
    fn test_internal_pointer() {
        let resolver = ReferenceResolver::new();
        let resolved = resolver
            .resolve("#/definitions/Widget", &root(), Path::new("/tmp/spec.json"))
            .unwrap();
        assert_eq!(resolved, json!({"type": "object"}));
    }

    #[test]
    fn test_internal_pointer_nested() {
        let resolver = ReferenceResolver::new();
        let resolved = resolver
            .resolve(
                "#/parameters/ApiVersion",
                &root(),
                Path::new("/tmp/spec.json"),
            )
            .unwrap();
        assert_eq!(resolved["name"], "api-version");
    }

    #[test]
    fn test_dangling_internal_pointer() {
        let resolver = ReferenceResolver::new();
        assert!(resolver
            .resolve("#/definitions/Missing", &root(), Path::new("/tmp/spec.json"))
            .is_none());
    }

    #[test]
    fn test_unsupported_shapes() {
        let resolver = ReferenceResolver::new();
        let base = Path::new("/tmp/spec.json");
        assert!(resolver.resolve("definitions/Widget", &root(), base).is_none());
        assert!(resolver
            .resolve("https://example.com/spec.json#/definitions/Widget", &root(), base)
            .is_none());
    }

    #[test]
    fn test_missing_external_file_negative_cached() {
        let resolver = ReferenceResolver::new();
        let base = Path::new("/tmp/does-not-exist/spec.json");
        assert!(resolver
            .resolve("./missing.json#/definitions/Widget", &root(), base)
            .is_none());
        assert_eq!(resolver.len(), 1);
        // Second lookup hits the negative cache entry.
        assert!(resolver
            .resolve("missing.json#/definitions/Widget", &root(), base)
            .is_none());
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_clear_empties_cache() {
        let resolver = ReferenceResolver::new();
        let base = Path::new("/tmp/does-not-exist/spec.json");
        resolver.resolve("./gone.json#/", &root(), base);
        assert!(!resolver.is_empty());
        resolver.clear();
        assert!(resolver.is_empty());
    }

    #[test]
    fn test_lexical_normalize() {
        assert_eq!(
            lexical_normalize(Path::new("/a/b/../c/./d.json")),
            PathBuf::from("/a/c/d.json")
        );
    }
}
