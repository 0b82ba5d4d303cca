use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use stratus_sdk::discovery::{ApiVersion, SpecificationIndex};
use tempfile::TempDir;

/// Writes a minimal Swagger 2.0 document defining `operation_id` at the
/// given tree-relative path.
fn write_spec(root: &Path, rel: &str, operation_id: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let document = json!({
        "swagger": "2.0",
        "info": {"title": "Test", "version": "1.0"},
        "paths": {
            "/widgets/{name}": {
                "get": {
                    "operationId": operation_id,
                    "responses": {"200": {"description": "OK"}}
                }
            }
        }
    });
    fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();
    path
}

#[test]
fn newer_stable_version_wins_tie_break() {
    let tree = TempDir::new().unwrap();
    write_spec(
        tree.path(),
        "widgets/resource-manager/stable/2023-01-01/a.json",
        "Foo_Get",
    );
    let newer = write_spec(
        tree.path(),
        "widgets/resource-manager/stable/2024-07-01/b.json",
        "Foo_Get",
    );

    let mut index = SpecificationIndex::new(tree.path());
    let best = index.find_operation("Foo_Get").expect("operation exists");
    assert_eq!(best.path, newer);
    assert_eq!(best.api_version.version, "2024-07-01");
    assert!(best.api_version.stable);
    assert_eq!(
        best.api_version.date,
        chrono::NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    );
}

#[test]
fn stable_preferred_over_newer_preview() {
    let tree = TempDir::new().unwrap();
    write_spec(
        tree.path(),
        "widgets/resource-manager/preview/2025-01-01-preview/a.json",
        "Foo_Get",
    );
    let stable = write_spec(
        tree.path(),
        "widgets/resource-manager/stable/2024-01-01/b.json",
        "Foo_Get",
    );

    let mut index = SpecificationIndex::new(tree.path());
    let best = index.find_operation("Foo_Get").expect("operation exists");
    assert_eq!(best.path, stable);
    assert!(best.api_version.stable);
}

#[test]
fn preview_only_catalog_returns_preview() {
    let tree = TempDir::new().unwrap();
    let preview = write_spec(
        tree.path(),
        "widgets/data-plane/preview/2025-03-01-preview/w.json",
        "Widgets_List",
    );

    let mut index = SpecificationIndex::new(tree.path());
    let best = index.find_operation("Widgets_List").expect("preview found");
    assert_eq!(best.path, preview);
    assert!(!best.api_version.stable);
    assert_eq!(best.api_version.version, "2025-03-01");
}

#[test]
fn lexicographic_path_breaks_remaining_ties() {
    let tree = TempDir::new().unwrap();
    let first = write_spec(
        tree.path(),
        "widgets/resource-manager/stable/2024-01-01/a.json",
        "Foo_Get",
    );
    write_spec(
        tree.path(),
        "widgets/resource-manager/stable/2024-01-01/b.json",
        "Foo_Get",
    );

    let mut index = SpecificationIndex::new(tree.path());
    assert_eq!(index.find_operation("Foo_Get").unwrap().path, first);
}

#[test]
fn excluded_directories_are_never_candidates() {
    let tree = TempDir::new().unwrap();
    write_spec(
        tree.path(),
        "widgets/resource-manager/stable/2024-01-01/examples/sample.json",
        "Foo_Get",
    );
    write_spec(
        tree.path(),
        "widgets/resource-manager/test/fixture.json",
        "Foo_Get",
    );
    write_spec(
        tree.path(),
        "widgets/resource-manager/stable/2024-01-01/README.json",
        "Foo_Get",
    );

    let mut index = SpecificationIndex::new(tree.path());
    assert!(index.find_operation("Foo_Get").is_none());
}

#[test]
fn files_outside_plane_directories_are_ignored() {
    let tree = TempDir::new().unwrap();
    write_spec(tree.path(), "widgets/stable/2024-01-01/w.json", "Foo_Get");

    let mut index = SpecificationIndex::new(tree.path());
    assert!(index.find_operation("Foo_Get").is_none());
}

#[test]
fn unversioned_path_gets_sentinel_version() {
    let tree = TempDir::new().unwrap();
    write_spec(tree.path(), "widgets/resource-manager/common/w.json", "Foo_Get");

    let mut index = SpecificationIndex::new(tree.path());
    let found = index.find_operation("Foo_Get").expect("still discovered");
    assert_eq!(found.api_version, ApiVersion::sentinel());
}

#[test]
fn sentinel_version_loses_to_real_version() {
    let tree = TempDir::new().unwrap();
    write_spec(tree.path(), "widgets/resource-manager/common/w.json", "Foo_Get");
    let versioned = write_spec(
        tree.path(),
        "widgets/resource-manager/preview/2020-01-01-preview/w.json",
        "Foo_Get",
    );

    let mut index = SpecificationIndex::new(tree.path());
    assert_eq!(index.find_operation("Foo_Get").unwrap().path, versioned);
}

#[test]
fn unparseable_json_is_skipped_silently() {
    let tree = TempDir::new().unwrap();
    let broken = tree
        .path()
        .join("widgets/resource-manager/stable/2024-01-01/broken.json");
    fs::create_dir_all(broken.parent().unwrap()).unwrap();
    // Contains the operation id as a substring but is not valid JSON.
    fs::write(&broken, "{ Foo_Get ").unwrap();
    let good = write_spec(
        tree.path(),
        "widgets/resource-manager/stable/2023-01-01/good.json",
        "Foo_Get",
    );

    let mut index = SpecificationIndex::new(tree.path());
    assert_eq!(index.find_operation("Foo_Get").unwrap().path, good);
}

#[test]
fn substring_match_alone_is_not_enough() {
    let tree = TempDir::new().unwrap();
    // Document mentions the id in a description but defines no such operation.
    let path = tree
        .path()
        .join("widgets/resource-manager/stable/2024-01-01/w.json");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let document = json!({
        "swagger": "2.0",
        "info": {"description": "see Foo_Get"},
        "paths": {
            "/widgets": {
                "get": {"operationId": "Widgets_List", "responses": {}}
            }
        }
    });
    fs::write(&path, document.to_string()).unwrap();

    let mut index = SpecificationIndex::new(tree.path());
    assert!(index.find_operation("Foo_Get").is_none());
}

#[test]
fn missing_root_yields_not_found() {
    let mut index = SpecificationIndex::new("/definitely/not/a/real/root");
    assert!(index.find_operation("Foo_Get").is_none());
}

#[test]
fn lookups_are_memoized_and_idempotent() {
    let tree = TempDir::new().unwrap();
    let original = write_spec(
        tree.path(),
        "widgets/resource-manager/stable/2024-01-01/w.json",
        "Foo_Get",
    );

    let mut index = SpecificationIndex::new(tree.path());
    let first = index.find_operation("Foo_Get").unwrap();
    // Remove the file; the memoized answer must not change.
    fs::remove_file(&original).unwrap();
    let second = index.find_operation("Foo_Get").unwrap();
    assert_eq!(first, second);

    // Negative results are memoized the same way.
    assert!(index.find_operation("Bar_Get").is_none());
    write_spec(
        tree.path(),
        "widgets/resource-manager/stable/2024-01-01/bar.json",
        "Bar_Get",
    );
    assert!(index.find_operation("Bar_Get").is_none());

    // clear_cache picks up the changed tree.
    index.clear_cache();
    assert!(index.find_operation("Foo_Get").is_none());
    assert!(index.find_operation("Bar_Get").is_some());
}

#[test]
fn find_all_orders_candidates_by_preference() {
    let tree = TempDir::new().unwrap();
    write_spec(
        tree.path(),
        "widgets/resource-manager/preview/2025-06-01-preview/a.json",
        "Foo_Get",
    );
    write_spec(
        tree.path(),
        "widgets/resource-manager/stable/2023-01-01/b.json",
        "Foo_Get",
    );
    write_spec(
        tree.path(),
        "widgets/resource-manager/stable/2024-07-01/c.json",
        "Foo_Get",
    );

    let index = SpecificationIndex::new(tree.path());
    let all = index.find_all("Foo_Get");
    let versions: Vec<&str> = all.iter().map(|f| f.api_version.version.as_str()).collect();
    assert_eq!(versions, vec!["2024-07-01", "2023-01-01", "2025-06-01"]);
}
