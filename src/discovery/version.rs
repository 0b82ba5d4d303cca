//! API version extraction from specification tree paths.

use crate::constants;
use chrono::NaiveDate;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(constants::VERSION_PATTERN).expect("version pattern is hardcoded and valid")
    })
}

/// Maturity and date of an API version directory, derived from a
/// specification file's path. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersion {
    /// The `YYYY-MM-DD` substring from the path, or `unknown`.
    pub version: String,
    /// Parsed calendar date; [`NaiveDate::MIN`] when parsing failed.
    pub date: NaiveDate,
    /// True iff the path carries the `stable` marker segment.
    pub stable: bool,
}

impl ApiVersion {
    /// Derive the version from a path shaped
    /// `.../(stable|preview)/YYYY-MM-DD[-preview]/<service>.json`.
    ///
    /// Paths that do not match yield the sentinel version
    /// `(unknown, NaiveDate::MIN, false)`.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let text = path.to_string_lossy();
        version_regex().captures(&text).map_or_else(Self::sentinel, |caps| {
            let marker = &caps[1];
            let version = caps[2].to_string();
            let date = NaiveDate::parse_from_str(&version, "%Y-%m-%d").unwrap_or(NaiveDate::MIN);
            Self {
                version,
                date,
                stable: marker == constants::SEGMENT_STABLE,
            }
        })
    }

    /// The version recorded for paths outside the versioned layout.
    /// Sorts oldest, so real versions always win candidate selection.
    #[must_use]
    pub fn sentinel() -> Self {
        Self {
            version: constants::VERSION_UNKNOWN.to_string(),
            date: NaiveDate::MIN,
            stable: false,
        }
    }
}

/// Immutable handle to a single specification document.
/// Identity is the absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecificationFile {
    pub path: PathBuf,
    pub api_version: ApiVersion,
}

impl SpecificationFile {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        let api_version = ApiVersion::from_path(&path);
        Self { path, api_version }
    }
}
