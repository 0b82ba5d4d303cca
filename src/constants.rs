//! Shared constants for headers, path markers, and wire defaults.

use std::time::Duration;

// --- Specification tree markers ---

/// Path segment marking a stable API version directory.
pub const SEGMENT_STABLE: &str = "stable";
/// Path segment marking a preview API version directory.
pub const SEGMENT_PREVIEW: &str = "preview";
/// Path segment for management-plane specification trees.
pub const SEGMENT_RESOURCE_MANAGER: &str = "resource-manager";
/// Path segment for data-plane specification trees.
pub const SEGMENT_DATA_PLANE: &str = "data-plane";
/// Path segments excluded from candidate discovery.
pub const EXCLUDED_SEGMENTS: &[&str] = &["examples", "test"];
/// File names excluded from candidate discovery.
pub const EXCLUDED_FILE_NAMES: &[&str] = &["package.json", "tsconfig.json"];
/// File-name substring excluded case-insensitively.
pub const EXCLUDED_README: &str = "readme";
/// Extension considered for specification documents.
pub const SPEC_EXTENSION: &str = "json";

/// Version directory pattern: `/(stable|preview)/YYYY-MM-DD(-preview)?/`.
pub const VERSION_PATTERN: &str = r"[/\\](stable|preview)[/\\](\d{4}-\d{2}-\d{2})(-preview)?[/\\]";
/// Version string used when a path does not match [`VERSION_PATTERN`].
pub const VERSION_UNKNOWN: &str = "unknown";

// --- HTTP headers ---

pub const HEADER_ACCEPT: &str = "Accept";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_USER_AGENT: &str = "User-Agent";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CLIENT_REQUEST_ID: &str = "x-ms-client-request-id";
pub const HEADER_MS_VERSION: &str = "x-ms-version";
pub const HEADER_RETRY_AFTER: &str = "retry-after";
pub const HEADER_METADATA: &str = "Metadata";

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Query parameter paired with the `x-ms-version` header.
pub const QUERY_API_VERSION: &str = "api-version";

// --- Runtime defaults ---

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Product name used in the `User-Agent` header when none is configured.
pub const DEFAULT_PRODUCT: &str = "stratus-sdk";
/// Product version used in the `User-Agent` header when none is configured.
pub const DEFAULT_PRODUCT_VERSION: &str = env!("CARGO_PKG_VERSION");

// --- Token endpoints ---

/// Authority host for the OAuth2 client-credentials flow.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
/// Instance-metadata service endpoint.
pub const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254";
/// Instance-metadata token path.
pub const IMDS_TOKEN_PATH: &str = "/metadata/identity/oauth2/token";
/// Instance-metadata protocol version.
pub const IMDS_API_VERSION: &str = "2018-02-01";

/// Tokens are treated as expired this long before their reported expiry.
pub const TOKEN_EXPIRY_SKEW: Duration = Duration::from_secs(5 * 60);
