// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "AssetDesk";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "assetdesk";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "assetdesk.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "ASSETDESK_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "ASSETDESK_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "ASSETDESK_PORT";

/// Environment variable for log filter (takes precedence over RUST_LOG)
pub const ENV_LOG: &str = "ASSETDESK_LOG";

/// Default log filter
pub const DEFAULT_LOG_FILTER: &str = "info,assetdesk=info";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

/// Maximum request body size accepted by the filter endpoint
pub const MAX_REQUEST_BODY_BYTES: usize = 256 * 1024;

// =============================================================================
// SQLite Database
// =============================================================================

/// Environment variable for the database path
pub const ENV_DATABASE: &str = "ASSETDESK_DATABASE";

/// Default database path, relative to the working directory
pub const DEFAULT_DATABASE_PATH: &str = "assetdesk.db";

/// In-memory database marker
pub const SQLITE_MEMORY: &str = ":memory:";

/// Maximum connections in the pool
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// Busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// Pool acquire timeout in seconds
pub const SQLITE_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Page cache size (negative = KiB)
pub const SQLITE_CACHE_SIZE: &str = "-64000";

/// Pages between automatic WAL checkpoints
pub const SQLITE_WAL_AUTOCHECKPOINT: &str = "1000";

/// Interval for the background WAL checkpoint task
pub const SQLITE_CHECKPOINT_INTERVAL_SECS: u64 = 300;

// =============================================================================
// Filtering
// =============================================================================

/// Page size when neither the request nor the entity sets one
pub const DEFAULT_ITEMS_PER_PAGE: u32 = 20;

/// Upper bound for page sizes on the query-string surface
pub const MAX_PAGE_LIMIT: u32 = 500;

/// Maximum size of the `filters` query parameter
pub const MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Maximum number of conditions accepted in one request
pub const MAX_FILTER_CONDITIONS: usize = 50;

// =============================================================================
// Shutdown
// =============================================================================

/// Seconds to wait for in-flight requests after a shutdown signal
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;
