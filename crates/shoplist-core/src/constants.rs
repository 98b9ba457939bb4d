//! Application-wide constants
//!
//! Wire values, default endpoints and file names shared across modules.

/// Prefix for ids assigned on this device before the server hands out a real one
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Default base URL of the item backend (sync, create, update, delete)
pub const DEFAULT_BACKEND_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Default base URL of the data services (sort ranking, collect telemetry)
pub const DEFAULT_DATA_BASE_URL: &str = "http://localhost:8001";

/// Default directory for the persisted application state
pub const DEFAULT_DATA_DIR: &str = "shoplist_data";

/// File name of the persisted application state inside the data dir
pub const LOCAL_STORE_FILE: &str = "local_store.json";

/// HTTP method the backend expects for in-place updates
pub const UPDATE_METHOD: &str = "UPDATE";

// Done flag, kept as an integer for wire compatibility
pub const NOT_DONE: u8 = 0;
pub const DONE: u8 = 1;

/// Revision a freshly created item carries before its first acknowledgment
pub const UNSYNCED_REVISION: i64 = -1;

// Collect telemetry action types
pub const ACTION_CROSSED: &str = "CROSSED";
pub const ACTION_UNCROSSED: &str = "UNCROSSED";
