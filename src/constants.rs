// Constants module for shared string constants

pub const CONFIG_FILE: &str = "config.toml";
pub const APPS_DIR: &str = "apps";
pub const CACHE_DIR: &str = "cache";
pub const DOWNLOADS_DIR: &str = "downloads";

pub const DEFAULT_TTL_HOURS: u64 = 24;

/// Verification method keys recorded in app state and cache records.
pub const METHOD_DIGEST: &str = "digest";
pub const METHOD_CHECKSUM_FILE: &str = "checksum_file";

/// Schema version for the doctor --json output format.
/// Increment only on breaking changes to ensure future integrations can safely evolve.
pub const SCHEMA_VERSION: u32 = 1;
