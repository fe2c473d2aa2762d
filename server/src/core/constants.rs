// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for log filters and identifiers)
pub const APP_NAME_LOWER: &str = "eventhub";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "eventhub.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "EVENTHUB_CONFIG";

// =============================================================================
// Environment Variables - Logging
// =============================================================================

/// Environment variable for log filter (falls back to RUST_LOG)
pub const ENV_LOG: &str = "EVENTHUB_LOG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "EVENTHUB_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "EVENTHUB_PORT";

/// Environment variable for comma-separated CORS origins
pub const ENV_CORS_ORIGINS: &str = "EVENTHUB_CORS_ORIGINS";

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 8000;

/// Default frontend dev server origin
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

// =============================================================================
// Authentication
// =============================================================================

/// Environment variable holding the shared JWT signing secret
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";

/// Environment variable for tolerated clock skew when checking `exp`
pub const ENV_JWT_LEEWAY_SECS: &str = "EVENTHUB_JWT_LEEWAY_SECS";

/// Environment variable for lifetime of tokens issued from the CLI
pub const ENV_JWT_TTL_SECS: &str = "EVENTHUB_JWT_TTL_SECS";

/// Default clock skew leeway (expiry enforced exactly)
pub const DEFAULT_JWT_LEEWAY_SECS: u64 = 0;

/// Default issued token lifetime (1 day)
pub const DEFAULT_JWT_TTL_SECS: u64 = 24 * 60 * 60;

/// Authorization scheme prefix, including the separating space
pub const BEARER_PREFIX: &str = "Bearer ";
