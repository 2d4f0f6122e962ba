/// Service, storage and auth constants

// Service identity
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SERVICE_NAME: &str = "gamepath-api";

// LMDB Configuration
pub const LMDB_MAP_SIZE: usize = 256 * 1024 * 1024; // 256MB for all record tables
pub const LMDB_MAX_DBS: u32 = 10;
pub const LMDB_MAX_READERS: u32 = 256;

// Database names
pub const USERS_DB_NAME: &str = "users";
pub const USER_EMAILS_DB_NAME: &str = "user_emails";
pub const GAMES_DB_NAME: &str = "games";
pub const USER_GAMES_DB_NAME: &str = "user_games";
pub const METRICS_DB_NAME: &str = "metrics";
pub const RESET_TOKENS_DB_NAME: &str = "reset_tokens";

// Query limits
pub const DEFAULT_LIST_LIMIT: usize = 100;
pub const DEFAULT_METRICS_LIMIT: usize = 100;
pub const HISTORY_LIMIT: usize = 5;

// Optimization lookback window for metric-driven analysis
pub const OPTIMIZATION_LOOKBACK_DAYS: i64 = 7;

// Auth defaults
pub const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;
pub const RESET_TOKEN_EXPIRE_MINUTES: i64 = 60;
pub const REFRESH_TOKEN_BYTES: usize = 64;
pub const RESET_TOKEN_BYTES: usize = 32;

// Header names
pub const API_KEY_HEADER: &str = "x-api-key";
pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const CLIENT_SECRET_HEADER: &str = "x-client-secret";
pub const INSTANCE_ID_HEADER: &str = "x-instance-id";
pub const API_VERSION_HEADER: &str = "x-api-version";

// Model artifacts
pub const NETWORK_MODEL_NAME: &str = "network_optimization";
pub const SYSTEM_MODEL_NAME: &str = "system_optimization";
pub const SERVER_MODEL_NAME: &str = "server_recommender";
pub const MODEL_FILE_EXTENSION: &str = "json";
pub const DEFAULT_MODEL_CACHE_TTL_SECONDS: u64 = 3600;
pub const REDIS_MODEL_KEY_PREFIX: &str = "model:";

// Fallback messaging
pub const FALLBACK_MESSAGE: &str = "Basic recommendations due to model unavailability";
pub const DEFAULT_ANALYSIS_NOTE: &str = "Using default recommendations - no metrics available";
