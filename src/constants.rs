/// Constants module to avoid magic numbers in the codebase

// Network Configuration
pub const DEFAULT_MODEL_BASE_URL: &str = "http://localhost:4000";
pub const TAVILY_API_URL: &str = "https://api.tavily.com/search";
pub const WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";

// Timeouts
pub const GENERATION_TIMEOUT_SECS: u64 = 120;
pub const SEARCH_TIMEOUT_SECS: u64 = 15;

// Session Store
pub const STORE_WRITE_RETRIES: usize = 3;
pub const STORE_RETRY_BACKOFF_MS: u64 = 100;
pub const DOCUMENT_EXT: &str = "json";
pub const BACKUP_EXT: &str = "json.bak";
pub const TEMP_EXT: &str = "json.tmp";
pub const CORRUPT_EXT: &str = "json.corrupt";

// Conversation
pub const NAME_PREVIEW_CHARS: usize = 60;
pub const SESSION_ID_PLACEHOLDER_CHARS: usize = 8;

// Search
pub const SEARCH_TOP_K: usize = 3;

// Default Model Configuration
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: usize = 2048;
