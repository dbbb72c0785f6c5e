// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATA_PATH: &str = "data";
pub const DATABASE_FILE_NAME: &str = "finance.db";

// Language model passthrough
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;
pub const AI_SUMMARY_MAX_TOKENS: u32 = 200;

// Database limits and defaults
pub const DEFAULT_TRANSACTIONS_LIMIT: u32 = 500;
pub const MAX_LIMIT: u32 = 1000;

// Validation limits
pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_GOAL_NAME_LENGTH: usize = 100;
pub const MAX_NOTE_LENGTH: usize = 2000;
pub const MAX_PROMPT_LENGTH: usize = 8000;
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

// Insights
pub const ADVISORY_THRESHOLD_PCT: i64 = 30;
pub const BALANCED_ADVISORY: &str = "Spending looks balanced this period.";

// Goal planning
pub const SECONDS_PER_DAY: i64 = 86_400;
pub const DAYS_PER_MONTH: i64 = 30;

// Sync layer
pub const LOCAL_ID_PREFIX: &str = "local-";
pub const DEFAULT_SYNC_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SYNC_MAX_RETRIES: u32 = 2;
pub const DEFAULT_SYNC_BACKOFF_MS: u64 = 200;

// Error messages
pub const ERR_DATABASE_OPERATION: &str = "Database operation failed";
pub const ERR_TRANSACTION_NOT_FOUND: &str = "Transaction not found";
pub const ERR_GOAL_NOT_FOUND: &str = "Goal not found";
pub const ERR_NOTE_NOT_FOUND: &str = "Note not found";
pub const ERR_AI_NOT_CONFIGURED: &str = "AI summary is not configured";
pub const ERR_AI_FAILED: &str = "AI summary request failed";
