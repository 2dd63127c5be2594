//! Shared constants for listwise

/// Page used when the caller does not specify one
pub const DEFAULT_CURRENT_PAGE: u32 = 1;

/// Page size used when neither the caller nor the configuration specifies one
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Name a provider is registered under when only one is supplied
pub const DEFAULT_DATA_PROVIDER: &str = "default";

/// Action tag stored in the third segment of every list cache key
pub const LIST_ACTION: &str = "list";

/// Marker sent to live providers so they know which use-case subscribed
pub const LIST_SUBSCRIPTION_TYPE: &str = "list-query";

/// Prefix of the live channel derived from a resource name
pub const RESOURCE_CHANNEL_PREFIX: &str = "resources/";

/// Event type that matches every live event
pub const LIVE_EVENT_WILDCARD: &str = "*";

/// Suffix appended to the resource identifier to build notification keys
pub const NOTIFICATION_KEY_SUFFIX: &str = "-list-notification";

/// Translation key for the default error notification message
pub const ERROR_NOTIFICATION_TRANSLATION_KEY: &str = "notifications.error";

/// Default interval between overtime ticks, in milliseconds
pub const DEFAULT_OVERTIME_INTERVAL_MS: u64 = 1000;

// Environment variable names
pub const ENV_CONFIG_PATH: &str = "LISTWISE_CONFIG";
pub const ENV_PAGE_SIZE: &str = "LISTWISE_PAGE_SIZE";
pub const ENV_PAGINATION_MODE: &str = "LISTWISE_PAGINATION_MODE";
pub const ENV_LIVE_MODE: &str = "LISTWISE_LIVE_MODE";
pub const ENV_STALE_TIME_MS: &str = "LISTWISE_STALE_TIME_MS";
pub const ENV_OVERTIME_INTERVAL_MS: &str = "LISTWISE_OVERTIME_INTERVAL_MS";
pub const ENV_DATA_PROVIDER: &str = "LISTWISE_DATA_PROVIDER";
