//! Constants used throughout the klinik core crate.

use std::time::Duration;

/// Default Record Store base URL when none is configured.
pub const DEFAULT_RECORD_STORE_URL: &str = "http://localhost:1337";

/// Default page size for paginated listings.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Connect timeout for the shared HTTP client.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall per-request timeout for Record Store calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Path prefix every Record Store collection is mounted under.
pub const API_PREFIX: &str = "/api";
