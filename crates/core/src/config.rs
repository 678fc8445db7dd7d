//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use url::Url;

use crate::constants::DEFAULT_PAGE_SIZE;
use crate::error::{ClinicError, ClinicResult};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    record_store_url: String,
    page_size: u32,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// The store URL must be an absolute `http` or `https` URL; a trailing
    /// slash is trimmed so endpoint paths can be appended verbatim.
    pub fn new(record_store_url: String, page_size: u32) -> ClinicResult<Self> {
        let trimmed = record_store_url.trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&trimmed)
            .map_err(|e| ClinicError::InvalidInput(format!("record store URL: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ClinicError::InvalidInput(
                "record store URL must use http or https".into(),
            ));
        }
        if page_size == 0 {
            return Err(ClinicError::InvalidInput("page size cannot be zero".into()));
        }

        Ok(Self {
            record_store_url: trimmed,
            page_size,
        })
    }

    pub fn record_store_url(&self) -> &str {
        &self.record_store_url
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}

/// Parse the listing page size from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default page size.
pub fn page_size_from_env_value(value: Option<String>) -> ClinicResult<u32> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value
        .map(|v| {
            v.parse::<u32>()
                .map_err(|e| ClinicError::InvalidInput(format!("page size: {e}")))
        })
        .transpose()?;

    match parsed {
        Some(0) => Err(ClinicError::InvalidInput("page size cannot be zero".into())),
        Some(size) => Ok(size),
        None => Ok(DEFAULT_PAGE_SIZE),
    }
}
