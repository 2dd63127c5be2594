//! Pagination parameters for list queries.

use crate::constants::{DEFAULT_CURRENT_PAGE, DEFAULT_PAGE_SIZE};
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Where pagination is applied.
///
/// `Server` asks the backend for one page and keys the cache on it; `Client`
/// fetches everything and slices locally; `Off` fetches everything and never
/// slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationMode {
    Client,
    #[default]
    Server,
    Off,
}

impl PaginationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaginationMode::Client => "client",
            PaginationMode::Server => "server",
            PaginationMode::Off => "off",
        }
    }
}

impl fmt::Display for PaginationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaginationMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(PaginationMode::Client),
            "server" => Ok(PaginationMode::Server),
            "off" => Ok(PaginationMode::Off),
            other => Err(Error::configuration(format!(
                "unknown pagination mode '{other}', expected one of client, server, off"
            ))),
        }
    }
}

/// Raw, possibly partial pagination supplied at the call site
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<PaginationMode>,
}

impl PaginationInput {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current_page(mut self, page: u32) -> Self {
        self.current_page = Some(page);
        self
    }

    #[must_use]
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: PaginationMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// Fully populated pagination, fixed for the lifetime of one query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub page_size: u32,
    pub mode: PaginationMode,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: DEFAULT_CURRENT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            mode: PaginationMode::Server,
        }
    }
}

impl Pagination {
    pub fn new(current_page: u32, page_size: u32, mode: PaginationMode) -> Self {
        Self {
            current_page: current_page.max(1),
            page_size: page_size.max(1),
            mode,
        }
    }

    pub fn is_server(&self) -> bool {
        self.mode == PaginationMode::Server
    }

    /// Offset of the first record of the current page
    pub fn offset(&self) -> usize {
        (self.current_page.saturating_sub(1) as usize).saturating_mul(self.page_size as usize)
    }

    /// Index window `[(p-1)*s, p*s)` applied locally, only in client mode
    pub fn client_window(&self) -> Option<Range<usize>> {
        if self.mode != PaginationMode::Client {
            return None;
        }
        let start = self.offset();
        Some(start..start.saturating_add(self.page_size as usize))
    }
}
