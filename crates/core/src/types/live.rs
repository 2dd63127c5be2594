//! Real-time event types

use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Real-time update strategy for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveMode {
    /// Invalidate the cached result on every matching event
    Auto,
    /// Hand events to the caller and leave the cache alone
    Manual,
    /// Do not subscribe
    #[default]
    Off,
}

impl FromStr for LiveMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(LiveMode::Auto),
            "manual" => Ok(LiveMode::Manual),
            "off" => Ok(LiveMode::Off),
            other => Err(Error::configuration(format!(
                "unknown live mode '{other}', expected one of auto, manual, off"
            ))),
        }
    }
}

/// Kind of change a live event reports
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LiveEventType {
    Created,
    Updated,
    Deleted,
    /// Matches every event type when used in a subscription
    All,
    Custom(String),
}

impl LiveEventType {
    pub fn as_str(&self) -> &str {
        match self {
            LiveEventType::Created => "created",
            LiveEventType::Updated => "updated",
            LiveEventType::Deleted => "deleted",
            LiveEventType::All => crate::constants::LIVE_EVENT_WILDCARD,
            LiveEventType::Custom(name) => name,
        }
    }

    /// Whether an event of type `other` is selected by this subscription type
    pub fn matches(&self, other: &LiveEventType) -> bool {
        matches!(self, LiveEventType::All) || self == other
    }
}

impl From<String> for LiveEventType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "created" => LiveEventType::Created,
            "updated" => LiveEventType::Updated,
            "deleted" => LiveEventType::Deleted,
            crate::constants::LIVE_EVENT_WILDCARD => LiveEventType::All,
            _ => LiveEventType::Custom(value),
        }
    }
}

impl From<LiveEventType> for String {
    fn from(value: LiveEventType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for LiveEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event delivered by a live provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEvent {
    pub channel: String,
    #[serde(rename = "type")]
    pub event_type: LiveEventType,
    pub payload: serde_json::Value,
    pub date: DateTime<Utc>,
}

impl LiveEvent {
    pub fn new(
        channel: impl Into<String>,
        event_type: LiveEventType,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            channel: channel.into(),
            event_type,
            payload,
            date: Utc::now(),
        }
    }
}
