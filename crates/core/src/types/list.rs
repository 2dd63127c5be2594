//! The envelope a list operation answers with

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A record as delivered by a data provider
pub type BaseRecord = serde_json::Value;

/// Result envelope of a list operation.
///
/// `total` is the backend's count of all matching records, which may exceed
/// `data.len()` when the backend or the client paginates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult<R = BaseRecord> {
    pub data: Vec<R>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl<R> Default for ListResult<R> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            total: None,
        }
    }
}

impl<R> ListResult<R> {
    pub fn new(data: Vec<R>, total: Option<u64>) -> Self {
        Self { data, total }
    }

    /// Envelope exposed while no result exists yet
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<R: Clone> ListResult<R> {
    /// Copy of the records within `window`, clipped to the available length.
    /// `total` is carried over unchanged.
    pub fn window(&self, window: Range<usize>) -> Self {
        let start = window.start.min(self.data.len());
        let end = window.end.clamp(start, self.data.len());
        Self {
            data: self.data[start..end].to_vec(),
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_clips_to_length() {
        let result = ListResult::new((0..7).collect::<Vec<_>>(), Some(42));
        assert_eq!(result.window(5..10).data, vec![5, 6]);
        assert_eq!(result.window(5..10).total, Some(42));
        assert!(result.window(10..15).data.is_empty());
    }

    #[test]
    fn test_empty_envelope() {
        let empty: ListResult = ListResult::empty();
        assert!(empty.data.is_empty());
        assert_eq!(empty.total, None);
    }
}
