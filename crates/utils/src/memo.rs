//! Single-slot memoisation keyed on the inputs of a pure derivation

use parking_lot::Mutex;

/// Remembers the last computed value together with the inputs it was
/// computed from. A lookup with equal inputs returns the stored value; any
/// other lookup recomputes and replaces it.
#[derive(Debug)]
pub struct Memo<K, V> {
    slot: Mutex<Option<(K, V)>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<K: PartialEq, V: Clone> Memo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the memoised value for `key`, computing it with `compute` if
    /// the stored inputs differ. `compute` runs without the lock held.
    pub fn get_or_compute(&self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some((stored, value)) = self.slot.lock().as_ref() {
            if *stored == key {
                return value.clone();
            }
        }

        let value = compute();
        *self.slot.lock() = Some((key, value.clone()));
        value
    }

    /// Drop the stored value
    pub fn clear(&self) {
        self.slot.lock().take();
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_equal_inputs_reuse_value() {
        let memo = Memo::new();
        let calls = Cell::new(0);

        let first = memo.get_or_compute((1, 10), || {
            calls.set(calls.get() + 1);
            "page one"
        });
        let second = memo.get_or_compute((1, 10), || {
            calls.set(calls.get() + 1);
            "recomputed"
        });

        assert_eq!(first, "page one");
        assert_eq!(second, "page one");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_changed_inputs_recompute() {
        let memo = Memo::new();
        memo.get_or_compute(1, || "one");
        let value = memo.get_or_compute(2, || "two");
        assert_eq!(value, "two");
        assert_eq!(memo.get_or_compute(2, || "again"), "two");
    }

    #[test]
    fn test_clear() {
        let memo: Memo<u8, u8> = Memo::new();
        memo.get_or_compute(1, || 1);
        memo.clear();
        assert!(memo.is_empty());
    }
}
