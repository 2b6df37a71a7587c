//! Within-bucket key ordering policy and the key-presence helper contract.

use core::cmp::Ordering;
use core::fmt;

/// How keys that share a bucket are totally ordered. Fixed at construction
/// for the whole lifetime of the map.
pub(crate) enum OrderPolicy<K> {
    /// The fallback chain: mixed hash, then `Eq`, then (when installed) a
    /// natural order, then the creation-serial tie-break.
    Fallback { natural: Option<fn(&K, &K) -> Ordering> },
    /// Caller-supplied total order; replaces the whole fallback chain.
    /// `Ordering::Equal` means "same logical key".
    Custom(Box<dyn Fn(&K, &K) -> Ordering>),
}

impl<K> OrderPolicy<K> {
    pub fn fallback() -> Self {
        OrderPolicy::Fallback { natural: None }
    }

    pub fn natural() -> Self
    where
        K: Ord,
    {
        let cmp: fn(&K, &K) -> Ordering = K::cmp;
        OrderPolicy::Fallback { natural: Some(cmp) }
    }

    pub fn custom<F>(cmp: F) -> Self
    where
        F: Fn(&K, &K) -> Ordering + 'static,
    {
        OrderPolicy::Custom(Box::new(cmp))
    }
}

/// Error returned by [`require_key`] when a required key is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NilKeyError;

impl fmt::Display for NilKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("key must be present")
    }
}

impl std::error::Error for NilKeyError {}

/// Reject an absent key with a distinguished error.
///
/// The maps themselves accept `Option<K>` keys like any other key type; this
/// helper is for call sites whose own contract requires the key to be
/// present.
pub fn require_key<K>(key: Option<K>) -> Result<K, NilKeyError> {
    key.ok_or(NilKeyError)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: a present key passes through untouched; an absent key is
    /// rejected with the distinguished error.
    #[test]
    fn require_key_accepts_present_rejects_absent() {
        assert_eq!(require_key(Some("k")), Ok("k"));
        assert_eq!(require_key::<&str>(None), Err(NilKeyError));
    }

    /// Invariant: the error renders a stable human-readable message and is a
    /// `std::error::Error`.
    #[test]
    fn nil_key_error_displays() {
        let e: Box<dyn std::error::Error> = Box::new(NilKeyError);
        assert_eq!(e.to_string(), "key must be present");
    }
}
