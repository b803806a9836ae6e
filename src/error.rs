//! Error types for fallible insertion.

/// Returned by [`CuckooMap::try_insert`](crate::CuckooMap::try_insert) when
/// the key is already present. The map is left unchanged.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum InsertError {
    #[error("key is already present in the table")]
    DuplicateKey,
}
