//! Deduplication oracle.
//!
//! Identity is the exact URL string. No canonicalization happens here:
//! `https://a.test/x` and `https://a.test/x/` are different items.

use super::{RecordStore, StoreError};

/// True iff the store already holds a record for `url`.
///
/// A failed lookup is an error, never "not a duplicate"; the caller must skip
/// the item rather than risk posting it twice.
pub async fn is_duplicate(store: &dyn RecordStore, url: &str) -> Result<bool, StoreError> {
    Ok(store.find_by_url(url).await? > 0)
}
