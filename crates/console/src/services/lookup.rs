//! Concurrent display-name lookups.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::hash::Hash;

use futures::future::join_all;
use tracing::warn;

use crate::backend::BackendError;

/// Fetch a display name for every distinct key, all at once.
///
/// Keys whose lookup fails are left out of the map; the caller shows a
/// placeholder for them.
pub async fn resolve_names<K, I, F, Fut>(keys: I, fetch: F) -> HashMap<K, String>
where
    K: Clone + Ord + Hash + std::fmt::Display,
    I: IntoIterator<Item = K>,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<String, BackendError>>,
{
    let distinct: BTreeSet<K> = keys.into_iter().collect();

    let lookups = distinct.into_iter().map(|key| {
        let pending = fetch(key.clone());
        async move { (key, pending.await) }
    });

    join_all(lookups)
        .await
        .into_iter()
        .filter_map(|(key, result)| match result {
            Ok(name) => Some((key, name)),
            Err(err) => {
                warn!(%key, error = %err, "name lookup failed");
                None
            }
        })
        .collect()
}
