use std::sync::Arc;

use async_trait::async_trait;

use larder_core::StoreResult;

/// Key → string persistence primitive.
///
/// ## Semantics
///
/// - `get` returns `None` for a key that was never written.
/// - `set` replaces the whole value for the key.
/// - Each call is atomic on its own; there are no transactions, version
///   tokens or locks spanning several calls. A read-modify-write built on top
///   of this is last-writer-wins.
///
/// Failures of the underlying device storage surface as
/// `StoreError::Unavailable`. Implementations never retry.
#[async_trait]
pub trait ByteStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> StoreResult<()>;
}

#[async_trait]
impl<S> ByteStore for Arc<S>
where
    S: ByteStore + ?Sized,
{
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        (**self).set(key, value).await
    }
}

#[async_trait]
impl<'a, S> ByteStore for &'a S
where
    S: ByteStore + ?Sized,
{
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        (**self).set(key, value).await
    }
}
