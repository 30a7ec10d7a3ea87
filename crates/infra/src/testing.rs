//! Test doubles shared by the unit and integration tests of this crate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use larder_core::{StoreError, StoreResult};

use crate::byte_store::{ByteStore, InMemoryByteStore};

/// In-memory store that counts writes and can be told to fail.
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    inner: InMemoryByteStore,
    sets: AtomicUsize,
    /// Writes with index >= this value fail (0-based). `usize::MAX` = never.
    fail_sets_from: AtomicUsize,
    fail_gets: AtomicBool,
}

impl FlakyStore {
    pub(crate) fn new() -> Self {
        Self {
            fail_sets_from: AtomicUsize::new(usize::MAX),
            ..Self::default()
        }
    }

    /// Let `n` more writes succeed, then fail every later one.
    pub(crate) fn fail_after_sets(&self, n: usize) {
        let done = self.sets.load(Ordering::SeqCst);
        self.fail_sets_from.store(done + n, Ordering::SeqCst);
    }

    pub(crate) fn heal(&self) {
        self.fail_sets_from.store(usize::MAX, Ordering::SeqCst);
        self.fail_gets.store(false, Ordering::SeqCst);
    }

    pub(crate) fn fail_gets(&self) {
        self.fail_gets.store(true, Ordering::SeqCst);
    }

    /// Number of write attempts so far (failed ones included).
    pub(crate) fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub(crate) async fn raw(&self, key: &str) -> Option<String> {
        self.inner.get(key).await.ok().flatten()
    }
}

#[async_trait]
impl ByteStore for FlakyStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("device storage read error"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        let index = self.sets.fetch_add(1, Ordering::SeqCst);
        if index >= self.fail_sets_from.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("device storage write error"));
        }
        self.inner.set(key, value).await
    }
}
