//! Item repository over a byte store.
//!
//! The whole collection lives under one key as a JSON array. Every operation
//! reads it fresh (no cache between calls), and every write is a full
//! read → mutate copy → write cycle. There is no version check, so two
//! writers interleaving their cycles lose one side's changes (last writer
//! wins); callers are expected to serialize their own writes.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;

use larder_core::{FridgeId, ItemId, StoreResult};
use larder_inventory::{next_ids, CommitTarget, InventoryItem, ItemDraft, ItemPatch};

use crate::byte_store::ByteStore;

/// Key the collection is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "inventory_items";

/// Sole writer of the persisted item collection.
#[derive(Debug, Clone)]
pub struct ItemRepository<S> {
    store: S,
    key: String,
}

impl<S> ItemRepository<S>
where
    S: ByteStore,
{
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the collection. A missing key or an unreadable payload both yield
    /// an empty collection; only a failing store is an error.
    async fn load(&self) -> StoreResult<Vec<InventoryItem>> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<InventoryItem>>(&raw) {
            Ok(items) => Ok(items),
            Err(err) => {
                tracing::warn!(
                    key = %self.key,
                    error = %err,
                    "stored item collection is malformed; treating it as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, items: &[InventoryItem]) -> StoreResult<()> {
        let payload = serde_json::to_string(items)?;
        self.store.set(&self.key, payload).await
    }

    /// Full collection, read fresh.
    pub async fn list(&self) -> StoreResult<Vec<InventoryItem>> {
        self.load().await
    }

    /// Items whose `fridge_id` matches exactly.
    pub async fn list_by_fridge(&self, fridge_id: &FridgeId) -> StoreResult<Vec<InventoryItem>> {
        let mut items = self.load().await?;
        items.retain(|item| &item.fridge_id == fridge_id);
        Ok(items)
    }

    pub async fn get(&self, id: &ItemId) -> StoreResult<Option<InventoryItem>> {
        Ok(self.load().await?.into_iter().find(|item| &item.id == id))
    }

    /// Insert drafts into `fridge_id`, returning the stored items in input
    /// order. Ids continue after the largest id in the whole collection and
    /// every item of the batch gets the same timestamp.
    pub async fn add_batch(
        &self,
        fridge_id: &FridgeId,
        drafts: Vec<ItemDraft>,
    ) -> StoreResult<Vec<InventoryItem>> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        let mut items = self.load().await?;
        let ids = next_ids(&items, drafts.len())?;
        let now = Utc::now();

        let created: Vec<InventoryItem> = ids
            .into_iter()
            .zip(drafts)
            .map(|(id, draft)| InventoryItem::from_draft(id, fridge_id.clone(), draft, now))
            .collect();

        items.extend(created.iter().cloned());
        self.save(&items).await?;

        tracing::info!(
            fridge = %fridge_id,
            added = created.len(),
            total = items.len(),
            "items added"
        );
        Ok(created)
    }

    /// Remove one item. Returns whether it existed; an unknown id writes
    /// nothing.
    pub async fn delete(&self, id: &ItemId) -> StoreResult<bool> {
        let removed = self.batch_delete(std::slice::from_ref(id)).await?;
        Ok(removed > 0)
    }

    /// Merge `patch` into one item and refresh its `updated_at`. Returns the
    /// updated item; an unknown id writes nothing and returns `None`.
    pub async fn update(&self, id: &ItemId, patch: &ItemPatch) -> StoreResult<Option<InventoryItem>> {
        let mut items = self.load().await?;
        let Some(item) = items.iter_mut().find(|item| &item.id == id) else {
            tracing::debug!(item = %id, "update of unknown item ignored");
            return Ok(None);
        };

        patch.apply_to(item);
        item.updated_at = Utc::now();
        let updated = item.clone();

        self.save(&items).await?;
        tracing::debug!(item = %id, "item updated");
        Ok(Some(updated))
    }

    /// Remove every listed item in a single write. Unknown ids are ignored.
    /// Returns how many items were removed.
    pub async fn batch_delete(&self, ids: &[ItemId]) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut items = self.load().await?;
        let doomed: HashSet<&ItemId> = ids.iter().collect();
        let before = items.len();
        items.retain(|item| !doomed.contains(&item.id));
        let removed = before - items.len();

        if removed == 0 {
            return Ok(0);
        }

        self.save(&items).await?;
        tracing::info!(requested = ids.len(), removed, "items deleted");
        Ok(removed)
    }
}

#[async_trait]
impl<S> CommitTarget for ItemRepository<S>
where
    S: ByteStore,
{
    async fn batch_delete(&self, ids: &[ItemId]) -> StoreResult<usize> {
        ItemRepository::batch_delete(self, ids).await
    }

    async fn update(&self, id: &ItemId, patch: &ItemPatch) -> StoreResult<Option<InventoryItem>> {
        ItemRepository::update(self, id, patch).await
    }
}
