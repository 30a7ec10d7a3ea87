//! Inventory item record, insert draft and sparse patch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use larder_core::{Entity, FridgeId, ItemId};

/// One physical item tracked in a fridge.
///
/// This is also the persisted shape: the repository stores the whole
/// collection as a JSON array of these records (camelCase keys).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    /// Numeric-looking, but kept as entered.
    pub quantity: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub expiry_date: String,
    pub storage_type: String,
    pub item_category: String,
    pub fridge_id: FridgeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Materialize a draft with repository-assigned identity and timestamps.
    pub fn from_draft(id: ItemId, fridge_id: FridgeId, draft: ItemDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            quantity: draft.quantity,
            expiry_date: draft.expiry_date,
            storage_type: draft.storage_type,
            item_category: draft.item_category,
            fridge_id,
            unit: draft.unit,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// An item as supplied by a caller, before the repository assigns an id and
/// timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub name: String,
    pub quantity: String,
    /// Empty when the caller left it to the expiry policy.
    #[serde(default)]
    pub expiry_date: String,
    pub storage_type: String,
    pub item_category: String,
    /// Always replaced by the fridge passed to `add_batch`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fridge_id: Option<FridgeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Sparse set of changed fields for one item.
///
/// Identity and timestamps are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fridge_id: Option<FridgeId>,
    /// `Some(None)` clears the unit (`"unit": null` on the wire).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub unit: Option<Option<String>>,
}

/// Maps a present key to `Some`, keeping `null` distinct from a missing key.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl ItemPatch {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_quantity(mut self, quantity: impl Into<String>) -> Self {
        self.quantity = Some(quantity.into());
        self
    }

    pub fn with_expiry_date(mut self, expiry_date: impl Into<String>) -> Self {
        self.expiry_date = Some(expiry_date.into());
        self
    }

    pub fn with_storage_type(mut self, storage_type: impl Into<String>) -> Self {
        self.storage_type = Some(storage_type.into());
        self
    }

    pub fn with_item_category(mut self, item_category: impl Into<String>) -> Self {
        self.item_category = Some(item_category.into());
        self
    }

    pub fn with_fridge_id(mut self, fridge_id: FridgeId) -> Self {
        self.fridge_id = Some(fridge_id);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(Some(unit.into()));
        self
    }

    pub fn without_unit(mut self) -> Self {
        self.unit = Some(None);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay a later patch: fields it sets win, fields it leaves unset keep
    /// their earlier staged value.
    pub fn merge(&mut self, later: ItemPatch) {
        fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        overlay(&mut self.name, later.name);
        overlay(&mut self.quantity, later.quantity);
        overlay(&mut self.expiry_date, later.expiry_date);
        overlay(&mut self.storage_type, later.storage_type);
        overlay(&mut self.item_category, later.item_category);
        overlay(&mut self.fridge_id, later.fridge_id);
        overlay(&mut self.unit, later.unit);
    }

    /// Write every set field onto `item`. Timestamps are left to the caller.
    pub fn apply_to(&self, item: &mut InventoryItem) {
        if let Some(v) = &self.name {
            item.name = v.clone();
        }
        if let Some(v) = &self.quantity {
            item.quantity = v.clone();
        }
        if let Some(v) = &self.expiry_date {
            item.expiry_date = v.clone();
        }
        if let Some(v) = &self.storage_type {
            item.storage_type = v.clone();
        }
        if let Some(v) = &self.item_category {
            item.item_category = v.clone();
        }
        if let Some(v) = &self.fridge_id {
            item.fridge_id = v.clone();
        }
        if let Some(v) = &self.unit {
            item.unit = v.clone();
        }
    }
}
