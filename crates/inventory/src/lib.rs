//! Inventory domain module.
//!
//! This crate contains the rules for fridge inventory items, implemented as
//! deterministic domain logic (no IO, no storage): the item model, id
//! allocation, default expiry dates, and the in-memory edit session that stages
//! deletions and edits before they are committed to a repository.

pub mod expiry;
pub mod id_alloc;
pub mod item;
pub mod session;

pub use expiry::{ExpiryPolicy, DEFAULT_FALLBACK_DAYS, OTHER_CATEGORY};
pub use id_alloc::next_ids;
pub use item::{InventoryItem, ItemDraft, ItemPatch};
pub use session::{
    AppliedMutations, CommitError, CommitStage, CommitSummary, CommitTarget, EditObserver,
    EditSession, NoopObserver,
};
