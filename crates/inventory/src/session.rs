//! Edit session: staged deletions and field edits over a fixed baseline.
//!
//! The session is purely in-memory. Nothing reaches storage until
//! [`EditSession::commit`] replays the staged operations against a
//! [`CommitTarget`] (normally the item repository).
//!
//! State machine:
//! - **Closed** (initial): no baseline, nothing staged.
//! - **Open**: `baseline` captured at start, `display` derived from it, plus
//!   `pending_deletes` and `pending_updates`.
//!
//! Invariants while open:
//! - `display` is `baseline` without the ids in `pending_deletes`, with each
//!   staged patch overlaid. Items brought back by
//!   [`unmark_for_deletion`](EditSession::unmark_for_deletion) are appended at
//!   the end, so display order may differ from baseline order.
//! - No id is both in `display` and in `pending_deletes`.
//! - No id is both in `pending_updates` and in `pending_deletes`.
//!
//! Commit is not atomic: deletions are applied first, then each update in
//! numeric id order (non-numeric ids last, by text). A failure leaves the applied part in place and the session open with
//! everything still staged, so the caller can retry.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use larder_core::entity::{find_by_id, position_of};
use larder_core::{ItemId, SessionId, StoreError, StoreResult};

use crate::item::{InventoryItem, ItemPatch};

/// Write side a session commits into.
#[async_trait]
pub trait CommitTarget: Send + Sync {
    /// Remove every listed item in one write; unknown ids are ignored.
    /// Returns how many items were removed.
    async fn batch_delete(&self, ids: &[ItemId]) -> StoreResult<usize>;

    /// Merge `patch` into the item; `None` when no item has that id.
    async fn update(&self, id: &ItemId, patch: &ItemPatch) -> StoreResult<Option<InventoryItem>>;
}

#[async_trait]
impl<T> CommitTarget for Arc<T>
where
    T: CommitTarget + ?Sized,
{
    async fn batch_delete(&self, ids: &[ItemId]) -> StoreResult<usize> {
        (**self).batch_delete(ids).await
    }

    async fn update(&self, id: &ItemId, patch: &ItemPatch) -> StoreResult<Option<InventoryItem>> {
        (**self).update(id, patch).await
    }
}

/// Optional per-item notifications. Every method defaults to a no-op.
pub trait EditObserver: Send + Sync {
    fn on_marked(&self, _item: &InventoryItem) {}
    fn on_unmarked(&self, _item: &InventoryItem) {}
    fn on_updated(&self, _item: &InventoryItem) {}
    fn on_cancelled(&self, _session_id: SessionId) {}
    fn on_committed(&self, _summary: &CommitSummary) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EditObserver for NoopObserver {}

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub session_id: SessionId,
    /// Ids staged for deletion (the store may have had fewer of them).
    pub deleted: Vec<ItemId>,
    /// Ids whose staged patch was replayed.
    pub updated: Vec<ItemId>,
}

/// Where a commit stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStage {
    Deleting,
    Updating(ItemId),
}

impl core::fmt::Display for CommitStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CommitStage::Deleting => f.write_str("applying staged deletions"),
            CommitStage::Updating(id) => write!(f, "updating item {id}"),
        }
    }
}

/// Mutations already written to the store when a commit failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedMutations {
    pub deletes_applied: bool,
    pub updated: Vec<ItemId>,
}

impl AppliedMutations {
    pub fn is_empty(&self) -> bool {
        !self.deletes_applied && self.updated.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("no edit session is open")]
    NotEditing,

    /// The store failed part-way. Nothing applied is rolled back.
    #[error("commit failed while {stage}: {source}")]
    Failed {
        stage: CommitStage,
        applied: AppliedMutations,
        #[source]
        source: StoreError,
    },
}

pub struct EditSession {
    session_id: Option<SessionId>,
    baseline: Vec<InventoryItem>,
    display: Vec<InventoryItem>,
    pending_deletes: BTreeSet<ItemId>,
    pending_updates: BTreeMap<ItemId, ItemPatch>,
    observer: Arc<dyn EditObserver>,
}

impl core::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EditSession")
            .field("session_id", &self.session_id)
            .field("baseline", &self.baseline.len())
            .field("display", &self.display.len())
            .field("pending_deletes", &self.pending_deletes)
            .field("pending_updates", &self.pending_updates)
            .finish()
    }
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSession {
    /// A closed session with no observer.
    pub fn new() -> Self {
        Self::with_observer(Arc::new(NoopObserver))
    }

    pub fn with_observer(observer: Arc<dyn EditObserver>) -> Self {
        Self {
            session_id: None,
            baseline: Vec::new(),
            display: Vec::new(),
            pending_deletes: BTreeSet::new(),
            pending_updates: BTreeMap::new(),
            observer,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session_id.is_some()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    /// Snapshot captured at start. Empty while closed.
    pub fn baseline(&self) -> &[InventoryItem] {
        &self.baseline
    }

    /// Staged view. Empty while closed.
    pub fn display(&self) -> &[InventoryItem] {
        &self.display
    }

    pub fn pending_deletes(&self) -> &BTreeSet<ItemId> {
        &self.pending_deletes
    }

    pub fn pending_updates(&self) -> &BTreeMap<ItemId, ItemPatch> {
        &self.pending_updates
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending_deletes.is_empty() || !self.pending_updates.is_empty()
    }

    /// Closed → Open over `visible`. Returns `false` (and changes nothing) if a
    /// session is already open.
    pub fn start(&mut self, visible: Vec<InventoryItem>) -> bool {
        if self.is_active() {
            return false;
        }

        let session_id = SessionId::new();
        tracing::debug!(session = %session_id, items = visible.len(), "edit session opened");

        self.session_id = Some(session_id);
        self.display = visible.clone();
        self.baseline = visible;
        self.pending_deletes.clear();
        self.pending_updates.clear();
        true
    }

    /// Open → Closed, discarding everything staged. Never touches storage.
    pub fn cancel(&mut self) {
        if let Some(session_id) = self.session_id {
            tracing::debug!(
                session = %session_id,
                discarded_deletes = self.pending_deletes.len(),
                discarded_updates = self.pending_updates.len(),
                "edit session cancelled"
            );
            self.reset();
            self.observer.on_cancelled(session_id);
        }
    }

    /// Open when closed, cancel when open. Returns the new active flag.
    pub fn toggle_edit_mode(&mut self, visible: &[InventoryItem]) -> bool {
        if self.is_active() {
            self.cancel();
        } else {
            self.start(visible.to_vec());
        }
        self.is_active()
    }

    /// Stage a deletion and hide the item. Any staged update for it is
    /// dropped. No-op when closed, already staged, or not displayed.
    pub fn mark_for_deletion(&mut self, id: &ItemId) -> bool {
        if !self.is_active() || self.pending_deletes.contains(id) {
            return false;
        }
        let Some(pos) = position_of(&self.display, id) else {
            return false;
        };

        let item = self.display.remove(pos);
        self.pending_deletes.insert(id.clone());
        self.pending_updates.remove(id);

        tracing::debug!(item = %id, "staged deletion");
        self.observer.on_marked(&item);
        true
    }

    /// Un-stage a deletion and put the baseline item back at the end of the
    /// display list. No-op when closed, not staged, or not in the baseline.
    pub fn unmark_for_deletion(&mut self, id: &ItemId) -> bool {
        if !self.is_active() || !self.pending_deletes.contains(id) {
            return false;
        }
        let Some(item) = find_by_id(&self.baseline, id).cloned() else {
            return false;
        };

        self.pending_deletes.remove(id);
        tracing::debug!(item = %id, "unstaged deletion");
        self.observer.on_unmarked(&item);
        self.display.push(item);
        true
    }

    /// Stage field changes for a displayed item, merging with anything staged
    /// earlier for the same id. No-op when closed or not displayed.
    pub fn update_locally(&mut self, id: &ItemId, patch: ItemPatch) -> bool {
        if !self.is_active() {
            return false;
        }
        let Some(pos) = position_of(&self.display, id) else {
            return false;
        };

        let item = &mut self.display[pos];
        patch.apply_to(item);
        self.pending_updates
            .entry(id.clone())
            .or_default()
            .merge(patch);

        tracing::debug!(item = %id, "staged update");
        self.observer.on_updated(item);
        true
    }

    /// Replay staged deletions, then staged updates, against `target`.
    ///
    /// On success the session closes; callers re-read the repository for a
    /// fresh list. On failure the session stays open and keeps its staged
    /// state; mutations already written stay written.
    pub async fn commit<T>(&mut self, target: &T) -> Result<CommitSummary, CommitError>
    where
        T: CommitTarget + ?Sized,
    {
        let Some(session_id) = self.session_id else {
            return Err(CommitError::NotEditing);
        };

        let deleted: Vec<ItemId> = self.pending_deletes.iter().cloned().collect();
        let mut applied = AppliedMutations::default();

        if !deleted.is_empty() {
            if let Err(source) = target.batch_delete(&deleted).await {
                tracing::error!(session = %session_id, error = %source, "commit failed while deleting");
                return Err(CommitError::Failed {
                    stage: CommitStage::Deleting,
                    applied,
                    source,
                });
            }
            applied.deletes_applied = true;
        }

        let mut updates: Vec<(&ItemId, &ItemPatch)> = self.pending_updates.iter().collect();
        updates.sort_by(|(a, _), (b, _)| replay_order(a, b));

        for (id, patch) in updates {
            match target.update(id, patch).await {
                Ok(None) => {
                    tracing::debug!(session = %session_id, item = %id, "staged update matched no stored item");
                    applied.updated.push(id.clone());
                }
                Ok(Some(_)) => applied.updated.push(id.clone()),
                Err(source) => {
                    tracing::error!(
                        session = %session_id,
                        item = %id,
                        error = %source,
                        "commit failed while updating"
                    );
                    return Err(CommitError::Failed {
                        stage: CommitStage::Updating(id.clone()),
                        applied,
                        source,
                    });
                }
            }
        }

        let summary = CommitSummary {
            session_id,
            deleted,
            updated: applied.updated,
        };

        tracing::info!(
            session = %session_id,
            deleted = summary.deleted.len(),
            updated = summary.updated.len(),
            "edit session committed"
        );

        self.reset();
        self.observer.on_committed(&summary);
        Ok(summary)
    }

    fn reset(&mut self) {
        self.session_id = None;
        self.baseline.clear();
        self.display.clear();
        self.pending_deletes.clear();
        self.pending_updates.clear();
    }
}

/// Numeric ids by value, then everything else by text.
fn replay_order(a: &ItemId, b: &ItemId) -> Ordering {
    match (a.as_sequence(), b.as_sequence()) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
