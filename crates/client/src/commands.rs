//! Commands for frontend integration.
//!
//! Repository-level commands write through immediately. Edit-mode commands
//! only touch the in-memory session until `commit_edits`.

use chrono::{NaiveDate, Utc};

use larder_core::{FridgeId, ItemId};
use larder_inventory::{CommitSummary, InventoryItem, ItemDraft, ItemPatch};

use crate::error::ClientResult;
use crate::state::AppState;

/// Today's date for expiry defaults (UTC).
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Items to show for a fridge: the staged view while that fridge is being
/// edited, the stored collection otherwise.
pub async fn list_fridge_items(state: &AppState, fridge_id: &FridgeId) -> ClientResult<Vec<InventoryItem>> {
    {
        let edit = state.edit.lock().await;
        if edit.is_editing(fridge_id) {
            return Ok(edit.session.display().to_vec());
        }
    }
    Ok(state.repository.list_by_fridge(fridge_id).await?)
}

/// Insert drafts, giving the ones without an expiry date their category
/// default as of `today`.
pub async fn add_items(
    state: &AppState,
    fridge_id: &FridgeId,
    mut drafts: Vec<ItemDraft>,
    today: NaiveDate,
) -> ClientResult<Vec<InventoryItem>> {
    for draft in &mut drafts {
        state.expiry.fill_default_expiry(draft, today);
    }
    Ok(state.repository.add_batch(fridge_id, drafts).await?)
}

/// Delete one item immediately (outside any edit session).
pub async fn delete_item(state: &AppState, id: &ItemId) -> ClientResult<bool> {
    Ok(state.repository.delete(id).await?)
}

/// Update one item immediately (outside any edit session).
pub async fn update_item(state: &AppState, id: &ItemId, patch: ItemPatch) -> ClientResult<Option<InventoryItem>> {
    Ok(state.repository.update(id, &patch).await?)
}

/// Enter edit mode over the fridge's stored items, or leave it discarding
/// everything staged. Returns whether edit mode is now on.
///
/// Only one fridge is edited at a time: toggling while any session is open
/// closes it, whichever fridge is passed.
pub async fn toggle_edit_mode(state: &AppState, fridge_id: &FridgeId) -> ClientResult<bool> {
    let mut edit = state.edit.lock().await;
    if edit.session.is_active() {
        edit.session.cancel();
        edit.fridge = None;
        return Ok(false);
    }

    let visible = state.repository.list_by_fridge(fridge_id).await?;
    edit.session.start(visible);
    edit.fridge = Some(fridge_id.clone());
    Ok(true)
}

pub async fn mark_for_deletion(state: &AppState, id: &ItemId) -> bool {
    state.edit.lock().await.session.mark_for_deletion(id)
}

pub async fn unmark_for_deletion(state: &AppState, id: &ItemId) -> bool {
    state.edit.lock().await.session.unmark_for_deletion(id)
}

pub async fn update_locally(state: &AppState, id: &ItemId, patch: ItemPatch) -> bool {
    state.edit.lock().await.session.update_locally(id, patch)
}

pub async fn has_pending_changes(state: &AppState) -> bool {
    state.edit.lock().await.session.has_pending_changes()
}

/// Commit staged edits, then re-read the fridge the session was opened over.
///
/// On failure the session stays in edit mode with its staged changes, so the
/// same call can be retried.
pub async fn commit_edits(state: &AppState) -> ClientResult<(CommitSummary, Vec<InventoryItem>)> {
    let (summary, fridge_id) = {
        let mut edit = state.edit.lock().await;
        let summary = edit.session.commit(&state.repository).await?;
        (summary, edit.fridge.take())
    };

    let items = match fridge_id {
        Some(fridge_id) => state.repository.list_by_fridge(&fridge_id).await?,
        None => Vec::new(),
    };
    Ok((summary, items))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use larder_infra::{ByteStore, InMemoryByteStore, DEFAULT_STORAGE_KEY};
    use larder_inventory::{CommitError, EditObserver, ExpiryPolicy};

    use super::*;
    use crate::error::ClientError;

    fn state() -> AppState {
        let store: Arc<dyn ByteStore> = Arc::new(InMemoryByteStore::new());
        AppState::new(store, DEFAULT_STORAGE_KEY, ExpiryPolicy::default().with_offset("Bakery", 3))
    }

    fn draft(name: &str, category: &str) -> ItemDraft {
        ItemDraft {
            name: name.to_string(),
            quantity: "1".to_string(),
            expiry_date: String::new(),
            storage_type: "Room".to_string(),
            item_category: category.to_string(),
            fridge_id: None,
            unit: None,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn names(items: &[InventoryItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[tokio::test]
    async fn add_items_fills_missing_expiry_dates() {
        let state = state();
        let fridge = FridgeId::new("F1");

        let added = add_items(
            &state,
            &fridge,
            vec![draft("Bread", "Bakery"), draft("Jam", "Spreads")],
            day(2025, 7, 12),
        )
        .await
        .unwrap();

        assert_eq!(added[0].expiry_date, "2025-07-15");
        assert_eq!(added[1].expiry_date, "2025-07-19");
        assert_eq!(list_fridge_items(&state, &fridge).await.unwrap(), added);
    }

    #[tokio::test]
    async fn edit_mode_shows_staged_view_until_commit() {
        let state = state();
        let fridge = FridgeId::new("F1");
        add_items(
            &state,
            &fridge,
            vec![draft("Bread", "Bakery"), draft("Jam", "Spreads"), draft("Tea", "Drinks")],
            today(),
        )
        .await
        .unwrap();

        assert!(toggle_edit_mode(&state, &fridge).await.unwrap());
        assert!(mark_for_deletion(&state, &ItemId::new("2")).await);
        assert!(update_locally(&state, &ItemId::new("1"), ItemPatch::default().with_quantity("5")).await);
        assert!(has_pending_changes(&state).await);

        let staged = list_fridge_items(&state, &fridge).await.unwrap();
        assert_eq!(names(&staged), vec!["Bread", "Tea"]);
        assert_eq!(state.repository().list().await.unwrap().len(), 3);

        let (summary, items) = commit_edits(&state).await.unwrap();
        assert_eq!(summary.deleted, vec![ItemId::new("2")]);
        assert_eq!(names(&items), vec!["Bread", "Tea"]);
        assert_eq!(items[0].quantity, "5");
        assert!(!has_pending_changes(&state).await);
    }

    #[tokio::test]
    async fn toggling_off_discards_staged_changes() {
        let state = state();
        let fridge = FridgeId::new("F1");
        add_items(&state, &fridge, vec![draft("Bread", "Bakery")], today()).await.unwrap();

        toggle_edit_mode(&state, &fridge).await.unwrap();
        mark_for_deletion(&state, &ItemId::new("1")).await;
        assert!(!toggle_edit_mode(&state, &fridge).await.unwrap());

        assert!(!has_pending_changes(&state).await);
        assert_eq!(list_fridge_items(&state, &fridge).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn other_fridges_list_from_the_store_while_one_is_edited() {
        let state = state();
        let f1 = FridgeId::new("F1");
        let f2 = FridgeId::new("F2");
        add_items(&state, &f1, vec![draft("Milk", "Dairy")], today()).await.unwrap();
        add_items(&state, &f2, vec![draft("Ice", "Frozen")], today()).await.unwrap();

        toggle_edit_mode(&state, &f1).await.unwrap();
        mark_for_deletion(&state, &ItemId::new("1")).await;
        assert_eq!(state.editing_fridge().await, Some(f1.clone()));

        let other = list_fridge_items(&state, &f2).await.unwrap();
        assert_eq!(names(&other), vec!["Ice"]);
        assert!(other.iter().all(|item| item.fridge_id == f2));
        assert!(list_fridge_items(&state, &f1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_reloads_the_fridge_being_edited() {
        let state = state();
        let f1 = FridgeId::new("F1");
        let f2 = FridgeId::new("F2");
        add_items(&state, &f1, vec![draft("Milk", "Dairy"), draft("Eggs", "Dairy")], today())
            .await
            .unwrap();
        add_items(&state, &f2, vec![draft("Ice", "Frozen")], today()).await.unwrap();

        toggle_edit_mode(&state, &f1).await.unwrap();
        mark_for_deletion(&state, &ItemId::new("1")).await;
        let (_, items) = commit_edits(&state).await.unwrap();

        assert_eq!(names(&items), vec!["Eggs"]);
        assert!(items.iter().all(|item| item.fridge_id == f1));
        assert_eq!(state.editing_fridge().await, None);
    }

    #[tokio::test]
    async fn commit_outside_edit_mode_is_rejected() {
        let state = state();
        let err = commit_edits(&state).await.unwrap_err();
        assert!(matches!(err, ClientError::Commit(CommitError::NotEditing)));
    }

    #[tokio::test]
    async fn direct_repository_commands_write_through() {
        let state = state();
        let fridge = FridgeId::new("F1");
        add_items(&state, &fridge, vec![draft("Bread", "Bakery"), draft("Jam", "Spreads")], today())
            .await
            .unwrap();

        let updated = update_item(&state, &ItemId::new("2"), ItemPatch::default().with_name("Honey"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Honey");
        assert!(delete_item(&state, &ItemId::new("1")).await.unwrap());
        assert!(!delete_item(&state, &ItemId::new("1")).await.unwrap());

        assert_eq!(names(&list_fridge_items(&state, &fridge).await.unwrap()), vec!["Honey"]);
    }

    #[derive(Default)]
    struct Marks(AtomicUsize);

    impl EditObserver for Marks {
        fn on_marked(&self, _item: &InventoryItem) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn injected_observer_is_notified() {
        let marks = Arc::new(Marks::default());
        let state = state().with_observer(marks.clone());
        let fridge = FridgeId::new("F1");
        add_items(&state, &fridge, vec![draft("Bread", "Bakery")], today()).await.unwrap();

        toggle_edit_mode(&state, &fridge).await.unwrap();
        mark_for_deletion(&state, &ItemId::new("1")).await;
        mark_for_deletion(&state, &ItemId::new("1")).await;

        assert_eq!(marks.0.load(Ordering::SeqCst), 1);
    }
}
