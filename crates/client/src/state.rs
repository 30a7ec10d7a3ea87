use std::sync::Arc;

use tokio::sync::Mutex;

use larder_core::FridgeId;
use larder_infra::{ByteStore, ItemRepository, SqliteByteStore};
use larder_inventory::{EditObserver, EditSession, ExpiryPolicy};

use crate::config::ClientConfig;

/// The edit session together with the fridge it was opened over.
pub(crate) struct EditState {
    pub(crate) fridge: Option<FridgeId>,
    pub(crate) session: EditSession,
}

impl EditState {
    fn new(session: EditSession) -> Self {
        Self { fridge: None, session }
    }

    /// Whether the open session (if any) was opened over `fridge_id`.
    pub(crate) fn is_editing(&self, fridge_id: &FridgeId) -> bool {
        self.session.is_active() && self.fridge.as_ref() == Some(fridge_id)
    }
}

/// Application state shared across commands.
pub struct AppState {
    pub(crate) repository: ItemRepository<Arc<dyn ByteStore>>,
    pub(crate) expiry: ExpiryPolicy,
    pub(crate) edit: Mutex<EditState>,
}

impl AppState {
    pub fn new(store: Arc<dyn ByteStore>, storage_key: &str, expiry: ExpiryPolicy) -> Self {
        Self {
            repository: ItemRepository::with_key(store, storage_key),
            expiry,
            edit: Mutex::new(EditState::new(EditSession::new())),
        }
    }

    /// Build state over the configured SQLite store.
    ///
    /// The database connection is opened lazily on first use.
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let expiry = config.load_expiry_policy()?;
        let store: Arc<dyn ByteStore> = Arc::new(SqliteByteStore::new(config.db_url.clone()));
        tracing::info!(db_url = %config.db_url, key = %config.storage_key, "client state initialized");
        Ok(Self::new(store, &config.storage_key, expiry))
    }

    /// Route edit-session notifications to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn EditObserver>) -> Self {
        self.edit = Mutex::new(EditState::new(EditSession::with_observer(observer)));
        self
    }

    pub fn repository(&self) -> &ItemRepository<Arc<dyn ByteStore>> {
        &self.repository
    }

    pub fn expiry(&self) -> &ExpiryPolicy {
        &self.expiry
    }

    /// Fridge the open edit session belongs to, if one is open.
    pub async fn editing_fridge(&self) -> Option<FridgeId> {
        let edit = self.edit.lock().await;
        if edit.session.is_active() {
            edit.fridge.clone()
        } else {
            None
        }
    }
}
