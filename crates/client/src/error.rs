//! Errors surfaced to the UI layer.

use thiserror::Error;

use larder_core::StoreError;
use larder_inventory::CommitError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Commit(#[from] CommitError),
}

pub type ClientResult<T> = Result<T, ClientError>;
