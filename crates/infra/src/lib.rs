//! Infrastructure layer: durable byte stores and the item repository.

pub mod byte_store;
pub mod repository;

#[cfg(test)]
mod testing;

pub use byte_store::{ByteStore, InMemoryByteStore, SqliteByteStore};
pub use repository::{ItemRepository, DEFAULT_STORAGE_KEY};
