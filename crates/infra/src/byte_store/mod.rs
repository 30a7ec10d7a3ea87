//! Durable key → string store boundary.
//!
//! The repository consumes this as an opaque device-storage primitive: each
//! `get`/`set` is atomic on its own, and nothing more is promised.

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryByteStore;
pub use r#trait::ByteStore;
pub use sqlite::SqliteByteStore;
