//! `larder-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no storage, no IO): typed
//! identifiers, the `Entity` trait, and the error types shared by every layer.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, StoreError, StoreResult};
pub use id::{FridgeId, ItemId, SessionId};
