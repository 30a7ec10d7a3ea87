//! `larder-client`
//!
//! **Responsibility:** the thin shell UI code talks to.
//!
//! This crate provides:
//! - Configuration from the environment
//! - Shared application state (repository, expiry policy, edit session)
//! - Async command functions mirroring what screens need
//!
//! All inventory rules live in `larder-inventory` and `larder-infra`.

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use state::AppState;
