//! # harvest-core
//!
//! Core types for tabharvest, a tool that pulls every row out of a
//! lazily-rendered, infinite-scroll table behind a login.
//!
//! ## Pieces
//!
//! - [`Row`] / [`RowIdentity`]: one extracted record and its dedup key
//! - [`Collection`]: the order-preserving, duplicate-free result set
//! - [`HarvestConfig`]: every URL, path, selector and delay used by a run
//! - [`CredentialProvider`]: where login credentials come from
//! - [`StorageState`]: persisted cookies and local storage for session reuse
//! - [`export`]: JSON serialization of the final collection

mod collection;
pub mod config;
pub mod credentials;
mod error;
pub mod export;
pub mod session_state;
mod types;

pub use collection::Collection;
pub use config::HarvestConfig;
pub use credentials::{
    ChainedCredentials, CredentialProvider, Credentials, EnvCredentials, FileCredentials,
    StaticCredentials,
};
pub use error::{HarvestError, Result};
pub use session_state::{OriginStorage, StorageEntry, StorageState, StoredCookie};
pub use types::*;
