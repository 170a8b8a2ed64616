//! Content store capability for Hackdex.
//!
//! Every record and every revision of the master index is stored as an
//! immutable blob identified by its [`ContentHash`](hdx_types::ContentHash).
//! This crate defines the [`ContentStore`] trait the rest of the system
//! consumes and ships two backends for it.
//!
//! # Storage Backends
//!
//! - [`InMemoryContentStore`] -- `HashMap`-based store for tests, demos and
//!   embedding, with switches to simulate an unreachable backend
//! - [`KuboContentStore`] -- HTTP client for a Kubo-compatible RPC endpoint
//!
//! # Design Rules
//!
//! 1. Content is immutable once written; the same bytes always produce the
//!    same hash.
//! 2. The store never interprets content -- it is a pure hash-to-bytes map.
//! 3. All I/O errors are propagated, never silently ignored. Callers decide
//!    whether an error is transient via [`StoreError::is_transient`].

pub mod error;
pub mod faults;
pub mod kubo;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use faults::Faults;
pub use kubo::{KuboClient, KuboContentStore, KuboError};
pub use memory::InMemoryContentStore;
pub use traits::ContentStore;
