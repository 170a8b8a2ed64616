//! Mutable naming pointers for Hackdex.
//!
//! Content in the store is immutable, so every record (and the master index)
//! gets a naming key that can be repointed at the hash of its latest
//! content. This crate defines the naming capability and the thin manager
//! the rest of the system uses to mint, find, publish and resolve keys.
//!
//! # Modules
//!
//! - [`error`] -- Error types for naming operations
//! - [`traits`] -- The [`NamingService`] capability
//! - [`names`] -- Key name validation
//! - [`memory`] -- In-memory [`InMemoryNamingService`] for tests and demos
//! - [`kubo`] -- [`KuboNamingService`] over a Kubo RPC endpoint
//! - [`manager`] -- [`KeyManager`], the key lifecycle manager

pub mod error;
pub mod kubo;
pub mod manager;
pub mod memory;
pub mod names;
pub mod traits;

pub use error::{NameError, NameResult};
pub use kubo::KuboNamingService;
pub use manager::KeyManager;
pub use memory::InMemoryNamingService;
pub use names::validate_key_name;
pub use traits::NamingService;
