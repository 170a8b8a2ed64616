//! Foundation types for Hackdex.
//!
//! This crate provides the identifiers shared by every Hackdex crate: the
//! immutable id of a record, the hash of a piece of stored content, and the
//! mutable naming key under which content is published.
//!
//! # Key Types
//!
//! - [`RecordId`] -- UUID v7 identifier assigned to a record at creation
//! - [`ContentHash`] -- identifier of an immutable blob in the content store
//! - [`NamingKey`] -- `{name, id}` pair for a mutable naming pointer

pub mod error;
pub mod hash;
pub mod key;
pub mod record_id;

pub use error::TypeError;
pub use hash::ContentHash;
pub use key::NamingKey;
pub use record_id::RecordId;
