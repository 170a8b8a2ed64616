//! Master index for Hackdex.
//!
//! The master index is the single document that lists every known record:
//! its id, kind, a few listing fields, and where its latest content lives.
//! It is stored like any other content (upload, then repoint a well-known
//! naming key), so every change is a whole-document rewrite.
//!
//! # Key Types
//!
//! - [`MasterIndex`] -- the document: ordered entries plus metadata
//! - [`MasterIndexEntry`] -- the listing summary of one record
//! - [`MasterIndexManager`] -- bootstrap, fetch and replace of the document
//! - [`IndexWriter`] -- exclusive read-modify-write session on the document
//!
//! # Concurrency
//!
//! Every mutation goes through [`MasterIndexManager::writer`], which holds a
//! single-writer lock from read to replace. [`MasterIndexManager::replace_index`]
//! additionally checks the document version it was given against the
//! published one and rejects stale writers with [`IndexError::StaleIndex`].

pub mod entry;
pub mod error;
pub mod index;
pub mod manager;

pub use entry::MasterIndexEntry;
pub use error::{IndexError, IndexResult};
pub use index::{IndexMetadata, MasterIndex};
pub use manager::{
    IndexOptions, IndexRevision, IndexWriter, InitOutcome, MasterDiscovery, MasterIndexManager,
    DEFAULT_MASTER_KEY_NAME,
};
