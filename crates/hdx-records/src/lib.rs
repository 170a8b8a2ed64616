//! Entity records for Hackdex.
//!
//! Every record is an immutable JSON document in the content store, reached
//! through its own naming key and listed in the shared master index. This
//! crate turns that arrangement into ordinary create/read/update/delete,
//! listing and search, generic over the record type.
//!
//! # Key Types
//!
//! - [`Record`] -- what a record type must declare (kind, listing summary,
//!   searchable and filterable fields, fixtures)
//! - [`StoredRecord`] / [`Entity`] -- the uploaded document, and that
//!   document together with where it lives
//! - [`EntityRecordStore`] -- the CRUD/list/search operations
//! - [`Hackathon`], [`Project`], [`UserProfile`] -- the built-in record types

pub mod error;
pub mod kinds;
pub mod matcher;
pub mod patch;
pub mod record;
pub mod store;

pub use error::{RecordError, RecordResult};
pub use kinds::{Hackathon, HackathonStatus, Project, ProjectStatus, UserProfile, UserRole};
pub use matcher::{matches, FieldValue, Filters};
pub use record::{Entity, Record, StoredRecord};
pub use store::{EntityRecordStore, ListReport, SkippedEntry};
