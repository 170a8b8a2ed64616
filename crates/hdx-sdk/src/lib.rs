//! High-level SDK for Hackdex.
//!
//! [`Hackdex`] is the entry point for applications: it owns the content and
//! naming clients, the master index manager and one [`ResilientStore`] per
//! record type. Every operation reports whether it was served by the
//! decentralized backend or by the in-process fallback.
//!
//! ```no_run
//! # async fn demo() -> hdx_sdk::SdkResult<()> {
//! use hdx_sdk::{Hackdex, Project, StorageConfig};
//!
//! let hackdex = Hackdex::from_config(&StorageConfig::from_env()?);
//! let created = hackdex
//!     .projects()
//!     .create(Project { title: "DeFi Yield Optimizer".into(), ..Default::default() })
//!     .await?;
//! println!("{} ({})", created.value, created.mode);
//! # Ok(())
//! # }
//! ```

mod attempt;
pub mod config;
pub mod error;
pub mod fallback;
pub mod hackdex;
pub mod resilient;
pub mod served;

pub use attempt::SettleReport;
pub use config::{ConfigError, FallbackTrigger, PrimaryEndpoint, StorageConfig};
pub use error::{SdkError, SdkResult};
pub use fallback::{FallbackStore, SessionWrite};
pub use hackdex::Hackdex;
pub use resilient::ResilientStore;
pub use served::{FallbackReason, ServeMode, Served};

// Re-export key types
pub use hdx_index::{InitOutcome, MasterDiscovery};
pub use hdx_records::{
    Entity, Filters, Hackathon, HackathonStatus, ListReport, Project, ProjectStatus, Record,
    UserProfile, UserRole,
};
pub use hdx_types::{NamingKey, RecordId};
