//! Built-in record types.

mod hackathon;
mod profile;
mod project;

pub use hackathon::{Hackathon, HackathonStatus};
pub use profile::{UserProfile, UserRole};
pub use project::{Project, ProjectStatus};
