use std::fmt;

use serde::{Deserialize, Serialize};

/// A mutable naming pointer.
///
/// `name` is the account-local label used when publishing; `id` is the
/// public identifier other parties resolve (`…/ipns/{id}`). One key exists
/// per record plus a single well-known key for the master index.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamingKey {
    pub name: String,
    pub id: String,
}

impl NamingKey {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// Gateway path form: `/ipns/<id>`.
    pub fn to_path(&self) -> String {
        format!("/ipns/{}", self.id)
    }
}

impl fmt::Debug for NamingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamingKey({} -> {})", self.name, self.id)
    }
}

impl fmt::Display for NamingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
