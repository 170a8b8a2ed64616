use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::matcher::FieldValue;
use crate::record::Record;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    #[default]
    Participant,
    Organizer,
    Judge,
    Mentor,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Participant => "Participant",
            Self::Organizer => "Organizer",
            Self::Judge => "Judge",
            Self::Mentor => "Mentor",
        };
        f.write_str(s)
    }
}

/// A participant, organizer, judge or mentor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

impl Record for UserProfile {
    const KIND: &'static str = "profile";

    fn title(&self) -> &str {
        &self.display_name
    }

    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.display_name.as_str(), self.bio.as_str()];
        text.extend(self.skills.iter().map(String::as_str));
        text
    }

    fn filter_field(&self, field: &str) -> Option<FieldValue<'_>> {
        match field {
            "role" => Some(FieldValue::Exact(Cow::Owned(self.role.to_string()))),
            "email" => self
                .email
                .as_deref()
                .map(|e| FieldValue::Exact(Cow::Borrowed(e))),
            "walletAddress" => self
                .wallet_address
                .as_deref()
                .map(|w| FieldValue::Exact(Cow::Borrowed(w))),
            "displayName" => Some(FieldValue::Text(&self.display_name)),
            "skills" => Some(FieldValue::List(&self.skills)),
            _ => None,
        }
    }

    fn fixtures() -> Vec<Self> {
        vec![
            UserProfile {
                display_name: "Ada Byron".into(),
                bio: "Smart contract auditor.".into(),
                role: UserRole::Judge,
                skills: vec!["Solidity".into(), "Formal verification".into()],
                ..UserProfile::default()
            },
            UserProfile {
                display_name: "Lin Okafor".into(),
                bio: "Full-stack dApp developer.".into(),
                role: UserRole::Participant,
                skills: vec!["Rust".into(), "React".into()],
                ..UserProfile::default()
            },
        ]
    }
}
