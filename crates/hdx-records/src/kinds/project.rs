use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::matcher::FieldValue;
use crate::record::Record;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    Draft,
    Submitted,
    InProgress,
    Completed,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::InProgress => "InProgress",
            Self::Completed => "Completed",
        };
        f.write_str(s)
    }
}

/// A hackathon submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hackathon_id: Option<String>,
    /// Profile ids of the team members.
    #[serde(default)]
    pub team: Vec<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_url: Option<String>,
}

impl Record for Project {
    const KIND: &'static str = "project";

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> Option<String> {
        Some(self.status.to_string())
    }

    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.title.as_str(), self.description.as_str()];
        text.extend(self.tech_stack.iter().map(String::as_str));
        text
    }

    fn filter_field(&self, field: &str) -> Option<FieldValue<'_>> {
        match field {
            "status" => Some(FieldValue::Exact(Cow::Owned(self.status.to_string()))),
            "hackathonId" => self
                .hackathon_id
                .as_deref()
                .map(|id| FieldValue::Exact(Cow::Borrowed(id))),
            "title" => Some(FieldValue::Text(&self.title)),
            "team" => Some(FieldValue::List(&self.team)),
            "techStack" => Some(FieldValue::List(&self.tech_stack)),
            _ => None,
        }
    }

    fn fixtures() -> Vec<Self> {
        vec![
            Project {
                title: "DeFi Yield Optimizer".into(),
                description: "Routes deposits across lending pools to maximise yield.".into(),
                status: ProjectStatus::Completed,
                tech_stack: vec!["Solidity".into(), "TypeScript".into()],
                repository_url: Some("https://github.com/hackdex/defi-yield-optimizer".into()),
                ..Project::default()
            },
            Project {
                title: "Decentralized Identity Verification".into(),
                description: "Self-sovereign credentials checked without a central registry."
                    .into(),
                status: ProjectStatus::InProgress,
                tech_stack: vec!["Rust".into(), "WebAssembly".into()],
                ..Project::default()
            },
            Project {
                title: "AI-Powered NFT Marketplace".into(),
                description: "Generative artwork minted and traded on-chain.".into(),
                status: ProjectStatus::Submitted,
                tech_stack: vec!["Python".into(), "Solidity".into()],
                demo_url: Some("https://nft-market.example".into()),
                ..Project::default()
            },
        ]
    }
}
