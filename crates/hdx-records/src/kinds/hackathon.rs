use std::borrow::Cow;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::matcher::FieldValue;
use crate::record::Record;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HackathonStatus {
    #[default]
    Upcoming,
    Active,
    Completed,
}

impl fmt::Display for HackathonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Upcoming => "Upcoming",
            Self::Active => "Active",
            Self::Completed => "Completed",
        };
        f.write_str(s)
    }
}

/// A hackathon event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hackathon {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: HackathonStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free-form, e.g. `"50,000 USDC"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize_pool: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer_id: Option<String>,
}

impl Record for Hackathon {
    const KIND: &'static str = "hackathon";

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> Option<String> {
        Some(self.status.to_string())
    }

    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.title.as_str(), self.description.as_str()];
        text.extend(self.location.as_deref());
        text.extend(self.tags.iter().map(String::as_str));
        text
    }

    fn filter_field(&self, field: &str) -> Option<FieldValue<'_>> {
        match field {
            "status" => Some(FieldValue::Exact(Cow::Owned(self.status.to_string()))),
            "organizerId" => self
                .organizer_id
                .as_deref()
                .map(|id| FieldValue::Exact(Cow::Borrowed(id))),
            "title" => Some(FieldValue::Text(&self.title)),
            "location" => self.location.as_deref().map(FieldValue::Text),
            "tags" => Some(FieldValue::List(&self.tags)),
            _ => None,
        }
    }

    fn fixtures() -> Vec<Self> {
        vec![
            Hackathon {
                title: "ETHGlobal Online".into(),
                description: "Month-long remote hackathon for Ethereum builders.".into(),
                status: HackathonStatus::Active,
                start_date: NaiveDate::from_ymd_opt(2026, 10, 1),
                end_date: NaiveDate::from_ymd_opt(2026, 10, 31),
                location: Some("Online".into()),
                prize_pool: Some("250,000 USD".into()),
                tags: vec!["ethereum".into(), "defi".into()],
                organizer_id: None,
            },
            Hackathon {
                title: "Web3 Identity Sprint".into(),
                description: "A weekend on decentralized identity and credentials.".into(),
                status: HackathonStatus::Upcoming,
                start_date: NaiveDate::from_ymd_opt(2026, 12, 5),
                end_date: NaiveDate::from_ymd_opt(2026, 12, 7),
                location: Some("Berlin".into()),
                prize_pool: Some("20,000 USDC".into()),
                tags: vec!["identity".into()],
                organizer_id: None,
            },
        ]
    }
}
