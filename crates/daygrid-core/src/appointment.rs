use std::fmt;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical `YYYY-MM-DD` key for a local calendar day. Two dates denoting
/// the same day always produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(String);

impl DateKey {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid date key: {raw}"))?;
        Ok(Self::from(date))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<NaiveDate> for DateKey {
    fn from(day: NaiveDate) -> Self {
        Self(day.format("%Y-%m-%d").to_string())
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The result of the appointment form, before an identity is assigned.
/// Construction enforces the non-empty-title rule so invalid drafts never
/// reach the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentDraft {
    pub title: String,
    pub description: String,
}

impl AppointmentDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> anyhow::Result<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(anyhow!("appointment title must not be empty"));
        }
        Ok(Self {
            title,
            description: description.into(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appointment {
    pub id: Uuid,

    pub title: String,

    #[serde(default)]
    pub description: String,
}

impl Appointment {
    pub fn new(draft: AppointmentDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
        }
    }
}
