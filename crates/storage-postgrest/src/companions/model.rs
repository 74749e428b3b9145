//! Row types for the `companions` table.

use companions_core::companions::{Companion, CreateCompanionRequest, Style, Voice};
use companions_core::errors::{Error, PersistenceError};
use serde::{Deserialize, Serialize};

use crate::utils::deserialize_id;

pub const COMPANIONS_TABLE: &str = "companions";

/// Row model as returned by the store
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CompanionRow {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    pub subject: String,
    pub topic: String,
    pub voice: String,
    pub style: String,
    pub duration: i64,
    #[serde(default)]
    pub author: Option<String>,
}

/// Insert payload; `id` and `created_at` are assigned by the store
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewCompanionRow {
    pub name: String,
    pub subject: String,
    pub topic: String,
    pub voice: String,
    pub style: String,
    pub duration: i64,
    pub author: String,
}

impl From<&CreateCompanionRequest> for NewCompanionRow {
    fn from(request: &CreateCompanionRequest) -> Self {
        let companion = request.companion();
        Self {
            name: companion.name.clone(),
            subject: companion.subject.clone(),
            topic: companion.topic.clone(),
            voice: companion.voice.as_str().to_string(),
            style: companion.style.as_str().to_string(),
            duration: i64::from(companion.duration),
            author: request.author().to_string(),
        }
    }
}

fn decode_error(message: String) -> Error {
    Error::Persistence(PersistenceError::Decode(message))
}

impl TryFrom<CompanionRow> for Companion {
    type Error = Error;

    fn try_from(row: CompanionRow) -> Result<Self, Self::Error> {
        let voice = Voice::parse(&row.voice)
            .ok_or_else(|| decode_error(format!("unknown voice '{}'", row.voice)))?;
        let style = Style::parse(&row.style)
            .ok_or_else(|| decode_error(format!("unknown style '{}'", row.style)))?;
        let duration = u32::try_from(row.duration)
            .map_err(|_| decode_error(format!("invalid duration {}", row.duration)))?;
        Ok(Companion {
            id: row.id,
            name: row.name,
            subject: row.subject,
            topic: row.topic,
            voice,
            style,
            duration,
            author: row.author.unwrap_or_default(),
        })
    }
}
