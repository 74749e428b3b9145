//! Companion domain models.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::companions_constants::{canonical_subject, DEFAULT_DURATION_MINUTES, DEFAULT_PAGE_LIMIT};
use crate::errors::{FieldError, ValidationError};
use crate::identity::Identity;
use crate::Result;

/// Voice a companion speaks with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Male,
    Female,
}

impl Voice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Voice::Male => "male",
            Voice::Female => "female",
        }
    }

    /// Case-insensitive parse of form input.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Voice::Male),
            "female" => Some(Voice::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversational register of a companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Formal,
    Casual,
}

impl Style {
    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Formal => "formal",
            Style::Casual => "casual",
        }
    }

    /// Case-insensitive parse of form input.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "formal" => Some(Style::Formal),
            "casual" => Some(Style::Casual),
            _ => None,
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain model representing a stored companion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Companion {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub topic: String,
    pub voice: Voice,
    pub style: Style,
    /// Session length in minutes
    pub duration: u32,
    /// User id of the creator
    pub author: String,
}

/// Raw, unvalidated form input.
///
/// Every field defaults so that missing keys surface as field errors
/// rather than as a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanionForm {
    pub name: String,
    pub subject: String,
    pub topic: String,
    pub voice: String,
    pub style: String,
    pub duration: Option<i64>,
}

impl Default for CompanionForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            subject: String::new(),
            topic: String::new(),
            voice: String::new(),
            style: String::new(),
            duration: Some(DEFAULT_DURATION_MINUTES),
        }
    }
}

impl CompanionForm {
    /// Validates every field and returns the typed companion fields.
    ///
    /// All field errors are collected, not just the first one.
    pub fn validate(&self) -> Result<NewCompanion> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FieldError::new("name", "Companion is required"));
        }

        let subject = if self.subject.trim().is_empty() {
            errors.push(FieldError::new("subject", "Subject is required"));
            None
        } else {
            let subject = canonical_subject(&self.subject);
            if subject.is_none() {
                errors.push(FieldError::new("subject", "Unknown subject"));
            }
            subject
        };

        let topic = self.topic.trim();
        if topic.is_empty() {
            errors.push(FieldError::new("topic", "Topic is required"));
        }

        let voice = if self.voice.trim().is_empty() {
            errors.push(FieldError::new("voice", "Voice is required"));
            None
        } else {
            let voice = Voice::parse(&self.voice);
            if voice.is_none() {
                errors.push(FieldError::new("voice", "Voice must be male or female"));
            }
            voice
        };

        let style = if self.style.trim().is_empty() {
            errors.push(FieldError::new("style", "Style is required"));
            None
        } else {
            let style = Style::parse(&self.style);
            if style.is_none() {
                errors.push(FieldError::new("style", "Style must be formal or casual"));
            }
            style
        };

        let duration = match self.duration {
            None => {
                errors.push(FieldError::new("duration", "Duration is required"));
                None
            }
            Some(minutes) if minutes < 1 => {
                errors.push(FieldError::new(
                    "duration",
                    "Duration must be at least 1 minute",
                ));
                None
            }
            Some(minutes) => match u32::try_from(minutes) {
                Ok(minutes) => Some(minutes),
                Err(_) => {
                    errors.push(FieldError::new("duration", "Duration is too long"));
                    None
                }
            },
        };

        match (subject, voice, style, duration) {
            (Some(subject), Some(voice), Some(style), Some(duration)) if errors.is_empty() => {
                Ok(NewCompanion {
                    name: name.to_string(),
                    subject: subject.to_string(),
                    topic: topic.to_string(),
                    voice,
                    style,
                    duration,
                })
            }
            _ => Err(ValidationError::InvalidFields(errors).into()),
        }
    }
}

/// Validated companion fields, ready to be attributed to an author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewCompanion {
    pub name: String,
    pub subject: String,
    pub topic: String,
    pub voice: Voice,
    pub style: Style,
    pub duration: u32,
}

/// Immutable creation request: validated fields plus the author.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateCompanionRequest {
    companion: NewCompanion,
    author: String,
}

impl CreateCompanionRequest {
    pub fn new(companion: NewCompanion, author: &Identity) -> Self {
        Self {
            companion,
            author: author.user_id.clone(),
        }
    }

    pub fn companion(&self) -> &NewCompanion {
        &self.companion
    }

    pub fn author(&self) -> &str {
        &self.author
    }
}

/// Filters and pagination for listing companions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ListCompanionsOptions {
    pub limit: u32,
    /// 1-based page number
    pub page: u32,
    pub subject: Option<String>,
    pub topic: Option<String>,
}

impl Default for ListCompanionsOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            page: 1,
            subject: None,
            topic: None,
        }
    }
}

impl ListCompanionsOptions {
    pub fn validate(&self) -> Result<()> {
        if self.limit < 1 {
            return Err(ValidationError::InvalidInput("limit must be at least 1".to_string()).into());
        }
        if self.page < 1 {
            return Err(ValidationError::InvalidInput("page must be at least 1".to_string()).into());
        }
        Ok(())
    }

    /// Subject filter, ignoring blank input.
    pub fn subject_filter(&self) -> Option<&str> {
        non_blank(self.subject.as_deref())
    }

    /// Topic filter, ignoring blank input.
    pub fn topic_filter(&self) -> Option<&str> {
        non_blank(self.topic.as_deref())
    }

    /// Inclusive row range `[(page-1)*limit, page*limit - 1]`.
    ///
    /// Zero values are clamped to 1 so the range is always well formed.
    pub fn row_range(&self) -> (u64, u64) {
        let limit = u64::from(self.limit.max(1));
        let page = u64::from(self.page.max(1));
        let from = (page - 1) * limit;
        (from, from + limit - 1)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
