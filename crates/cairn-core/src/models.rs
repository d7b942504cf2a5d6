//! Data model for cairn records.
//!
//! A [`Record`] is a stored knowledge item: a literal text note, a document
//! with extracted text, or a bookmark. The kind is fixed at creation and
//! drives per-kind validation, embedding composition, and context formatting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Discriminant for the three record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Literal text note; `body` holds the content.
    Text,
    /// Uploaded document; `body` holds extracted text, `external_url` the stored file.
    Document,
    /// Saved link; `body` holds an optional description, `external_url` the target.
    Bookmark,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Document => write!(f, "document"),
            Self::Bookmark => write!(f, "bookmark"),
        }
    }
}

impl std::str::FromStr for RecordKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "document" => Ok(Self::Document),
            "bookmark" => Ok(Self::Bookmark),
            other => Err(Error::InvalidInput(format!(
                "Invalid record kind: {}",
                other
            ))),
        }
    }
}

/// A stored knowledge item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: RecordKind,
    pub title: String,
    /// Literal content for `text`, extracted text for `document`,
    /// description for `bookmark`. May be empty except for `text`.
    pub body: String,
    /// Bookmark target URL or stored-file URL. `None` for `text`.
    pub external_url: Option<String>,
    /// Order preserved for display; matching is order-insensitive.
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Text embedded into the vector index for this record.
    ///
    /// Composition mirrors what gets searched: title plus body, plus the
    /// target URL for bookmarks.
    pub fn embedding_text(&self) -> String {
        match self.kind {
            RecordKind::Text | RecordKind::Document => {
                format!("{} {}", self.title, self.body)
            }
            RecordKind::Bookmark => format!(
                "{} {} {}",
                self.title,
                self.body,
                self.external_url.as_deref().unwrap_or("")
            ),
        }
    }

    /// Check the per-kind invariants on a stored or about-to-be-stored record.
    pub fn validate(&self) -> Result<()> {
        validate_fields(
            self.kind,
            &self.title,
            &self.body,
            self.external_url.as_deref(),
        )
    }

    /// Apply a partial update in place. Kind is immutable; `updated_at` is
    /// left for the repository to set on write.
    pub fn apply(&mut self, update: RecordUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(body) = update.body {
            self.body = body;
        }
        if let Some(url) = update.external_url {
            self.external_url = Some(url);
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
    }
}

/// Per-kind field validation shared by creation and update paths.
///
/// Runs before any external call so a validation failure leaves no partial
/// side effects.
fn validate_fields(
    kind: RecordKind,
    title: &str,
    body: &str,
    external_url: Option<&str>,
) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::InvalidInput(
            "Title is required and must be a non-empty string".to_string(),
        ));
    }
    match kind {
        RecordKind::Text => {
            if body.trim().is_empty() {
                return Err(Error::InvalidInput(
                    "Body is required for text records".to_string(),
                ));
            }
        }
        RecordKind::Bookmark => {
            if external_url.map(str::trim).unwrap_or("").is_empty() {
                return Err(Error::InvalidInput(
                    "A bookmark URL is required for bookmark records".to_string(),
                ));
            }
        }
        RecordKind::Document => {}
    }
    Ok(())
}

/// A new record, with per-variant required fields enforced by the type
/// system. Kind is derived from the variant and fixed from then on.
#[derive(Debug, Clone)]
pub enum NewRecord {
    Text {
        title: String,
        body: String,
        tags: Vec<String>,
    },
    Bookmark {
        title: String,
        url: String,
        description: String,
        tags: Vec<String>,
    },
    Document {
        title: String,
        extracted_text: String,
        file_url: String,
        tags: Vec<String>,
    },
}

impl NewRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Text { .. } => RecordKind::Text,
            Self::Bookmark { .. } => RecordKind::Bookmark,
            Self::Document { .. } => RecordKind::Document,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Text { title, .. }
            | Self::Bookmark { title, .. }
            | Self::Document { title, .. } => title,
        }
    }

    /// Body column value for this variant.
    pub fn body(&self) -> &str {
        match self {
            Self::Text { body, .. } => body,
            Self::Bookmark { description, .. } => description,
            Self::Document { extracted_text, .. } => extracted_text,
        }
    }

    /// External-URL column value for this variant.
    pub fn external_url(&self) -> Option<&str> {
        match self {
            Self::Text { .. } => None,
            Self::Bookmark { url, .. } => Some(url),
            Self::Document { file_url, .. } => Some(file_url),
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            Self::Text { tags, .. }
            | Self::Bookmark { tags, .. }
            | Self::Document { tags, .. } => tags,
        }
    }

    /// Validate required fields before anything touches an external service.
    pub fn validate(&self) -> Result<()> {
        validate_fields(self.kind(), self.title(), self.body(), self.external_url())
    }
}

/// Partial update to an existing record. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub external_url: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl RecordUpdate {
    /// True when the update touches a field that feeds the embedding, in
    /// which case the vector entry must be refreshed.
    pub fn affects_embedding(&self) -> bool {
        self.title.is_some() || self.body.is_some() || self.external_url.is_some()
    }
}

/// A vector-index hit, annotated with its similarity rank. Ephemeral:
/// produced by the index query, consumed by candidate resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Identifier matching a [`Record::id`].
    pub record_ref: Uuid,
    /// 0 = most similar.
    pub rank: usize,
    /// Similarity score reported by the index.
    pub score: f32,
}

/// Resolve index hits against fetched records, preserving rank order.
///
/// Hits with no matching record (deleted since indexing, or owned by someone
/// else) are silently dropped; the index is a derived artifact and may lag
/// the primary store.
pub fn resolve_candidates(hits: &[Candidate], records: Vec<Record>) -> Vec<Record> {
    let mut by_id: std::collections::HashMap<Uuid, Record> =
        records.into_iter().map(|r| (r.id, r)).collect();
    hits.iter()
        .filter_map(|hit| by_id.remove(&hit.record_ref))
        .collect()
}

/// Per-tag usage count, for the analytics endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// Aggregate statistics over a caller's records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analytics {
    pub total: i64,
    pub by_kind: std::collections::HashMap<String, i64>,
    /// Top 5 tags by usage count.
    pub top_tags: Vec<TagCount>,
}
