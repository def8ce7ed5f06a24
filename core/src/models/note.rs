use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque note identifier. A UUID string under the hood, but nothing in the
/// service layer relies on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A blank identifier can never refer to a stored note
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub content: String,
    pub tags: Vec<String>,
    pub shared_with: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
}

impl Note {
    /// Create a new note with a generated id and fresh timestamps
    pub fn new(content: String, tags: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: NoteId::generate(),
            content,
            tags,
            shared_with: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted: false,
        }
    }

    /// Create a note with a specific id (for testing or import)
    pub fn with_id(id: NoteId, content: String, tags: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            content,
            tags,
            shared_with: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted: false,
        }
    }

    /// Update the modified timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Split a raw comma-separated tag string into normalized tags:
/// each piece trimmed, empty pieces dropped. Order is preserved.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}
