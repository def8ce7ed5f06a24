use crate::models::Note;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Multi-predicate note filter. All set predicates must hold (AND).
/// Both repository backends evaluate [`NoteQuery::matches`] so filtering
/// semantics cannot drift between them.
#[derive(Debug, Clone, Default)]
pub struct NoteQuery {
    /// Soft-deleted notes are hidden unless this is set
    pub include_deleted: bool,
    /// Exact, case-sensitive membership in the note's tag sequence
    pub tag: Option<String>,
    /// Case-insensitive substring against content or any tag
    pub term: Option<String>,
    /// Inclusive lower bound on updated_at
    pub updated_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on updated_at
    pub updated_until: Option<DateTime<Utc>>,
}

impl NoteQuery {
    pub fn matches(&self, note: &Note) -> bool {
        if note.deleted && !self.include_deleted {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !note.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(term) = &self.term {
            // An empty term matches everything
            let needle = term.to_lowercase();
            let in_content = note.content.to_lowercase().contains(&needle);
            let in_tags = note.tags.iter().any(|t| t.to_lowercase().contains(&needle));
            if !in_content && !in_tags {
                return false;
            }
        }
        if let Some(from) = self.updated_from {
            if note.updated_at < from {
                return false;
            }
        }
        if let Some(until) = self.updated_until {
            if note.updated_at > until {
                return false;
            }
        }
        true
    }
}

/// Normalized pagination request. Page numbering starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 10;

    /// Build a request from raw caller input, defaulting non-positive
    /// values to page=1, limit=10.
    pub fn new(page: i64, limit: i64) -> Self {
        let page = u32::try_from(page).ok().filter(|p| *p >= 1).unwrap_or(Self::DEFAULT_PAGE);
        let limit = u32::try_from(limit).ok().filter(|l| *l >= 1).unwrap_or(Self::DEFAULT_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// One page of a note listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotePage {
    pub items: Vec<Note>,
    pub current_page: u32,
    pub total_pages: u32,
}

impl NotePage {
    /// ceil(total / limit); zero matching notes means zero pages
    pub fn pages_for(total: u64, limit: u32) -> u32 {
        let limit = u64::from(limit.max(1));
        ((total + limit - 1) / limit) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Note;
    use chrono::Duration;

    fn note(content: &str, tags: &[&str]) -> Note {
        Note::new(content.to_string(), tags.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn test_excludes_deleted_by_default() {
        let mut n = note("hello", &[]);
        n.deleted = true;
        assert!(!NoteQuery::default().matches(&n));

        let query = NoteQuery {
            include_deleted: true,
            ..Default::default()
        };
        assert!(query.matches(&n));
    }

    #[test]
    fn test_term_matches_content_or_tags_case_insensitive() {
        let n = note("Shopping list", &["Default"]);
        let by_content = NoteQuery {
            term: Some("SHOP".to_string()),
            ..Default::default()
        };
        let by_tag = NoteQuery {
            term: Some("default".to_string()),
            ..Default::default()
        };
        let miss = NoteQuery {
            term: Some("groceries".to_string()),
            ..Default::default()
        };
        assert!(by_content.matches(&n));
        assert!(by_tag.matches(&n));
        assert!(!miss.matches(&n));
    }

    #[test]
    fn test_empty_term_matches_everything() {
        let n = note("anything", &[]);
        let query = NoteQuery {
            term: Some(String::new()),
            ..Default::default()
        };
        assert!(query.matches(&n));
    }

    #[test]
    fn test_tag_is_exact_and_case_sensitive() {
        let n = note("x", &["Work"]);
        let exact = NoteQuery {
            tag: Some("Work".to_string()),
            ..Default::default()
        };
        let wrong_case = NoteQuery {
            tag: Some("work".to_string()),
            ..Default::default()
        };
        assert!(exact.matches(&n));
        assert!(!wrong_case.matches(&n));
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let n = note("x", &[]);
        let at = n.updated_at;
        let inclusive = NoteQuery {
            updated_from: Some(at),
            updated_until: Some(at),
            ..Default::default()
        };
        assert!(inclusive.matches(&n));

        let before = NoteQuery {
            updated_until: Some(at - Duration::seconds(1)),
            ..Default::default()
        };
        let after = NoteQuery {
            updated_from: Some(at + Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!before.matches(&n));
        assert!(!after.matches(&n));
    }

    #[test]
    fn test_page_request_defaults() {
        assert_eq!(PageRequest::new(0, -5), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(3, 25), PageRequest { page: 3, limit: 25 });
        assert_eq!(PageRequest::new(2, 10).offset(), 10);
        assert_eq!(PageRequest::default().offset(), 0);
    }

    #[test]
    fn test_pages_for() {
        assert_eq!(NotePage::pages_for(0, 10), 0);
        assert_eq!(NotePage::pages_for(1, 10), 1);
        assert_eq!(NotePage::pages_for(10, 10), 1);
        assert_eq!(NotePage::pages_for(11, 10), 2);
        assert_eq!(NotePage::pages_for(2, 1), 2);
    }
}
