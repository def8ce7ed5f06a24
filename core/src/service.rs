use crate::models::{split_tags, Note, NoteId};
use crate::notify::Notifier;
use crate::query::{NotePage, NoteQuery, PageRequest};
use crate::storage::NoteRepository;
use crate::{Error, Result};
use chrono::{DateTime, Utc};

/// Outcome of a share call: the note as stored afterwards, plus which
/// targets were actually reached.
#[derive(Debug, Clone)]
pub struct ShareReceipt {
    pub note: Note,
    pub shared_with_user: Option<String>,
    pub emailed_to: Option<String>,
}

/// Note lifecycle and query logic over an injected repository and
/// notifier. The service owns identity assignment and timestamp
/// management; storage backends carry no business logic.
pub struct NoteService<R, N> {
    repo: R,
    notifier: N,
}

impl<R: NoteRepository, N: Notifier> NoteService<R, N> {
    pub fn new(repo: R, notifier: N) -> Self {
        Self { repo, notifier }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Create a note from raw content and an optional comma-separated
    /// tag string. Content is trimmed and must be non-empty.
    pub fn create(&self, content: &str, tags_raw: Option<&str>) -> Result<Note> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::Validation("note content must not be empty".to_string()));
        }

        let tags = split_tags(tags_raw.unwrap_or(""));
        let note = Note::new(content.to_string(), tags);
        let stored = self.repo.create(note)?;
        log::info!("created note {}", stored.id);
        Ok(stored)
    }

    /// Update content and/or tags of a non-deleted note.
    ///
    /// Content: provided and non-empty after trim replaces the stored
    /// content; blank or absent content keeps the prior value. Tags: an
    /// absent tag string retains the existing tags, a present-but-empty
    /// one clears them. updated_at is refreshed only when something was
    /// written.
    pub fn update(
        &self,
        id: &NoteId,
        content: Option<&str>,
        tags_raw: Option<&str>,
    ) -> Result<Note> {
        let mut note = self.get_by_id(id)?;
        let mut changed = false;

        if let Some(content) = content {
            let content = content.trim();
            if !content.is_empty() {
                note.content = content.to_string();
                changed = true;
            }
        }
        if let Some(raw) = tags_raw {
            note.tags = split_tags(raw);
            changed = true;
        }

        if changed {
            note.touch();
            note = self.repo.update(&note)?;
            log::info!("updated note {}", note.id);
        }
        Ok(note)
    }

    /// Mark a note as deleted. Idempotent: repeated calls on an
    /// already-deleted note succeed without effect.
    pub fn soft_delete(&self, id: &NoteId) -> Result<()> {
        check_id(id)?;
        self.repo.mark_deleted(id)?;
        log::info!("soft-deleted note {id}");
        Ok(())
    }

    /// Physically remove a note. Does not require a prior soft delete.
    pub fn purge(&self, id: &NoteId) -> Result<()> {
        check_id(id)?;
        self.repo.delete(id)?;
        log::info!("purged note {id}");
        Ok(())
    }

    /// Fetch a note by id; soft-deleted notes are reported as not found
    pub fn get_by_id(&self, id: &NoteId) -> Result<Note> {
        let note = self.fetch(id)?;
        if note.deleted {
            return Err(Error::NotFound(format!("Note not found: {id}")));
        }
        Ok(note)
    }

    /// One page of non-deleted notes in insertion order. Non-positive
    /// page/limit inputs fall back to page=1, limit=10; an out-of-range
    /// page yields an empty item list, not an error.
    pub fn list(&self, page: i64, limit: i64) -> Result<NotePage> {
        let page = PageRequest::new(page, limit);
        let query = NoteQuery::default();

        let total = self.repo.count(&query)?;
        let items = self.repo.find_many(&query, Some(&page))?;

        Ok(NotePage {
            items,
            current_page: page.page,
            total_pages: NotePage::pages_for(total, page.limit),
        })
    }

    /// Case-insensitive substring search against content and tags.
    /// An empty term matches every non-deleted note.
    pub fn search(&self, term: &str) -> Result<Vec<Note>> {
        let query = NoteQuery {
            term: Some(term.to_string()),
            ..Default::default()
        };
        self.repo.find_many(&query, None)
    }

    /// Filter non-deleted notes by exact tag and/or an inclusive
    /// updated_at range. All given criteria must hold; none given
    /// returns every non-deleted note.
    pub fn filter(
        &self,
        tag: Option<&str>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Note>> {
        let query = NoteQuery {
            tag: tag.map(String::from),
            updated_from: start,
            updated_until: end,
            ..Default::default()
        };
        self.repo.find_many(&query, None)
    }

    /// Share a note with an internal user reference and/or by email.
    ///
    /// The user reference is appended to shared_with first (append-only,
    /// duplicates allowed) and refreshes updated_at like any other
    /// mutation; the email is sent second and leaves updated_at alone.
    /// A delivery failure surfaces as an error but never rolls back the
    /// shared_with append. Soft-deleted notes remain shareable.
    pub fn share(
        &self,
        id: &NoteId,
        email: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<ShareReceipt> {
        if email.is_none() && user_id.is_none() {
            return Err(Error::Validation(
                "share needs an email address or a user reference".to_string(),
            ));
        }

        let mut note = self.fetch(id)?;

        let mut shared_with_user = None;
        if let Some(user_id) = user_id {
            note.shared_with.push(user_id.to_string());
            note.touch();
            note = self.repo.update(&note)?;
            shared_with_user = Some(user_id.to_string());
            log::info!("shared note {} with user {user_id}", note.id);
        }

        let mut emailed_to = None;
        if let Some(address) = email {
            let subject = format!("A note was shared with you: {}", note.id);
            let tags = if note.tags.is_empty() {
                "(no tags)".to_string()
            } else {
                note.tags.join(", ")
            };
            let body = format!("{}\n\nTags: {}", note.content, tags);

            self.notifier.send(address, &subject, &body).map_err(|e| match e {
                Error::Delivery(_) => e,
                other => Error::Delivery(other.to_string()),
            })?;
            emailed_to = Some(address.to_string());
            log::info!("emailed note {} to {address}", note.id);
        }

        Ok(ShareReceipt {
            note,
            shared_with_user,
            emailed_to,
        })
    }

    /// Look up a note regardless of its soft-delete flag
    fn fetch(&self, id: &NoteId) -> Result<Note> {
        check_id(id)?;
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("Note not found: {id}")))
    }
}

fn check_id(id: &NoteId) -> Result<()> {
    if id.is_blank() {
        return Err(Error::Validation("note id must not be blank".to_string()));
    }
    Ok(())
}
