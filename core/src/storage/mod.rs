mod database;
mod memory;
mod sqlite;

pub use database::{Connection, Database};
pub use memory::MemoryNoteRepository;
pub use sqlite::SqliteNoteRepository;

use crate::models::{Note, NoteId};
use crate::query::{NoteQuery, PageRequest};
use crate::Result;

/// Storage contract consumed by the note service. Implementations own
/// durable storage and carry no business logic: identity assignment and
/// timestamp management stay in the service layer.
///
/// Every operation is atomic with respect to a single note; no multi-note
/// transactional guarantee is made.
pub trait NoteRepository: Send + Sync {
    /// Persist a new note and return the stored record
    fn create(&self, note: Note) -> Result<Note>;

    /// Look up a note by id. Soft-deleted notes are returned too; the
    /// caller decides whether they are visible.
    fn find_by_id(&self, id: &NoteId) -> Result<Option<Note>>;

    /// All notes matching the query, in insertion order. Pagination is
    /// applied after filtering so it always agrees with [`Self::count`].
    fn find_many(&self, query: &NoteQuery, page: Option<&PageRequest>) -> Result<Vec<Note>>;

    /// Number of notes matching the query
    fn count(&self, query: &NoteQuery) -> Result<u64>;

    /// Whole-record write; fails with NotFound if the note is absent
    fn update(&self, note: &Note) -> Result<Note>;

    /// Set the soft-delete flag. Idempotent on already-deleted notes;
    /// fails with NotFound if the note is absent.
    fn mark_deleted(&self, id: &NoteId) -> Result<()>;

    /// Physically remove a note; fails with NotFound if absent
    fn delete(&self, id: &NoteId) -> Result<()>;
}

pub(crate) fn apply_page(notes: Vec<Note>, page: Option<&PageRequest>) -> Vec<Note> {
    match page {
        Some(p) => notes
            .into_iter()
            .skip(p.offset())
            .take(p.limit as usize)
            .collect(),
        None => notes,
    }
}
