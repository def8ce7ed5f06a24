use super::{apply_page, NoteRepository};
use crate::models::{Note, NoteId};
use crate::query::{NoteQuery, PageRequest};
use crate::{Error, Result};
use std::sync::{Mutex, MutexGuard};

/// In-memory note repository. Notes live in a Vec in insertion order,
/// which doubles as the natural listing order.
#[derive(Default)]
pub struct MemoryNoteRepository {
    notes: Mutex<Vec<Note>>,
}

impl MemoryNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<Note>> {
        self.notes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NoteRepository for MemoryNoteRepository {
    fn create(&self, note: Note) -> Result<Note> {
        self.guard().push(note.clone());
        Ok(note)
    }

    fn find_by_id(&self, id: &NoteId) -> Result<Option<Note>> {
        Ok(self.guard().iter().find(|n| &n.id == id).cloned())
    }

    fn find_many(&self, query: &NoteQuery, page: Option<&PageRequest>) -> Result<Vec<Note>> {
        let matching = self
            .guard()
            .iter()
            .filter(|n| query.matches(n))
            .cloned()
            .collect();
        Ok(apply_page(matching, page))
    }

    fn count(&self, query: &NoteQuery) -> Result<u64> {
        Ok(self.guard().iter().filter(|n| query.matches(n)).count() as u64)
    }

    fn update(&self, note: &Note) -> Result<Note> {
        let mut notes = self.guard();
        match notes.iter_mut().find(|n| n.id == note.id) {
            Some(slot) => {
                *slot = note.clone();
                Ok(note.clone())
            }
            None => Err(Error::NotFound(format!("Note not found: {}", note.id))),
        }
    }

    fn mark_deleted(&self, id: &NoteId) -> Result<()> {
        let mut notes = self.guard();
        match notes.iter_mut().find(|n| &n.id == id) {
            Some(note) => {
                note.deleted = true;
                Ok(())
            }
            None => Err(Error::NotFound(format!("Note not found: {}", id))),
        }
    }

    fn delete(&self, id: &NoteId) -> Result<()> {
        let mut notes = self.guard();
        match notes.iter().position(|n| &n.id == id) {
            Some(index) => {
                notes.remove(index);
                Ok(())
            }
            None => Err(Error::NotFound(format!("Note not found: {}", id))),
        }
    }
}
