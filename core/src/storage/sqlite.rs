use super::{apply_page, Connection, NoteRepository};
use crate::models::{datetime_to_timestamp, timestamp_to_datetime, Note, NoteId};
use crate::query::{NoteQuery, PageRequest};
use crate::{Error, Result};
use rusqlite::{params, OptionalExtension, Row};
use std::sync::{Mutex, MutexGuard};

const COLUMNS: &str = "id, content, tags, shared_with, created_at, updated_at, deleted";

/// SQLite-backed note repository. Tags and shared-with references are
/// stored as JSON arrays; insertion order is the rowid order.
pub struct SqliteNoteRepository {
    conn: Mutex<Connection>,
}

/// Raw row image before JSON/timestamp decoding
struct NoteRow {
    id: String,
    content: String,
    tags: String,
    shared_with: String,
    created_at: i64,
    updated_at: i64,
    deleted: bool,
}

fn read_row(row: &Row) -> rusqlite::Result<NoteRow> {
    Ok(NoteRow {
        id: row.get(0)?,
        content: row.get(1)?,
        tags: row.get(2)?,
        shared_with: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        deleted: row.get(6)?,
    })
}

fn decode(row: NoteRow) -> Result<Note> {
    Ok(Note {
        id: NoteId::from(row.id),
        content: row.content,
        tags: serde_json::from_str(&row.tags)?,
        shared_with: serde_json::from_str(&row.shared_with)?,
        created_at: timestamp_to_datetime(row.created_at),
        updated_at: timestamp_to_datetime(row.updated_at),
        deleted: row.deleted,
    })
}

impl SqliteNoteRepository {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NoteRepository for SqliteNoteRepository {
    fn create(&self, note: Note) -> Result<Note> {
        self.conn().execute(
            "INSERT INTO notes (id, content, tags, shared_with, created_at, updated_at, deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                note.id.as_str(),
                note.content,
                serde_json::to_string(&note.tags)?,
                serde_json::to_string(&note.shared_with)?,
                datetime_to_timestamp(&note.created_at),
                datetime_to_timestamp(&note.updated_at),
                note.deleted,
            ],
        )?;
        Ok(note)
    }

    fn find_by_id(&self, id: &NoteId) -> Result<Option<Note>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {COLUMNS} FROM notes WHERE id = ?1"))?;

        let row = stmt
            .query_row(params![id.as_str()], read_row)
            .optional()?;

        row.map(decode).transpose()
    }

    fn find_many(&self, query: &NoteQuery, page: Option<&PageRequest>) -> Result<Vec<Note>> {
        let conn = self.conn();
        // The deleted filter runs in SQL; the remaining predicates share
        // NoteQuery::matches with the in-memory backend.
        let sql = if query.include_deleted {
            format!("SELECT {COLUMNS} FROM notes ORDER BY rowid")
        } else {
            format!("SELECT {COLUMNS} FROM notes WHERE deleted = 0 ORDER BY rowid")
        };
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map([], read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut notes = Vec::with_capacity(rows.len());
        for row in rows {
            let note = decode(row)?;
            if query.matches(&note) {
                notes.push(note);
            }
        }
        Ok(apply_page(notes, page))
    }

    fn count(&self, query: &NoteQuery) -> Result<u64> {
        Ok(self.find_many(query, None)?.len() as u64)
    }

    fn update(&self, note: &Note) -> Result<Note> {
        let rows_affected = self.conn().execute(
            "UPDATE notes SET content = ?1, tags = ?2, shared_with = ?3,
             updated_at = ?4, deleted = ?5 WHERE id = ?6",
            params![
                note.content,
                serde_json::to_string(&note.tags)?,
                serde_json::to_string(&note.shared_with)?,
                datetime_to_timestamp(&note.updated_at),
                note.deleted,
                note.id.as_str(),
            ],
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("Note not found: {}", note.id)));
        }

        Ok(note.clone())
    }

    fn mark_deleted(&self, id: &NoteId) -> Result<()> {
        let rows_affected = self.conn().execute(
            "UPDATE notes SET deleted = 1 WHERE id = ?1",
            params![id.as_str()],
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("Note not found: {}", id)));
        }

        Ok(())
    }

    fn delete(&self, id: &NoteId) -> Result<()> {
        let rows_affected = self
            .conn()
            .execute("DELETE FROM notes WHERE id = ?1", params![id.as_str()])?;

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("Note not found: {}", id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use tempfile::tempdir;

    fn setup_test_repo() -> (tempfile::TempDir, SqliteNoteRepository) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::new(&db_path);
        let conn = db.create().unwrap();
        (dir, SqliteNoteRepository::new(conn))
    }

    fn note(content: &str, tags: &[&str]) -> Note {
        Note::new(content.to_string(), tags.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn test_create_and_find() {
        let (_dir, repo) = setup_test_repo();
        let stored = repo.create(note("Test Note", &["work", "urgent"])).unwrap();

        let retrieved = repo.find_by_id(&stored.id).unwrap().unwrap();
        assert_eq!(retrieved.content, "Test Note");
        assert_eq!(retrieved.tags, vec!["work", "urgent"]);
        assert!(retrieved.shared_with.is_empty());
        assert!(!retrieved.deleted);
    }

    #[test]
    fn test_find_by_id_absent() {
        let (_dir, repo) = setup_test_repo();
        let missing = repo.find_by_id(&NoteId::from("nope")).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_find_many_insertion_order() {
        let (_dir, repo) = setup_test_repo();
        let first = repo.create(note("first", &[])).unwrap();
        let second = repo.create(note("second", &[])).unwrap();

        let all = repo.find_many(&NoteQuery::default(), None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[1].id, second.id);
    }

    #[test]
    fn test_mark_deleted_hides_from_queries_but_not_lookup() {
        let (_dir, repo) = setup_test_repo();
        let stored = repo.create(note("gone soon", &[])).unwrap();

        repo.mark_deleted(&stored.id).unwrap();
        // Idempotent
        repo.mark_deleted(&stored.id).unwrap();

        assert!(repo.find_many(&NoteQuery::default(), None).unwrap().is_empty());
        assert_eq!(repo.count(&NoteQuery::default()).unwrap(), 0);

        let direct = repo.find_by_id(&stored.id).unwrap().unwrap();
        assert!(direct.deleted);
    }

    #[test]
    fn test_delete_removes_row() {
        let (_dir, repo) = setup_test_repo();
        let stored = repo.create(note("to purge", &[])).unwrap();

        repo.delete(&stored.id).unwrap();

        assert!(repo.find_by_id(&stored.id).unwrap().is_none());
        assert!(matches!(
            repo.delete(&stored.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_update_missing_note() {
        let (_dir, repo) = setup_test_repo();
        let unsaved = note("never stored", &[]);
        assert!(matches!(repo.update(&unsaved), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_update_persists_shared_with() {
        let (_dir, repo) = setup_test_repo();
        let mut stored = repo.create(note("shared", &[])).unwrap();

        stored.shared_with.push("u1".to_string());
        stored.shared_with.push("u1".to_string());
        repo.update(&stored).unwrap();

        let retrieved = repo.find_by_id(&stored.id).unwrap().unwrap();
        assert_eq!(retrieved.shared_with, vec!["u1", "u1"]);
    }

    #[test]
    fn test_pagination_after_filtering() {
        let (_dir, repo) = setup_test_repo();
        for i in 0..5 {
            repo.create(note(&format!("note {i}"), &[])).unwrap();
        }
        let deleted = repo.create(note("deleted one", &[])).unwrap();
        repo.mark_deleted(&deleted.id).unwrap();

        let page = PageRequest::new(2, 2);
        let items = repo.find_many(&NoteQuery::default(), Some(&page)).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].content, "note 2");
        assert_eq!(items[1].content, "note 3");
    }
}
