mod embedded;

use embedded::migrations;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use std::{
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::models::{NewNote, Note, NotePatch};

macro_rules! note_columns {
    () => {
        "id, title, content, is_done, created_at"
    };
}

const INSERT_NOTE: &str = concat!(
    "INSERT INTO note (title, content, is_done, created_at) VALUES (?1, ?2, ?3, ?4) RETURNING ",
    note_columns!()
);
const SELECT_NOTE: &str = concat!("SELECT ", note_columns!(), " FROM note WHERE id = ?1");
const SELECT_NOTES: &str = concat!(
    "SELECT ",
    note_columns!(),
    " FROM note WHERE ?1 IS NULL OR is_done = ?1 ORDER BY created_at DESC, id DESC"
);
const UPDATE_NOTE: &str = concat!(
    "UPDATE note SET title = ?1, content = ?2, is_done = ?3 WHERE id = ?4 RETURNING ",
    note_columns!()
);
const DELETE_NOTE: &str = "DELETE FROM note WHERE id = ?1";

/// Process-wide handle to the SQLite database. Created once at startup and
/// shared with the service layer.
pub struct Database {
    conn: Mutex<Connection>,
}

/// One unit of work against the database. Holds the connection exclusively
/// until dropped, so it must not live across an `.await`.
pub struct Session<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, rusqlite::Error> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;

        tracing::info!("Opened database at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates the `note` table and its indexes if they do not exist yet.
    /// Safe to run on every boot.
    pub fn migrate(&self) -> Result<(), refinery::Error> {
        let mut conn = self.lock();
        let migrations_report = migrations::runner().run(&mut *conn)?;

        for migration in migrations_report.applied_migrations() {
            tracing::info!(
                "Migration applied: {} (version {})",
                migration.name(),
                migration.version()
            );
        }

        tracing::info!("Note schema is ready");

        Ok(())
    }

    pub fn session(&self) -> Session<'_> {
        Session { conn: self.lock() }
    }

    // A panic inside a session drops its open transaction, which rolls back,
    // so the connection is still consistent after poisoning.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovering database connection after a panicked session");
            PoisonError::into_inner(poisoned)
        })
    }
}

impl Session<'_> {
    pub fn insert_note(&mut self, note: NewNote) -> Result<Note, rusqlite::Error> {
        tracing::debug!(sql = INSERT_NOTE, "executing statement");

        let tx = self.conn.transaction()?;
        let created = tx.query_row(
            INSERT_NOTE,
            params![note.title, note.content, note.is_done, Utc::now()],
            note_from_row,
        )?;
        tx.commit()?;

        Ok(created)
    }

    pub fn get_note(&self, id: i64) -> Result<Option<Note>, rusqlite::Error> {
        tracing::debug!(sql = SELECT_NOTE, id, "executing statement");

        self.conn
            .query_row(SELECT_NOTE, [id], note_from_row)
            .optional()
    }

    /// Newest first. Notes sharing a timestamp fall back to insertion order,
    /// also newest first.
    pub fn list_notes(&self, is_done: Option<bool>) -> Result<Vec<Note>, rusqlite::Error> {
        tracing::debug!(sql = SELECT_NOTES, ?is_done, "executing statement");

        let mut stmt = self.conn.prepare(SELECT_NOTES)?;
        let notes = stmt
            .query_map([is_done], note_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    /// Returns `None` when no note has the given id.
    pub fn update_note(
        &mut self,
        id: i64,
        patch: NotePatch,
    ) -> Result<Option<Note>, rusqlite::Error> {
        let tx = self.conn.transaction()?;

        tracing::debug!(sql = SELECT_NOTE, id, "executing statement");
        let Some(mut note) = tx.query_row(SELECT_NOTE, [id], note_from_row).optional()? else {
            return Ok(None);
        };

        if patch.is_empty() {
            return Ok(Some(note));
        }

        note.apply(patch);

        tracing::debug!(sql = UPDATE_NOTE, id, "executing statement");
        let updated = tx.query_row(
            UPDATE_NOTE,
            params![note.title, note.content, note.is_done, note.id],
            note_from_row,
        )?;
        tx.commit()?;

        Ok(Some(updated))
    }

    /// Returns `false` when no note has the given id.
    pub fn delete_note(&mut self, id: i64) -> Result<bool, rusqlite::Error> {
        tracing::debug!(sql = DELETE_NOTE, id, "executing statement");

        let tx = self.conn.transaction()?;
        let rows = tx.execute(DELETE_NOTE, [id])?;
        tx.commit()?;

        Ok(rows == 1)
    }
}

fn note_from_row(row: &Row<'_>) -> Result<Note, rusqlite::Error> {
    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        is_done: row.get("is_done")?,
        created_at: row.get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrated() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn new_note(title: &str, is_done: bool) -> NewNote {
        NewNote {
            title: title.to_string(),
            content: format!("content of {title}"),
            is_done,
        }
    }

    #[test]
    fn migrate_is_idempotent() {
        let db = migrated();
        db.migrate().unwrap();

        let mut session = db.session();
        session.insert_note(new_note("a", false)).unwrap();
        assert_eq!(session.list_notes(None).unwrap().len(), 1);
    }

    #[test]
    fn insert_then_get_returns_same_row() {
        let db = migrated();
        let mut session = db.session();

        let created = session.insert_note(new_note("a", false)).unwrap();
        let fetched = session.get_note(created.id).unwrap();

        assert!(created.id > 0);
        assert_eq!(fetched, Some(created));
    }

    #[test]
    fn get_missing_note_is_none() {
        let db = migrated();
        let session = db.session();

        assert_eq!(session.get_note(99999).unwrap(), None);
    }

    #[test]
    fn list_is_newest_first_and_filters() {
        let db = migrated();
        let mut session = db.session();

        let first = session.insert_note(new_note("first", true)).unwrap();
        let second = session.insert_note(new_note("second", false)).unwrap();
        let third = session.insert_note(new_note("third", true)).unwrap();

        let all: Vec<i64> = session
            .list_notes(None)
            .unwrap()
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(all, vec![third.id, second.id, first.id]);

        let done: Vec<i64> = session
            .list_notes(Some(true))
            .unwrap()
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(done, vec![third.id, first.id]);

        let open: Vec<i64> = session
            .list_notes(Some(false))
            .unwrap()
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(open, vec![second.id]);
    }

    #[test]
    fn update_applies_patch_and_keeps_the_rest() {
        let db = migrated();
        let mut session = db.session();
        let created = session.insert_note(new_note("a", false)).unwrap();

        let updated = session
            .update_note(
                created.id,
                NotePatch {
                    is_done: Some(true),
                    ..NotePatch::default()
                },
            )
            .unwrap()
            .unwrap();

        assert!(updated.is_done);
        assert_eq!(updated.title, created.title);
        assert_eq!(updated.content, created.content);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(session.get_note(created.id).unwrap(), Some(updated));
    }

    #[test]
    fn empty_update_returns_note_unchanged() {
        let db = migrated();
        let mut session = db.session();
        let created = session.insert_note(new_note("a", true)).unwrap();

        let updated = session.update_note(created.id, NotePatch::default()).unwrap();

        assert_eq!(updated, Some(created));
    }

    #[test]
    fn update_missing_note_is_none() {
        let db = migrated();
        let mut session = db.session();

        let result = session.update_note(99999, NotePatch::default()).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn delete_removes_once() {
        let db = migrated();
        let mut session = db.session();
        let created = session.insert_note(new_note("a", false)).unwrap();

        assert!(session.delete_note(created.id).unwrap());
        assert_eq!(session.get_note(created.id).unwrap(), None);
        assert!(!session.delete_note(created.id).unwrap());
    }

    #[test]
    fn file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");

        let id = {
            let db = Database::open(&path).unwrap();
            db.migrate().unwrap();
            let mut session = db.session();
            session.insert_note(new_note("kept", false)).unwrap().id
        };

        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();
        let session = db.session();
        let note = session.get_note(id).unwrap().unwrap();

        assert_eq!(note.title, "kept");
    }

    #[test]
    fn session_recovers_after_a_panicked_session() {
        let db = migrated();

        let outcome = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let mut session = db.session();
                    session.insert_note(new_note("lost", false)).unwrap();
                    panic!("session dropped mid-request");
                })
                .join()
        });
        assert!(outcome.is_err());

        let mut session = db.session();
        let kept = session.insert_note(new_note("kept", false)).unwrap();
        let titles: Vec<String> = session
            .list_notes(None)
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();

        assert_eq!(titles, vec![kept.title, "lost".to_string()]);
    }
}
