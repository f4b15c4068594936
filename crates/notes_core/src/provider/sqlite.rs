//! Local SQLite notes backend.
//!
//! # Responsibility
//! - Persist notes and attachments in a migrated SQLite database.
//! - Assign ids and timestamps the way a remote backend would.
//!
//! # Invariants
//! - `fetch_all` returns notes in insertion order.
//! - `modified` never moves backwards, even if the clock does.
//! - Labels are stored normalized (trimmed, deduplicated).

use crate::db::{open_db, open_db_in_memory};
use crate::model::note::{NewNote, Note, NoteUpdate};
use crate::model::timestamp::Timestamp;
use crate::provider::{ConnectionStats, NotesProvider, ProviderError, ProviderResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::json;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const SQLITE_PROVIDER_ID: &str = "sqlite";

const NOTE_COLUMNS: &str = "id, title, content, labels, created_at, modified_at";

type Clock = Box<dyn Fn() -> Timestamp + Send + Sync>;

/// Notes provider backed by a local SQLite file.
pub struct SqliteNotesProvider {
    conn: Connection,
    clock: Clock,
    location: String,
}

impl SqliteNotesProvider {
    /// Opens (creating and migrating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let conn = open_db(&path)?;
        Ok(Self::from_connection(conn, path.display().to_string()))
    }

    /// Opens a fresh in-memory database.
    pub fn in_memory() -> ProviderResult<Self> {
        let conn = open_db_in_memory()?;
        Ok(Self::from_connection(conn, ":memory:".to_string()))
    }

    fn from_connection(conn: Connection, location: String) -> Self {
        Self {
            conn,
            clock: Box::new(Timestamp::now),
            location,
        }
    }

    /// Replaces the clock used for `created`/`modified`.
    pub fn with_clock(mut self, clock: impl Fn() -> Timestamp + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Attaches a file or link reference to an existing note.
    pub fn add_attachment(
        &self,
        note_id: &str,
        kind: &str,
        target: &str,
    ) -> ProviderResult<serde_json::Value> {
        if self.get(note_id)?.is_none() {
            return Err(ProviderError::NotFound(note_id.to_string()));
        }

        let id = Uuid::new_v4().simple().to_string();
        let now = (self.clock)();
        self.conn.execute(
            "INSERT INTO attachments (id, note_id, kind, target, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![id, note_id, kind, target, now.epoch_seconds()],
        )?;

        Ok(attachment_json(&id, note_id, kind, target, Some(now)))
    }

    fn count(&self, table: &str) -> ProviderResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {table};");
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }
}

impl NotesProvider for SqliteNotesProvider {
    fn provider_id(&self) -> &str {
        SQLITE_PROVIDER_ID
    }

    fn fetch_all(&self) -> ProviderResult<Vec<Note>> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes ORDER BY seq ASC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let notes = stmt
            .query_map([], map_note)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    fn get(&self, id: &str) -> ProviderResult<Option<Note>> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1;");
        Ok(self.conn.query_row(&sql, [id], map_note).optional()?)
    }

    fn add(&self, note: &NewNote) -> ProviderResult<Note> {
        let note = note.normalized()?;
        let id = Uuid::new_v4().simple().to_string();
        let now = (self.clock)();

        self.conn.execute(
            "INSERT INTO notes (id, title, content, labels, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5);",
            params![id, note.title, note.content, note.labels, now.epoch_seconds()],
        )?;

        Ok(Note {
            id,
            title: note.title,
            content: note.content,
            labels: note.labels,
            created: Some(now),
            modified: Some(now),
        })
    }

    fn update(&self, id: &str, update: &NoteUpdate) -> ProviderResult<Note> {
        let update = update.normalized()?;
        let now = (self.clock)();

        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = COALESCE(?2, title),
                content = COALESCE(?3, content),
                labels = COALESCE(?4, labels),
                modified_at = MAX(modified_at, ?5)
             WHERE id = ?1;",
            params![
                id,
                update.title,
                update.content,
                update.labels,
                now.epoch_seconds()
            ],
        )?;
        if changed == 0 {
            return Err(ProviderError::NotFound(id.to_string()));
        }

        self.get(id)?
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }

    fn list_attachments(&self, note_id: &str) -> ProviderResult<Vec<serde_json::Value>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, note_id, kind, target, created_at
             FROM attachments
             WHERE note_id = ?1
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let rows = stmt
            .query_map([note_id], |row| {
                let id: String = row.get("id")?;
                let note_id: String = row.get("note_id")?;
                let kind: String = row.get("kind")?;
                let target: String = row.get("target")?;
                let created: i64 = row.get("created_at")?;
                Ok(attachment_json(
                    &id,
                    &note_id,
                    &kind,
                    &target,
                    Timestamp::from_epoch_seconds(created),
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn describe(&self) -> ConnectionStats {
        ConnectionStats::from([("path".to_string(), self.location.clone())])
    }

    fn check_connection(&self) -> ProviderResult<ConnectionStats> {
        let mut stats = self.describe();
        stats.insert("note_count".to_string(), self.count("notes")?.to_string());
        stats.insert(
            "attachment_count".to_string(),
            self.count("attachments")?.to_string(),
        );
        Ok(stats)
    }
}

fn map_note(row: &Row<'_>) -> rusqlite::Result<Note> {
    let created: i64 = row.get("created_at")?;
    let modified: i64 = row.get("modified_at")?;
    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        labels: row.get("labels")?,
        created: Timestamp::from_epoch_seconds(created),
        modified: Timestamp::from_epoch_seconds(modified),
    })
}

fn attachment_json(
    id: &str,
    note_id: &str,
    kind: &str,
    target: &str,
    created: Option<Timestamp>,
) -> serde_json::Value {
    json!({
        "ID": id,
        "Note": note_id,
        "Kind": kind,
        "Target": target,
        "Created": created.map(|value| value.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::SqliteNotesProvider;
    use crate::model::note::{NewNote, NoteUpdate};
    use crate::model::timestamp::Timestamp;
    use crate::provider::{NotesProvider, ProviderError};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    fn provider_with_clock(start: i64) -> (SqliteNotesProvider, Arc<AtomicI64>) {
        let seconds = Arc::new(AtomicI64::new(start));
        let clock = Arc::clone(&seconds);
        let provider = SqliteNotesProvider::in_memory()
            .expect("in-memory db should open")
            .with_clock(move || {
                Timestamp::from_epoch_seconds(clock.load(Ordering::SeqCst))
                    .expect("test clock in range")
            });
        (provider, seconds)
    }

    #[test]
    fn modified_never_moves_backwards() {
        let (provider, clock) = provider_with_clock(1_700_000_000);
        let note = provider.add(&NewNote::new("draft")).unwrap();

        clock.store(1_600_000_000, Ordering::SeqCst);
        let update = NoteUpdate {
            content: Some("edited".to_string()),
            ..NoteUpdate::default()
        };
        let updated = provider.update(&note.id, &update).unwrap();

        assert_eq!(updated.content, "edited");
        assert_eq!(updated.modified, note.modified);
        assert_eq!(updated.created, note.created);
    }

    #[test]
    fn update_of_unknown_id_is_not_found() {
        let (provider, _) = provider_with_clock(1_700_000_000);
        let update = NoteUpdate {
            title: Some("x".to_string()),
            ..NoteUpdate::default()
        };
        let err = provider.update("missing", &update).unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(id) if id == "missing"));
    }
}
