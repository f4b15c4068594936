use notes_core::provider::sqlite::SqliteNotesProvider;
use notes_core::provider::{NotesProvider, ProviderError};
use notes_core::{NewNote, NoteUpdate, Timestamp};

fn provider() -> SqliteNotesProvider {
    SqliteNotesProvider::in_memory()
        .unwrap()
        .with_clock(|| Timestamp::from_epoch_seconds(1_700_000_000).unwrap())
}

#[test]
fn add_assigns_id_and_timestamps() {
    let provider = provider();
    let note = provider
        .add(
            &NewNote::new("Meeting notes")
                .with_content("agenda")
                .with_labels("Work, work ,Home"),
        )
        .unwrap();

    assert_eq!(note.id.len(), 32);
    assert_eq!(note.labels, "Work,Home");
    assert_eq!(note.created, note.modified);
    assert_eq!(
        note.created.unwrap().to_string(),
        "2023-11-14 22:13:20"
    );
    assert_eq!(provider.get(&note.id).unwrap(), Some(note));
}

#[test]
fn add_rejects_blank_title() {
    let err = provider().add(&NewNote::new("  ")).unwrap_err();
    assert!(matches!(err, ProviderError::Validation(_)));
}

#[test]
fn fetch_all_keeps_insertion_order() {
    let provider = provider();
    let ids = ["zeta", "alpha", "mid"]
        .into_iter()
        .map(|title| provider.add(&NewNote::new(title)).unwrap().id)
        .collect::<Vec<_>>();

    let fetched = provider
        .fetch_all()
        .unwrap()
        .into_iter()
        .map(|note| note.id)
        .collect::<Vec<_>>();
    assert_eq!(fetched, ids);
}

#[test]
fn update_changes_only_provided_fields() {
    let provider = provider();
    let note = provider
        .add(&NewNote::new("Draft").with_content("body").with_labels("a"))
        .unwrap();

    let updated = provider
        .update(
            &note.id,
            &NoteUpdate {
                labels: Some("b, B".to_string()),
                ..NoteUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.title, "Draft");
    assert_eq!(updated.content, "body");
    assert_eq!(updated.labels, "b");
}

#[test]
fn attachments_are_listed_per_note() {
    let provider = provider();
    let first = provider.add(&NewNote::new("with files")).unwrap();
    let second = provider.add(&NewNote::new("without files")).unwrap();
    provider
        .add_attachment(&first.id, "link", "https://example.com/minutes")
        .unwrap();

    let rows = provider.list_attachments(&first.id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Target"], "https://example.com/minutes");
    assert_eq!(rows[0]["Note"], first.id.as_str());
    assert!(provider.list_attachments(&second.id).unwrap().is_empty());

    let err = provider
        .add_attachment("missing", "file", "/tmp/x")
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(_)));
}

#[test]
fn file_backed_provider_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.sqlite3");

    let id = {
        let provider = SqliteNotesProvider::open(&path).unwrap();
        provider.add(&NewNote::new("persisted")).unwrap().id
    };

    let reopened = SqliteNotesProvider::open(&path).unwrap();
    assert_eq!(reopened.get(&id).unwrap().unwrap().title, "persisted");
    let stats = reopened.check_connection().unwrap();
    assert_eq!(stats["note_count"], "1");
    assert_eq!(stats["attachment_count"], "0");
}
