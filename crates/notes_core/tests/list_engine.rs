use notes_core::query::{
    list_notes, list_with, ListError, ListRequest, ListResult, SyntaxErrorKind,
};
use notes_core::{Note, Timestamp};

fn note(id: &str, title: &str, labels: &str) -> Note {
    let mut note = Note::new(id, title);
    note.labels = labels.to_string();
    note
}

fn at(seconds: i64) -> Option<Timestamp> {
    Timestamp::from_epoch_seconds(1_700_000_000 + seconds)
}

fn ids(result: &ListResult) -> Vec<&str> {
    result.results.iter().map(|note| note.id.as_str()).collect()
}

#[test]
fn meeting_without_archived_returns_only_the_first_note() {
    let records = vec![
        note("1", "Meeting notes", "Work"),
        note("2", "Grocery list", "Home"),
        note("3", "Team meeting", "Work,Archived"),
    ];
    let result = list_notes(&records, "meeting -label:archived", None, 50).unwrap();
    assert_eq!(ids(&result), vec!["1"]);
    assert_eq!(result.total_count, 1);
}

#[test]
fn total_count_ignores_the_limit() {
    let records = (0..60)
        .map(|i| {
            let labels = if i < 42 { "work" } else { "home" };
            note(&format!("n{i}"), "note", labels)
        })
        .collect::<Vec<_>>();

    let result = list_notes(&records, "label:work", None, 10).unwrap();
    assert_eq!(result.results.len(), 10);
    assert_eq!(result.total_count, 42);
    assert_eq!(ids(&result)[0], "n0");

    let none = list_notes(&records, "label:work", None, 0).unwrap();
    assert!(none.results.is_empty());
    assert_eq!(none.total_count, 42);
}

#[test]
fn empty_query_returns_every_record_in_provider_order() {
    let records = vec![note("b", "x", ""), note("a", "y", ""), note("c", "z", "")];
    let result = list_notes(&records, "", None, 50).unwrap();
    assert_eq!(ids(&result), vec!["b", "a", "c"]);
    assert_eq!(result.total_count, 3);
}

#[test]
fn sort_is_stable_in_both_directions() {
    let mut records = vec![
        note("first", "a", ""),
        note("second", "b", ""),
        note("third", "c", ""),
        note("fourth", "d", ""),
    ];
    records[0].modified = at(10);
    records[1].modified = at(10);
    records[2].modified = at(5);
    records[3].modified = at(20);
    for (index, record) in records.iter_mut().enumerate() {
        record.created = at(100 - index as i64);
    }

    let ascending = list_notes(&records, "", Some("modified"), 50).unwrap();
    assert_eq!(ids(&ascending), vec!["third", "first", "second", "fourth"]);

    let descending = list_notes(&records, "", Some("-modified"), 50).unwrap();
    assert_eq!(ids(&descending), vec!["fourth", "first", "second", "third"]);

    let by_created = list_notes(&records, "", Some("-created"), 50).unwrap();
    assert_eq!(ids(&by_created), vec!["first", "second", "third", "fourth"]);
}

#[test]
fn missing_timestamps_sort_first_when_ascending() {
    let mut records = vec![note("dated", "a", ""), note("undated", "b", "")];
    records[0].created = at(0);

    let result = list_notes(&records, "", Some("created"), 50).unwrap();
    assert_eq!(ids(&result), vec!["undated", "dated"]);
}

#[test]
fn syntax_errors_produce_no_results() {
    let records = vec![note("1", "work", "work")];
    for raw in ["label:work OR", "(unclosed", "\"unterminated"] {
        let err = list_notes(&records, raw, None, 50).unwrap_err();
        assert!(matches!(err, ListError::Syntax(_)), "{raw}");
    }
}

#[test]
fn unknown_sort_field_is_rejected() {
    let records = vec![note("1", "a", "")];
    let err = list_notes(&records, "", Some("-title"), 50).unwrap_err();
    assert_eq!(err, ListError::InvalidSort("-title".to_string()));
}

#[test]
fn repeated_requests_return_identical_results() {
    let records = vec![
        note("1", "alpha meeting", "Work"),
        note("2", "beta meeting", "Home"),
        note("3", "gamma", "Work"),
    ];
    let request = ListRequest::new("meeting OR label:work").with_limit(2);
    let first = list_with(&records, &request).unwrap();
    let second = list_with(&records, &request).unwrap();
    assert_eq!(first, second);
    assert_eq!(ids(&first), vec!["1", "2"]);
    assert_eq!(first.total_count, 3);
}

#[test]
fn list_result_serializes_with_flat_note_fields() {
    let mut record = note("1", "Meeting", "Work");
    record.created = at(0);
    let result = list_notes(&[record], "", None, 50).unwrap();

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["total_count"], 1);
    assert_eq!(value["results"][0]["ID"], "1");
    assert_eq!(value["results"][0]["Labels"], "Work");
    assert_eq!(value["results"][0]["Created"], "2023-11-14 22:13:20");
    assert!(value["results"][0]["Modified"].is_null());
}

#[test]
fn oversized_queries_fail_with_a_syntax_error() {
    let records = vec![note("1", "a", "")];

    let deep = format!("{}a{}", "(".repeat(5000), ")".repeat(5000));
    let long = vec!["a"; 20_000].join(" ");
    for query in [deep, long] {
        match list_notes(&records, &query, None, 50) {
            Err(ListError::Syntax(err)) => assert_eq!(err.kind, SyntaxErrorKind::TooComplex),
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }
}
