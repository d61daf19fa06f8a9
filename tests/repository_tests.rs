/// Loader tests against throwaway content directories.
use saga_engine::core::content::{ContentPaths, GameContent};
use saga_engine::core::repository::{EventRepository, ItemRepository, LoadError, NodeRepository};
use saga_engine::core::template::TemplateContext;
use saga_engine::core::validate::validate_content;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

fn event_ron(id: &str, next: &str) -> String {
    format!(
        r#"Event(
    Id: "{id}",
    Name: "{id}",
    Description: "About {id}.",
    Options: [
        (DisplayText: "Go", ResolutionText: "Gone.", Order: 1, NextEventId: "{next}"),
    ],
)"#
    )
}

fn load(dir: &TempDir) -> Result<EventRepository, LoadError> {
    EventRepository::load_from_dir(dir.path(), &TemplateContext::default())
}

fn ids(repo: &EventRepository) -> Vec<&str> {
    repo.all().iter().map(|e| e.id.as_str()).collect()
}

#[test]
fn reload_replaces_every_event() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.ron", &event_ron("first", ""));
    write(dir.path(), "b.ron", &event_ron("second", "first"));
    let mut repo = load(&dir).unwrap();
    assert_eq!(ids(&repo), vec!["first", "second"]);

    fs::remove_file(dir.path().join("a.ron")).unwrap();
    fs::remove_file(dir.path().join("b.ron")).unwrap();
    write(dir.path(), "c.ron", &event_ron("third", ""));
    repo.reload(dir.path(), &TemplateContext::default()).unwrap();

    assert_eq!(ids(&repo), vec!["third"]);
    assert!(repo.try_get_by_id("first").is_none());
    assert!(repo.try_get_by_id("second").is_none());
}

#[test]
fn failed_reload_keeps_previous_events() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.ron", &event_ron("first", ""));
    let mut repo = load(&dir).unwrap();

    write(dir.path(), "b.ron", "Event(Id: ");
    let err = repo.reload(dir.path(), &TemplateContext::default()).unwrap_err();
    assert!(matches!(err, LoadError::Syntax { .. }), "{err}");
    assert_eq!(ids(&repo), vec!["first"]);
}

#[test]
fn failed_content_reload_keeps_previous_content() {
    let root = tempfile::tempdir().unwrap();
    let events = root.path().join("events");
    fs::create_dir(&events).unwrap();
    write(&events, "a.ron", &event_ron("first", ""));
    let mut content = GameContent::builder()
        .paths(ContentPaths::from_root(root.path()))
        .build()
        .unwrap();

    write(&events, "b.ron", &event_ron("second", "missing"));
    assert!(content.reload().is_err());
    assert_eq!(ids(content.events()), vec!["first"]);

    fs::remove_file(events.join("b.ron")).unwrap();
    write(&events, "c.ron", &event_ron("third", "first"));
    content.reload().unwrap();
    assert_eq!(ids(content.events()), vec!["first", "third"]);
}

#[test]
fn missing_field_names_file_and_field() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "nameless.ron", r#"Event(Id: "x", Description: "d")"#);
    match load(&dir).unwrap_err() {
        LoadError::MissingField { path, field } => {
            assert!(path.ends_with("nameless.ron"));
            assert_eq!(field, "Name");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn blank_required_field_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "blank.ron", r#"Event(Id: "x", Name: "X", Description: "   ")"#);
    let err = load(&dir).unwrap_err();
    assert!(matches!(err, LoadError::EmptyField { field: "Description", .. }), "{err}");
}

#[test]
fn unknown_fields_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "colour.ron",
        r#"Event(Id: "x", Name: "X", Description: "d", Colour: "red")"#,
    );
    assert!(matches!(load(&dir).unwrap_err(), LoadError::Syntax { .. }));
}

#[test]
fn duplicate_ids_across_files_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.ron", &event_ron("same", ""));
    write(dir.path(), "b.ron", &event_ron("same", ""));
    match load(&dir).unwrap_err() {
        LoadError::DuplicateId { kind, id, path } => {
            assert_eq!(kind, "event");
            assert_eq!(id, "same");
            assert!(path.unwrap().ends_with("b.ron"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dangling_chain_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.ron", &event_ron("first", "nowhere"));
    let err = load(&dir).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Event 'first' option 1: NextEventId 'nowhere' does not match any loaded event."
    );
}

#[test]
fn vocabulary_errors_carry_suggestions() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "typo.ron",
        r#"Event(
    Id: "typo",
    Name: "Typo",
    Description: "d",
    Options: [(DisplayText: "Go", ResolutionText: "Gone.", Order: 1, Conditions: ["feat:2", "strength:+3"])],
)"#,
    );
    let message = load(&dir).unwrap_err().to_string();
    assert!(message.contains("Event 'typo' option 1: unknown condition key 'feat' in Conditions."));
    assert!(message.contains("Did you mean 'feats'?"));
    assert!(message.contains("Use 'strength:3' instead."));
}

#[test]
fn missing_directory_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let err = EventRepository::load_from_dir(missing, &TemplateContext::default()).unwrap_err();
    assert!(matches!(err, LoadError::MissingDirectory(_)));
}

#[test]
fn non_ron_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.ron", &event_ron("first", ""));
    write(dir.path(), "a.ron.bak", "not content");
    write(dir.path(), "README.md", "# events");
    assert_eq!(ids(&load(&dir).unwrap()), vec!["first"]);
}

#[test]
fn items_and_nodes_load_from_dirs() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "horn.ron",
        r#"Item(Id: "horn", Name: "Horn", Description: "Loud.", ConsumableCharges: 1, EffectsOnUse: ["honor:+1"])"#,
    );
    let items = ItemRepository::load_from_dir(dir.path()).unwrap();
    assert_eq!(items.get_by_id("horn").unwrap().remaining_charges, Some(1));

    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "a.ron",
        r#"Node(Kind: "village", Name: "Village", Description: "d", PossibleNeighbours: {"swamp": 1.0})"#,
    );
    let err = NodeRepository::load_from_dir(dir.path()).unwrap_err();
    assert_eq!(err.to_string(), "Node 'village' lists unknown neighbour kind 'swamp'.");

    write(dir.path(), "b.ron", r#"Node(Kind: "village", Name: "Again", Description: "d")"#);
    write(dir.path(), "c.ron", r#"Node(Kind: "swamp", Name: "Swamp", Description: "d")"#);
    let err = NodeRepository::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, LoadError::DuplicateId { kind: "node", .. }), "{err}");
}

#[test]
fn validation_collects_every_problem() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "a.ron",
        r#"Event(
    Id: "a",
    Name: "A",
    Description: "d",
    Options: [(DisplayText: "Go", ResolutionText: "Gone.", Order: 1, Conditions: ["strength:+3", "feat:2"])],
)"#,
    );
    write(dir.path(), "b.ron", "Event(Id: ");
    write(
        dir.path(),
        "c.ron",
        r#"Event(
    Id: "c",
    Name: "C",
    Description: "d",
    Options: [(DisplayText: "Go", ResolutionText: "Gone.", Order: 1, Effects: ["item:ghost"], NextEventId: "nowhere")],
)"#,
    );
    write(dir.path(), "d.ron", &event_ron("c", ""));

    let paths = ContentPaths {
        events: dir.path().to_path_buf(),
        items: None,
        nodes: None,
    };
    let report = validate_content(&paths, &TemplateContext::default());
    let messages: Vec<&str> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(messages.len(), 6, "{report}");
    assert_eq!(report.events, 1);
    assert!(messages[0].contains("do not allow a '+' sign"));
    assert!(messages[1].contains("Did you mean 'feats'?"));
    assert!(messages[2].starts_with("malformed content"));
    assert_eq!(messages[3], "Duplicate event id 'c'.");
    assert_eq!(
        messages[4],
        "Event 'c' option 1: NextEventId 'nowhere' does not match any loaded event."
    );
    assert_eq!(
        messages[5],
        "Event 'c' option 1: GrantItem 'ghost' does not match any loaded item."
    );
    assert!(report.diagnostics[0].path.as_ref().unwrap().ends_with("a.ron"));
    assert!(!report.is_ok());
}

#[test]
fn validation_reports_every_blank_field_and_bad_entry_in_one_file() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "a.ron",
        r#"Event(
    Id: "raid",
    Name: " ",
    Description: "d",
    Options: [
        (DisplayText: "", ResolutionText: "Done.", Order: 1, Conditions: ["feat:2"]),
        (DisplayText: "  ", ResolutionText: "", Order: 2, Costs: ["gould:1"]),
    ],
)"#,
    );

    let paths = ContentPaths {
        events: dir.path().to_path_buf(),
        items: None,
        nodes: None,
    };
    let report = validate_content(&paths, &TemplateContext::default());
    let messages: Vec<&str> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(messages.len(), 6, "{report}");
    assert_eq!(messages[0], "required field 'Name' is empty.");
    assert_eq!(messages[1], "required field 'DisplayText' is empty.");
    assert_eq!(messages[2], "required field 'DisplayText' is empty.");
    assert_eq!(messages[3], "required field 'ResolutionText' is empty.");
    assert!(messages[4].contains("unknown condition key 'feat'"));
    assert!(messages[5].contains("'gould'"));
    assert_eq!(report.events, 0);

    // The loader still stops at the first problem.
    let err = load(&dir).unwrap_err();
    assert!(matches!(err, LoadError::EmptyField { field: "Name", .. }), "{err}");
}
