use keystone_model::{event_type_for, Auditable, Entity, EventKind};
use keystone_types::EntityId;
use pretty_assertions::assert_eq;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct Note {
    id: EntityId,
    title: String,
    version: u64,
}

impl Entity for Note {
    const TYPE_NAME: &'static str = "Note";

    fn id(&self) -> EntityId {
        self.id
    }
}

impl Auditable for Note {
    fn version(&self) -> u64 {
        self.version
    }
}

#[test]
fn event_type_uses_type_name_and_action() {
    assert_eq!(event_type_for::<Note>(EventKind::Added), "Note.Added");
    assert_eq!(event_type_for::<Note>(EventKind::Updated), "Note.Updated");
    assert_eq!(event_type_for::<Note>(EventKind::Removed), "Note.Removed");
}

#[test]
fn parse_accepts_canonical_kinds() {
    assert_eq!(EventKind::parse("Note.Added"), Some(EventKind::Added));
    assert_eq!(EventKind::parse("Note.Updated"), Some(EventKind::Updated));
    assert_eq!(EventKind::parse("Removed"), Some(EventKind::Removed));
}

#[test]
fn parse_rejects_other_tags() {
    assert_eq!(EventKind::parse("Note.Archived"), None);
    assert_eq!(EventKind::parse("Note.added"), None);
    assert_eq!(EventKind::parse(""), None);
}

#[test]
fn parse_uses_last_segment_for_dotted_type_names() {
    assert_eq!(EventKind::parse("billing.Invoice.Removed"), Some(EventKind::Removed));
}

#[test]
fn default_snapshot_is_json() {
    let note = Note {
        id: EntityId::new(),
        title: "hello".into(),
        version: 3,
    };
    let snapshot = note.snapshot().unwrap();
    let value: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(value["title"], "hello");
    assert_eq!(value["version"], 3);
    assert_eq!(note.version(), 3);
}
