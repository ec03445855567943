use keystone_types::{EntityId, TraceId};
use std::str::FromStr;

// ── EntityId ─────────────────────────────────────────────────────

#[test]
fn entity_id_unique() {
    assert_ne!(EntityId::new(), EntityId::new());
}

#[test]
fn entity_id_display_roundtrip() {
    let id = EntityId::new();
    let parsed: EntityId = id.to_string().parse().unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn entity_id_parse_invalid() {
    assert!(EntityId::parse("not-a-uuid").is_err());
    assert!(EntityId::from_str("").is_err());
}

#[test]
fn entity_id_serializes_transparently() {
    let id = EntityId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
}

#[test]
fn entity_ids_are_time_ordered() {
    let a = EntityId::new();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let b = EntityId::new();
    assert!(a < b);
}

// ── TraceId ──────────────────────────────────────────────────────

#[test]
fn trace_id_roundtrip() {
    let id = TraceId::new();
    let parsed: TraceId = id.to_string().parse().unwrap();
    assert_eq!(id, parsed);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn entity_id_from_any_uuid_bytes_displays_and_parses(bytes in any::<[u8; 16]>()) {
            let id = EntityId::from_uuid(uuid::Uuid::from_bytes(bytes));
            prop_assert_eq!(EntityId::parse(&id.to_string()).unwrap(), id);
        }
    }
}
