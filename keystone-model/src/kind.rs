use crate::Entity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle action carried in a domain event tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Added,
    Updated,
    Removed,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Added, EventKind::Updated, EventKind::Removed];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Added => "Added",
            EventKind::Updated => "Updated",
            EventKind::Removed => "Removed",
        }
    }

    /// Parses the action part of an event tag such as `"Todo.Added"`.
    /// Returns `None` for any tag whose action is not one of the three kinds.
    pub fn parse(event_type: &str) -> Option<Self> {
        let action = event_type.rsplit_once('.').map_or(event_type, |(_, a)| a);
        match action {
            "Added" => Some(EventKind::Added),
            "Updated" => Some(EventKind::Updated),
            "Removed" => Some(EventKind::Removed),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the `"{TypeName}.{Action}"` tag for an entity type.
pub fn event_type_for<T: Entity>(kind: EventKind) -> String {
    format!("{}.{}", T::TYPE_NAME, kind)
}
