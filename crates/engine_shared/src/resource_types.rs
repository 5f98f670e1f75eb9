// crates/engine_shared/src/resource_types.rs
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Separates a resource type tag from the type-specific path: `file:data/hero.png`.
pub const LOCATION_SEPARATOR: char = ':';

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceEventKind {
    Update,
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    /// A storage was added to a group.
    Add { group: String, storage: String },
    /// A storage was removed from a group.
    Remove { group: String, storage: String },
    /// A watched resource changed on its backend.
    Update {
        group: String,
        name: String,
        location: String,
        time: SystemTime,
    },
}

impl ResourceEvent {
    pub fn kind(&self) -> ResourceEventKind {
        match self {
            ResourceEvent::Add { .. } => ResourceEventKind::Add,
            ResourceEvent::Remove { .. } => ResourceEventKind::Remove,
            ResourceEvent::Update { .. } => ResourceEventKind::Update,
        }
    }

    pub fn group(&self) -> &str {
        match self {
            ResourceEvent::Add { group, .. }
            | ResourceEvent::Remove { group, .. }
            | ResourceEvent::Update { group, .. } => group,
        }
    }
}

/// Builds `tag:path`.
pub fn make_location(tag: &str, path: &str) -> String {
    let mut location = String::with_capacity(tag.len() + path.len() + 1);
    location.push_str(tag);
    location.push(LOCATION_SEPARATOR);
    location.push_str(path);
    location
}
