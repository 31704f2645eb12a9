//! Developer records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::IdAllocator;

/// Identifier of a developer within a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeveloperId(i64);

impl DeveloperId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DeveloperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A team member tasks can be assigned to.
///
/// Unlike tasks, developers keep no history; setters are plain field writes
/// and empty names or positions are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Developer {
    id: DeveloperId,
    name: String,
    position: String,
}

impl Developer {
    /// Create a developer with a freshly allocated id.
    pub fn create(
        ids: &mut IdAllocator,
        name: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        Self::with_id(ids.next_developer_id(), name, position)
    }

    /// Rebuild a developer with a known id (used when loading a board).
    pub fn with_id(id: DeveloperId, name: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            position: position.into(),
        }
    }

    pub fn id(&self) -> DeveloperId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_position(&mut self, position: impl Into<String>) {
        self.position = position.into();
    }

    /// `name (position)`, or just the name when no position is set.
    pub fn display_label(&self) -> String {
        if self.position.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.position)
        }
    }
}
