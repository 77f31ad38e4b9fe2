/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Mutations a list controller performs against its sibling set.
/// Used for log fields and notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutation {
    Create,
    Update,
    Delete,
    Reorder,
    TogglePublished,
    Refresh,
}

impl Mutation {
    /// Verb used in failure notices ("Failed to save stop").
    pub fn verb(&self) -> &'static str {
        match self {
            Mutation::Create => "save",
            Mutation::Update => "save",
            Mutation::Delete => "delete",
            Mutation::Reorder => "reorder",
            Mutation::TogglePublished => "update",
            Mutation::Refresh => "load",
        }
    }
}
