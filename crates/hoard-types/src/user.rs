//! The caller of export operations.

use serde::{Deserialize, Serialize};

/// An authenticated user requesting exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: String,
    /// Permissions granted to this user.
    pub permissions: Vec<String>,
}

impl User {
    /// Creates a user with the given permissions.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        permissions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if the user was granted `permission`.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}
