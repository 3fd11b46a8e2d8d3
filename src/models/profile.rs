//! Profile reference embedded in posts, comments and like lists

use serde::{Deserialize, Serialize};

use super::ProfileId;

/// Fallback label for profiles that have not finished onboarding
const UNNAMED_PROFILE: &str = "Someone";

/// A lightweight reference to a user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRef {
    /// Profile identifier
    pub id: ProfileId,
    /// Display name (unset until onboarding completes)
    pub name: Option<String>,
    /// Avatar URL
    pub avatar_url: Option<String>,
}

impl ProfileRef {
    /// Create a profile reference with no name or avatar yet
    pub fn new(id: impl Into<ProfileId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            avatar_url: None,
        }
    }

    /// Name to show in lists, falling back when the profile is unnamed
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(UNNAMED_PROFILE)
    }

    /// Whether this profile still has to pick a name
    pub fn needs_onboarding(&self) -> bool {
        self.name.as_deref().is_none_or(|n| n.trim().is_empty())
    }
}
