use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a user as issued by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A directory entry for one user. Read-only to this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Returns the stored avatar, or a deterministic placeholder seeded by the user id.
    pub fn avatar_or_placeholder(&self, size: u32) -> String {
        match &self.avatar_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!("https://picsum.photos/seed/{}/{size}/{size}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_decodes_with_missing_avatar() {
        let profile: Profile =
            serde_json::from_str(r#"{"id":"u-1","username":"alice"}"#).expect("valid profile");
        assert_eq!(profile.id, UserId::from("u-1"));
        assert!(profile.avatar_url.is_none());
        assert_eq!(
            profile.avatar_or_placeholder(40),
            "https://picsum.photos/seed/u-1/40/40"
        );
    }

    #[test]
    fn stored_avatar_wins_over_placeholder() {
        let profile = Profile {
            id: "u-2".into(),
            username: "bob".to_string(),
            avatar_url: Some("https://cdn.test/bob.png".to_string()),
        };
        assert_eq!(profile.avatar_or_placeholder(128), "https://cdn.test/bob.png");
    }
}
