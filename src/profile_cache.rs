//! Session-scoped cache of display names keyed by user id.
//!
//! Filled from contact listings, joined history selects and single-row
//! lookups, and cleared on sign-out.

use chatcore::types::{Profile, UserId};
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct ProfileCache {
    names: DashMap<UserId, String>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &UserId) -> Option<String> {
        self.names.get(id).map(|name| name.value().clone())
    }

    pub fn insert(&self, id: UserId, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    pub fn seed<'a>(&self, profiles: impl IntoIterator<Item = &'a Profile>) {
        for profile in profiles {
            self.insert(profile.id.clone(), profile.username.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&self) {
        self.names.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_and_lookup() {
        let cache = ProfileCache::new();
        assert!(cache.get(&"u-1".into()).is_none());

        let profiles = [
            Profile {
                id: "u-1".into(),
                username: "alice".to_string(),
                avatar_url: None,
            },
            Profile {
                id: "u-2".into(),
                username: "bob".to_string(),
                avatar_url: None,
            },
        ];
        cache.seed(&profiles);
        assert_eq!(cache.get(&"u-2".into()).as_deref(), Some("bob"));
        assert_eq!(cache.len(), 2);

        cache.insert("u-2".into(), "robert");
        assert_eq!(cache.get(&"u-2".into()).as_deref(), Some("robert"));

        cache.clear();
        assert!(cache.is_empty());
    }
}
