//! Contact directory feature.
//!
//! Profiles live in the `profiles` table; every listing and lookup also warms
//! the client's profile cache.

use crate::client::Client;
use crate::error::ClientError;
use chatcore::query::Select;
use chatcore::types::{Profile, UserId};
use log::{debug, warn};
use serde::Deserialize;

pub const PROFILES_TABLE: &str = "profiles";

#[derive(Deserialize)]
struct Username {
    username: String,
}

pub struct Contacts<'a> {
    client: &'a Client,
}

impl<'a> Contacts<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Every profile except the signed-in user's own.
    pub async fn list(&self) -> Result<Vec<Profile>, ClientError> {
        let session = self.client.require_session().await?;
        let query = Select::from(PROFILES_TABLE).neq("id", session.user.id.as_str());
        let profiles: Vec<Profile> = self.client.select(&query).await?;

        debug!("list: loaded {} contacts", profiles.len());
        self.client.profile_cache.seed(&profiles);
        Ok(profiles)
    }

    /// The signed-in user's own profile.
    pub async fn current_profile(&self) -> Result<Profile, ClientError> {
        let session = self.client.require_session().await?;
        let query = Select::from(PROFILES_TABLE).eq("id", session.user.id.as_str());
        let profile: Profile = self.client.select_one(&query).await?;

        self.client
            .profile_cache
            .insert(profile.id.clone(), profile.username.clone());
        Ok(profile)
    }

    /// Looks up a single profile by id.
    pub async fn get(&self, id: &UserId) -> Result<Profile, ClientError> {
        let query = Select::from(PROFILES_TABLE).eq("id", id.as_str());
        let profile: Profile = self.client.select_one(&query).await?;
        self.client
            .profile_cache
            .insert(profile.id.clone(), profile.username.clone());
        Ok(profile)
    }

    /// Display name for `id`, served from the cache when possible.
    ///
    /// A failed lookup is not cached and falls back to the raw user id, so a
    /// message is never hidden just because its sender could not be resolved.
    pub async fn display_name(&self, id: &UserId) -> String {
        if let Some(name) = self.client.profile_cache.get(id) {
            return name;
        }

        let query = Select::from(PROFILES_TABLE)
            .columns("username")
            .eq("id", id.as_str());
        match self.client.select_one::<Username>(&query).await {
            Ok(Username { username }) => {
                self.client.profile_cache.insert(id.clone(), username.clone());
                username
            }
            Err(e) => {
                warn!("display_name: lookup for {id} failed: {e}");
                id.to_string()
            }
        }
    }
}

impl Client {
    pub fn contacts(&self) -> Contacts<'_> {
        Contacts::new(self)
    }

    /// See [`Contacts::display_name`].
    pub async fn display_name(&self, id: &UserId) -> String {
        self.contacts().display_name(id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::realtime::LocalFeed;
    use crate::test_utils::{MockHttpClient, signed_in_client};
    use serde_json::json;

    #[tokio::test]
    async fn list_excludes_self_and_seeds_cache() {
        let http = MockHttpClient::new();
        http.respond(
            "GET",
            "/rest/v1/profiles",
            200,
            json!([
                {"id": "u-2", "username": "bob", "avatar_url": null},
                {"id": "u-3", "username": "carol", "avatar_url": "https://cdn.test/c.png"}
            ])
            .to_string(),
        );
        let client = signed_in_client(&http, &LocalFeed::new(), "u-1").await;

        let contacts = client.contacts().list().await.expect("listing succeeds");
        assert_eq!(contacts.len(), 2);
        assert!(http.requests()[0].url.ends_with("&id=neq.u-1"));
        assert_eq!(client.profile_cache.get(&"u-3".into()).as_deref(), Some("carol"));
    }

    #[tokio::test]
    async fn current_profile_requests_single_object() {
        let http = MockHttpClient::new();
        http.respond(
            "GET",
            "id=eq.u-1",
            200,
            r#"{"id":"u-1","username":"alice","avatar_url":null}"#,
        );
        let client = signed_in_client(&http, &LocalFeed::new(), "u-1").await;

        let me = client.contacts().current_profile().await.expect("profile");
        assert_eq!(me.username, "alice");
        assert_eq!(
            http.requests()[0].header("Accept"),
            Some("application/vnd.pgrst.object+json")
        );
    }

    #[tokio::test]
    async fn display_name_is_looked_up_once() {
        let http = MockHttpClient::new();
        http.respond("GET", "id=eq.u-2", 200, r#"{"username":"bob"}"#);
        let client = signed_in_client(&http, &LocalFeed::new(), "u-1").await;

        assert_eq!(client.contacts().display_name(&"u-2".into()).await, "bob");
        assert_eq!(client.contacts().display_name(&"u-2".into()).await, "bob");
        assert_eq!(http.requests_matching("GET", "id=eq.u-2").len(), 1);
    }

    #[tokio::test]
    async fn failed_lookup_falls_back_to_id_and_retries_later() {
        let http = MockHttpClient::new();
        http.fail("GET", "id=eq.u-2", "timeout");
        let client = signed_in_client(&http, &LocalFeed::new(), "u-1").await;

        assert_eq!(client.contacts().display_name(&"u-2".into()).await, "u-2");
        assert!(client.profile_cache.get(&"u-2".into()).is_none());

        http.respond("GET", "id=eq.u-2", 200, r#"{"username":"bob"}"#);
        assert_eq!(client.contacts().display_name(&"u-2".into()).await, "bob");
    }
}
