use std::sync::Arc;

use chatcore::auth::Session;
use chatcore::feed::ChangeFeed;
use chatcore::types::UserId;
use log::debug;
use tokio::sync::RwLock;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::{HttpClient, HttpRequest, HttpResponse, error_message};
use crate::profile_cache::ProfileCache;

/// Explicit context for every backend operation.
///
/// Holds the collaborators (HTTP client, change feed), the current session and
/// the session-scoped profile cache. Nothing here is global, so tests build a
/// client over mock collaborators.
pub struct Client {
    pub(crate) config: ClientConfig,

    /// HTTP client for auth, REST, storage and text generation requests
    pub http_client: Arc<dyn HttpClient>,
    pub(crate) feed: Arc<dyn ChangeFeed>,

    pub(crate) session: RwLock<Option<Session>>,
    pub(crate) profile_cache: ProfileCache,
}

impl Client {
    pub fn new(
        config: ClientConfig,
        http_client: Arc<dyn HttpClient>,
        feed: Arc<dyn ChangeFeed>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            http_client,
            feed,
            session: RwLock::new(None),
            profile_cache: ProfileCache::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn profile_cache(&self) -> &ProfileCache {
        &self.profile_cache
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.read().await.is_some()
    }

    pub async fn user_id(&self) -> Option<UserId> {
        self.session.read().await.as_ref().map(|s| s.user.id.clone())
    }

    /// The current session, or `NotLoggedIn` before any request is made.
    pub async fn require_session(&self) -> Result<Session, ClientError> {
        self.session().await.ok_or(ClientError::NotLoggedIn)
    }

    pub(crate) async fn set_session(&self, session: Option<Session>) {
        *self.session.write().await = session;
    }

    /// Adds the API key and bearer token every backend request carries.
    /// Without a session the anon key doubles as the bearer token.
    pub(crate) fn authorize(&self, request: HttpRequest, session: Option<&Session>) -> HttpRequest {
        let token = session
            .map(|s| s.access_token.as_str())
            .unwrap_or(self.config.anon_key.as_str());
        request
            .with_header("apikey", self.config.anon_key.clone())
            .with_header("Authorization", format!("Bearer {token}"))
    }

    /// Executes a request, turning non-2xx statuses into `ClientError::Service`.
    pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        debug!("--> {} {}", request.method, request.url);
        let response = self.http_client.execute(request).await?;
        debug!("<-- {} ({} bytes)", response.status_code, response.body.len());

        if !response.is_success() {
            return Err(ClientError::Service {
                status: response.status_code,
                message: error_message(&response),
            });
        }
        Ok(response)
    }
}
