//! Application façade tying the session, contacts, the active conversation,
//! the composer, reply suggestions and the call overlay together.

use std::sync::Arc;

use anyhow::Result;
use chatcore::types::{CallKind, Message, MessageRow, Profile, UserId};
use log::{info, warn};

use crate::auth::{Session, SignUpOutcome};
use crate::calls::{CallOverlay, CallSession};
use crate::client::Client;
use crate::composer::{ComposeError, Composer};
use crate::config::ClientConfig;
use crate::conversation::Conversation;
use crate::error::ClientError;
use crate::http::{HttpClient, UreqHttpClient};
use crate::realtime::{ChangeFeed, WebSocketFeed};
use crate::recorder::AudioClip;
use crate::suggest::{ReplySuggester, TextGenerator};

pub struct ChatApp {
    client: Arc<Client>,
    suggester: ReplySuggester,
    profile: Option<Profile>,
    contacts: Vec<Profile>,
    conversation: Option<Conversation>,
    composer: Option<Composer>,
    calls: CallOverlay,
}

impl ChatApp {
    pub fn builder() -> ChatAppBuilder {
        ChatAppBuilder::new()
    }

    pub fn client(&self) -> Arc<Client> {
        self.client.clone()
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, ClientError> {
        self.reset();
        self.client.auth().sign_in(email, password).await
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<SignUpOutcome, ClientError> {
        self.reset();
        self.client.auth().sign_up(email, password).await
    }

    /// Closes the active conversation and ends the session.
    pub async fn sign_out(&mut self) -> Result<(), ClientError> {
        self.reset();
        self.client.auth().sign_out().await
    }

    fn reset(&mut self) {
        self.conversation = None;
        self.composer = None;
        self.calls.end();
        self.contacts.clear();
        self.profile = None;
    }

    /// Loads the signed-in user's profile and contact list. The first contact
    /// is opened when no conversation is active yet.
    pub async fn load_contacts(&mut self) -> Result<&[Profile], ClientError> {
        self.load_contacts_selecting(None).await
    }

    /// Like [`load_contacts`](Self::load_contacts), but opens the contact
    /// named `username` instead of the first one.
    pub async fn load_contacts_selecting(
        &mut self,
        username: Option<&str>,
    ) -> Result<&[Profile], ClientError> {
        match self.client.contacts().current_profile().await {
            Ok(profile) => self.profile = Some(profile),
            Err(ClientError::NotLoggedIn) => return Err(ClientError::NotLoggedIn),
            Err(e) => warn!("Could not load own profile: {e}"),
        }

        self.contacts = self.client.contacts().list().await?;
        info!("Loaded {} contacts", self.contacts.len());

        let target = match username {
            Some(name) => Some(
                self.find_contact(name)
                    .map(|c| c.id.clone())
                    .ok_or_else(|| ClientError::UnknownContact(name.into()))?,
            ),
            None if self.conversation.is_none() => self.contacts.first().map(|c| c.id.clone()),
            None => None,
        };
        if let Some(id) = target {
            self.select_contact(&id).await?;
        }
        Ok(&self.contacts)
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn contacts(&self) -> &[Profile] {
        &self.contacts
    }

    pub fn find_contact(&self, username: &str) -> Option<&Profile> {
        self.contacts
            .iter()
            .find(|c| c.username.eq_ignore_ascii_case(username))
    }

    /// Makes `id` the active contact. The previous conversation's live feed is
    /// torn down before the new one is opened.
    pub async fn select_contact(&mut self, id: &UserId) -> Result<&Conversation, ClientError> {
        let contact = self
            .contacts
            .iter()
            .find(|c| &c.id == id)
            .cloned()
            .ok_or_else(|| ClientError::UnknownContact(id.clone()))?;

        if let Some(mut previous) = self.conversation.take() {
            previous.close();
        }
        self.composer = None;

        let conversation = Conversation::open(self.client.clone(), contact).await?;
        self.composer = Some(Composer::new(self.client.clone(), id.clone()));
        Ok(self.conversation.insert(conversation))
    }

    pub fn active_contact(&self) -> Option<&Profile> {
        self.conversation.as_ref().map(Conversation::contact)
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn conversation_mut(&mut self) -> Option<&mut Conversation> {
        self.conversation.as_mut()
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation
            .as_ref()
            .map(Conversation::messages)
            .unwrap_or_default()
    }

    /// Next live message of the active conversation; `None` if there is none
    /// or it is not live.
    pub async fn next_update(&mut self) -> Option<Message> {
        self.conversation.as_mut()?.next_update().await
    }

    pub fn composer(&self) -> Option<&Composer> {
        self.composer.as_ref()
    }

    pub fn draft(&self) -> &str {
        self.composer.as_ref().map(Composer::draft).unwrap_or_default()
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        if let Some(composer) = self.composer.as_mut() {
            composer.set_draft(text);
        }
    }

    fn active_composer(&mut self) -> Result<&mut Composer, ComposeError> {
        self.composer
            .as_mut()
            .ok_or(ComposeError::Client(ClientError::NoActiveContact))
    }

    /// Sends the current draft to the active contact.
    pub async fn send_draft(&mut self) -> Result<MessageRow, ComposeError> {
        self.active_composer()?.send_text().await
    }

    /// Replaces the draft with `text` and sends it.
    pub async fn send_text(&mut self, text: &str) -> Result<MessageRow, ComposeError> {
        let composer = self.active_composer()?;
        composer.set_draft(text);
        composer.send_text().await
    }

    pub async fn send_audio(&mut self, clip: AudioClip) -> Result<MessageRow, ComposeError> {
        self.active_composer()?.send_audio(clip).await
    }

    pub fn suggestions_configured(&self) -> bool {
        self.suggester.is_configured()
    }

    /// Asks for a reply suggestion for the active conversation and puts it in
    /// the draft.
    pub async fn suggest_reply(&mut self) -> String {
        let suggestion = self.suggester.suggest(self.messages()).await;
        self.set_draft(suggestion.clone());
        suggestion
    }

    pub fn start_call(&mut self, kind: CallKind) -> Result<&CallSession, ClientError> {
        let contact = self
            .active_contact()
            .cloned()
            .ok_or(ClientError::NoActiveContact)?;
        Ok(self.calls.start(kind, contact))
    }

    pub fn end_call(&mut self) -> Option<CallSession> {
        self.calls.end()
    }

    pub fn call(&self) -> Option<&CallSession> {
        self.calls.current()
    }
}

#[derive(Default)]
pub struct ChatAppBuilder {
    config: Option<ClientConfig>,
    http_client: Option<Arc<dyn HttpClient>>,
    feed: Option<Arc<dyn ChangeFeed>>,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl ChatAppBuilder {
    fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_http_client<H>(mut self, http_client: H) -> Self
    where
        H: HttpClient + 'static,
    {
        self.http_client = Some(Arc::new(http_client));
        self
    }

    /// Use a custom live feed instead of the realtime websocket.
    pub fn with_feed<F>(mut self, feed: F) -> Self
    where
        F: ChangeFeed + 'static,
    {
        self.feed = Some(Arc::new(feed));
        self
    }

    /// Use a custom text generator for reply suggestions. Without one, the
    /// configured API key (if any) selects the hosted generator.
    pub fn with_text_generator<G>(mut self, generator: G) -> Self
    where
        G: TextGenerator + 'static,
    {
        self.generator = Some(Arc::new(generator));
        self
    }

    /// Falls back to `ClientConfig::from_env`, the ureq HTTP client and the
    /// websocket feed for anything not set.
    pub fn build(self) -> Result<ChatApp> {
        let config = match self.config {
            Some(config) => config,
            None => ClientConfig::from_env()
                .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?,
        };

        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(UreqHttpClient::new()));
        let feed = self
            .feed
            .unwrap_or_else(|| Arc::new(WebSocketFeed::new(&config)));

        let suggester = match self.generator {
            Some(generator) => ReplySuggester::new(Some(generator), config.suggestion.clone()),
            None => ReplySuggester::from_config(config.suggestion.clone(), http_client.clone()),
        };

        info!("Creating client for {}", config.backend_url);
        let client = Client::new(config, http_client, feed);
        Ok(ChatApp {
            client,
            suggester,
            profile: None,
            contacts: Vec::new(),
            conversation: None,
            composer: None,
            calls: CallOverlay::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NOT_CONFIGURED_REPLY;
    use crate::realtime::LocalFeed;
    use crate::test_utils::{MockHttpClient, message_json, test_config};
    use serde_json::json;

    fn session_body(user_id: &str) -> String {
        json!({
            "access_token": format!("token-{user_id}"),
            "token_type": "bearer",
            "user": {"id": user_id, "email": format!("{user_id}@example.com")}
        })
        .to_string()
    }

    fn scripted_backend() -> MockHttpClient {
        let http = MockHttpClient::new();
        http.respond("POST", "/auth/v1/token", 200, session_body("A"));
        http.respond(
            "GET",
            "/rest/v1/profiles",
            200,
            json!([
                {"id": "B", "username": "bob", "avatar_url": null},
                {"id": "C", "username": "carol", "avatar_url": null}
            ])
            .to_string(),
        );
        http.respond(
            "GET",
            "id=eq.A",
            200,
            r#"{"id":"A","username":"alice","avatar_url":null}"#,
        );
        http.respond("GET", "/rest/v1/messages", 200, "[]");
        http
    }

    async fn signed_in_app(http: &MockHttpClient, feed: &LocalFeed) -> ChatApp {
        let mut app = ChatApp::builder()
            .with_config(test_config())
            .with_http_client(http.clone())
            .with_feed(feed.clone())
            .build()
            .expect("app builds");
        app.sign_in("alice@example.com", "pw").await.expect("sign in");
        app
    }

    #[tokio::test]
    async fn loading_contacts_selects_the_first_one() {
        let http = scripted_backend();
        let feed = LocalFeed::new();
        let mut app = signed_in_app(&http, &feed).await;

        let contacts = app.load_contacts().await.expect("contacts");
        assert_eq!(contacts.len(), 2);
        assert_eq!(app.profile().map(|p| p.username.as_str()), Some("alice"));
        assert_eq!(app.active_contact().map(|c| c.username.as_str()), Some("bob"));
        assert_eq!(feed.active_topics(), vec!["realtime:messages:A:B".to_string()]);
    }

    #[tokio::test]
    async fn switching_contacts_keeps_one_subscription() {
        let http = scripted_backend();
        let feed = LocalFeed::new();
        let mut app = signed_in_app(&http, &feed).await;
        app.load_contacts().await.expect("contacts");

        app.select_contact(&"C".into()).await.expect("select carol");
        app.select_contact(&"C".into()).await.expect("select carol again");
        assert_eq!(feed.active_topics(), vec!["realtime:messages:A:C".to_string()]);

        feed.publish("messages", message_json(1, "B", "A", "from bob", 1));
        feed.publish("messages", message_json(2, "C", "A", "from carol", 2));
        let update = app.next_update().await.expect("carol's message");
        assert_eq!(update.content.as_deref(), Some("from carol"));

        drop(app);
        assert_eq!(feed.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn named_contact_is_opened_without_the_first_one() {
        let http = scripted_backend();
        let feed = LocalFeed::new();
        let mut app = signed_in_app(&http, &feed).await;

        app.load_contacts_selecting(Some("Carol")).await.expect("contacts");
        assert_eq!(app.active_contact().map(|c| c.username.as_str()), Some("carol"));
        assert_eq!(feed.active_topics(), vec!["realtime:messages:A:C".to_string()]);
        assert_eq!(http.requests_matching("GET", "/rest/v1/messages").len(), 1);

        assert!(matches!(
            app.load_contacts_selecting(Some("zed")).await,
            Err(ClientError::UnknownContact(_))
        ));
    }

    #[tokio::test]
    async fn unknown_contact_is_rejected() {
        let http = scripted_backend();
        let feed = LocalFeed::new();
        let mut app = signed_in_app(&http, &feed).await;
        assert!(matches!(
            app.select_contact(&"Z".into()).await,
            Err(ClientError::UnknownContact(_))
        ));
    }

    #[tokio::test]
    async fn sending_needs_an_active_contact() {
        let http = scripted_backend();
        let feed = LocalFeed::new();
        let mut app = signed_in_app(&http, &feed).await;
        assert!(matches!(
            app.send_text("hello").await,
            Err(ComposeError::Client(ClientError::NoActiveContact))
        ));
        assert!(matches!(app.start_call(CallKind::Audio), Err(ClientError::NoActiveContact)));
    }

    #[tokio::test]
    async fn suggestion_fills_the_draft() {
        let http = scripted_backend();
        let feed = LocalFeed::new();
        let mut app = signed_in_app(&http, &feed).await;
        app.load_contacts().await.expect("contacts");

        assert!(!app.suggestions_configured());
        assert_eq!(app.suggest_reply().await, NOT_CONFIGURED_REPLY);
        assert_eq!(app.draft(), NOT_CONFIGURED_REPLY);
        assert!(http.requests_matching("POST", "generateContent").is_empty());
    }

    #[tokio::test]
    async fn call_overlay_follows_the_active_contact() {
        let http = scripted_backend();
        let feed = LocalFeed::new();
        let mut app = signed_in_app(&http, &feed).await;
        app.load_contacts().await.expect("contacts");

        let call = app.start_call(CallKind::Video).expect("call");
        assert_eq!(call.contact.username, "bob");
        assert_eq!(call.status_line(), "Video Call - Connecting...");
        assert!(app.end_call().is_some());
        assert!(app.call().is_none());
    }

    #[tokio::test]
    async fn sign_out_drops_the_conversation() {
        let http = scripted_backend();
        let feed = LocalFeed::new();
        let mut app = signed_in_app(&http, &feed).await;
        app.load_contacts().await.expect("contacts");
        assert_eq!(feed.active_subscriptions(), 1);

        app.sign_out().await.expect("sign out");
        assert_eq!(feed.active_subscriptions(), 0);
        assert!(app.contacts().is_empty());
        assert!(!app.client().is_logged_in().await);
    }
}
