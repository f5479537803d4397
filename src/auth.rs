//! Session gate: sign-in, sign-up and sign-out against the identity service.

use chatcore::auth::{PasswordCredentials, SignUpRequest};
use log::{info, warn};
use serde_json::Value;

use crate::client::Client;
use crate::error::ClientError;
use crate::http::HttpRequest;

pub use chatcore::auth::{AuthUser, Session, SignUpOutcome};

const AUTH_PATH: &str = "auth/v1";

pub struct Auth<'a> {
    client: &'a Client,
}

impl<'a> Auth<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn url(&self, path: &str) -> String {
        self.client.config.endpoint(&format!("{AUTH_PATH}/{path}"))
    }

    /// Signs in with email and password and stores the resulting session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        validate(email, password)?;

        let request = HttpRequest::post(self.url("token?grant_type=password"))
            .with_json(&PasswordCredentials { email, password })?;
        let response = self.client.send(self.client.authorize(request, None)).await?;
        let session: Session = response.json()?;

        info!("Signed in as {}", session.user.id);
        self.client.set_session(Some(session.clone())).await;
        Ok(session)
    }

    /// Creates an account. When the service returns a session right away it
    /// is stored; otherwise the account awaits email confirmation.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, ClientError> {
        validate(email, password)?;

        let request =
            HttpRequest::post(self.url("signup")).with_json(&SignUpRequest::new(email, password))?;
        let response = self.client.send(self.client.authorize(request, None)).await?;
        let outcome = SignUpOutcome::from_response(response.json::<Value>()?)?;

        match &outcome {
            SignUpOutcome::SignedIn(session) => {
                info!("Signed up and signed in as {}", session.user.id);
                self.client.set_session(Some(session.clone())).await;
            }
            SignUpOutcome::ConfirmationRequired => {
                info!("Signed up {email}; awaiting email confirmation");
            }
        }
        Ok(outcome)
    }

    /// Ends the session. The remote revoke is best effort; local state is
    /// always cleared.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        let Some(session) = self.client.session().await else {
            return Ok(());
        };

        let request = self
            .client
            .authorize(HttpRequest::post(self.url("logout")), Some(&session));
        if let Err(e) = self.client.send(request).await {
            warn!("Remote sign-out failed: {e}");
        }

        self.client.set_session(None).await;
        self.client.profile_cache.clear();
        info!("Signed out {}", session.user.id);
        Ok(())
    }
}

fn validate(email: &str, password: &str) -> Result<(), ClientError> {
    if email.trim().is_empty() {
        return Err(ClientError::MissingInput("email"));
    }
    if password.is_empty() {
        return Err(ClientError::MissingInput("password"));
    }
    Ok(())
}

impl Client {
    pub fn auth(&self) -> Auth<'_> {
        Auth::new(self)
    }
}
