use std::sync::{Arc, Mutex};

use chatcore::auth::{AuthUser, Session};

use crate::client::Client;
use crate::config::ClientConfig;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::realtime::LocalFeed;

pub const TEST_BACKEND: &str = "https://backend.test";

struct Route {
    method: String,
    fragment: String,
    response: Result<HttpResponse, String>,
}

/// Scripted HTTP client. Routes match on method and a URL fragment; the most
/// recently added matching route wins. Every request is recorded.
#[derive(Clone, Default)]
pub struct MockHttpClient {
    routes: Arc<Mutex<Vec<Route>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: &str, fragment: &str, status: u16, body: impl Into<String>) {
        self.routes.lock().expect("routes lock").push(Route {
            method: method.to_string(),
            fragment: fragment.to_string(),
            response: Ok(HttpResponse::new(status, body.into().into_bytes())),
        });
    }

    pub fn fail(&self, method: &str, fragment: &str, error: &str) {
        self.routes.lock().expect("routes lock").push(Route {
            method: method.to_string(),
            fragment: fragment.to_string(),
            response: Err(error.to_string()),
        });
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn requests_matching(&self, method: &str, fragment: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.url.contains(fragment))
            .collect()
    }
}

#[async_trait::async_trait]
impl HttpClient for MockHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, anyhow::Error> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());

        let routes = self.routes.lock().expect("routes lock");
        let route = routes
            .iter()
            .rev()
            .find(|r| r.method == request.method && request.url.contains(&r.fragment));
        match route {
            Some(Route {
                response: Ok(response),
                ..
            }) => Ok(response.clone()),
            Some(Route {
                response: Err(error),
                ..
            }) => Err(anyhow::anyhow!("{error}")),
            None => Ok(HttpResponse::new(
                404,
                format!(r#"{{"message":"no route for {} {}"}}"#, request.method, request.url),
            )),
        }
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig::new(TEST_BACKEND, "anon-key")
}

pub fn test_session(user_id: &str) -> Session {
    Session {
        access_token: format!("token-{user_id}"),
        refresh_token: None,
        expires_in: Some(3600),
        token_type: Some("bearer".to_string()),
        user: AuthUser {
            id: user_id.into(),
            email: Some(format!("{user_id}@example.com")),
        },
    }
}

pub fn test_client(http: &MockHttpClient) -> Arc<Client> {
    test_client_with_feed(http, &LocalFeed::new())
}

pub fn test_client_with_feed(http: &MockHttpClient, feed: &LocalFeed) -> Arc<Client> {
    Client::new(test_config(), Arc::new(http.clone()), Arc::new(feed.clone()))
}

pub async fn signed_in_client(http: &MockHttpClient, feed: &LocalFeed, user_id: &str) -> Arc<Client> {
    let client = test_client_with_feed(http, feed);
    client.set_session(Some(test_session(user_id))).await;
    client
}

/// JSON for a stored message row as the REST surface returns it.
pub fn message_json(id: i64, from: &str, to: &str, content: &str, secs: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "created_at": chrono::DateTime::from_timestamp(1_700_000_000 + secs, 0)
            .expect("valid timestamp")
            .to_rfc3339(),
        "content": content,
        "media_url": null,
        "sender_id": from,
        "receiver_id": to,
    })
}
