//! Row select/insert against the hosted relational store.

use chatcore::query::Select;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::client::Client;
use crate::error::ClientError;
use crate::http::HttpRequest;

const REST_PATH: &str = "rest/v1";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

impl Client {
    fn rest_url(&self, path: &str) -> String {
        self.config.endpoint(&format!("{REST_PATH}/{path}"))
    }

    /// Runs a select and decodes every returned row.
    pub async fn select<T: DeserializeOwned>(&self, query: &Select) -> Result<Vec<T>, ClientError> {
        let session = self.require_session().await?;
        let request = HttpRequest::get(self.rest_url(&query.to_path()))
            .with_header("Accept", "application/json");
        let response = self.send(self.authorize(request, Some(&session))).await?;
        Ok(response.json()?)
    }

    /// Runs a select expected to match exactly one row.
    pub async fn select_one<T: DeserializeOwned>(&self, query: &Select) -> Result<T, ClientError> {
        let session = self.require_session().await?;
        let request =
            HttpRequest::get(self.rest_url(&query.to_path())).with_header("Accept", SINGLE_OBJECT);
        let response = self.send(self.authorize(request, Some(&session))).await?;
        Ok(response.json()?)
    }

    /// Inserts one row and returns it as stored.
    pub async fn insert<T, R>(&self, table: &str, row: &T) -> Result<R, ClientError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let session = self.require_session().await?;
        let request = HttpRequest::post(self.rest_url(table))
            .with_json(row)?
            .with_header("Prefer", "return=representation");
        let response = self.send(self.authorize(request, Some(&session))).await?;

        let mut rows: Vec<R> = response.json()?;
        if rows.is_empty() {
            return Err(ClientError::EmptyResponse(table.to_string()));
        }
        Ok(rows.swap_remove(0))
    }
}
