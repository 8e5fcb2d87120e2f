use crate::{RetrievalError, Result};
use agent_utils::AccessTokenSource;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated JSON client shared by the Google Cloud collaborators
#[derive(Clone)]
pub struct GoogleApiClient {
    http: Client,
    credentials: Arc<dyn AccessTokenSource>,
    project: String,
}

impl GoogleApiClient {
    /// Client for `project`, authorized by `credentials`
    pub fn new(project: impl Into<String>, credentials: Arc<dyn AccessTokenSource>) -> Result<Self> {
        Self::with_timeout(project, credentials, DEFAULT_TIMEOUT)
    }

    /// Same as [`GoogleApiClient::new`] with a request timeout
    pub fn with_timeout(
        project: impl Into<String>,
        credentials: Arc<dyn AccessTokenSource>,
        timeout: Duration,
    ) -> Result<Self> {
        let project = project.into();
        if project.trim().is_empty() {
            return Err(RetrievalError::Configuration(
                "a Google Cloud project is required".to_string(),
            ));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            credentials,
            project,
        })
    }

    /// Google Cloud project
    pub fn project(&self) -> &str {
        &self.project
    }

    /// POST `body` to `url` and decode the JSON answer
    pub(crate) async fn post_json<B, T>(&self, service: &str, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let token = self.credentials.access_token().await?;
        debug!(service, url, "Calling Google Cloud API");

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .header("x-goog-user-project", &self.project)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Http {
                service: service.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| RetrievalError::InvalidResponse(format!("{service}: {e}")))
    }
}

impl std::fmt::Debug for GoogleApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleApiClient")
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}
