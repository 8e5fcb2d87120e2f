//! Credential sources for Google Cloud REST APIs
//!
//! Every Vertex AI / Discovery Engine call carries an OAuth bearer token.
//! The token is obtained lazily at request time, never at construction.
//!
//! [`ApplicationDefaultCredentials`] is the default source: it finds a
//! service-account key (`GOOGLE_APPLICATION_CREDENTIALS`), the gcloud ADC
//! file, or the metadata server of the VM / Cloud Run instance.

use async_trait::async_trait;
use gcp_auth::TokenProvider;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::config::EnvSource;

/// Environment variable holding a pre-minted access token
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_CLOUD_ACCESS_TOKEN";

/// Environment variable selecting the credential source (`adc` or `gcloud`)
pub const CREDENTIALS_ENV: &str = "TUTOR_CREDENTIALS";

/// OAuth scope covering Vertex AI and Discovery Engine
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// gcloud tokens live for one hour; refresh well before that
pub const GCLOUD_TOKEN_TTL: Duration = Duration::from_secs(45 * 60);

/// Errors raised while obtaining an access token
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token command could not be started
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The token command exited with a failure
    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The token command printed nothing
    #[error("No access token returned by '{0}'")]
    EmptyToken(String),

    /// Application-default credentials could not be found or used
    #[error("Application default credentials: {0}")]
    ApplicationDefault(#[from] gcp_auth::Error),
}

/// Produces OAuth bearer tokens for Google Cloud APIs
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Return a currently valid access token
    async fn access_token(&self) -> Result<String, AuthError>;

    /// Project the credentials belong to, when they name one
    async fn project_id(&self) -> Option<String> {
        None
    }

    /// Short label for logs
    fn name(&self) -> &'static str;
}

/// A fixed token, typically injected through the environment
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wrap an existing token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticToken").field(&"<redacted>").finish()
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, AuthError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Application-default credentials
///
/// Discovery runs once, on first use; the underlying provider caches and
/// refreshes its tokens.
#[derive(Default)]
pub struct ApplicationDefaultCredentials {
    provider: OnceCell<Arc<dyn TokenProvider>>,
}

impl ApplicationDefaultCredentials {
    /// Credentials discovered lazily from the environment
    pub fn new() -> Self {
        Self::default()
    }

    async fn provider(&self) -> Result<&Arc<dyn TokenProvider>, AuthError> {
        self.provider
            .get_or_try_init(|| async {
                debug!("Discovering application default credentials");
                Ok::<_, AuthError>(gcp_auth::provider().await?)
            })
            .await
    }
}

#[async_trait]
impl AccessTokenSource for ApplicationDefaultCredentials {
    async fn access_token(&self) -> Result<String, AuthError> {
        let token = self.provider().await?.token(&[CLOUD_PLATFORM_SCOPE]).await?;
        Ok(token.as_str().to_string())
    }

    async fn project_id(&self) -> Option<String> {
        let provider = match self.provider().await {
            Ok(provider) => provider,
            Err(e) => {
                warn!(error = %e, "No application default credentials to take a project from");
                return None;
            }
        };
        match provider.project_id().await {
            Ok(project) => Some(project.to_string()),
            Err(e) => {
                debug!(error = %e, "Credentials do not name a project");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "application-default"
    }
}

/// Application-default credentials through the gcloud CLI
///
/// Runs `gcloud auth print-access-token` on first use and caches the
/// result for [`GCLOUD_TOKEN_TTL`].
pub struct GcloudCliToken {
    program: String,
    ttl: Duration,
    cached: Mutex<Option<(String, Instant)>>,
}

impl GcloudCliToken {
    /// Use the `gcloud` binary found on `PATH`
    pub fn new() -> Self {
        Self::with_program("gcloud")
    }

    /// Use a specific gcloud executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ttl: GCLOUD_TOKEN_TTL,
            cached: Mutex::new(None),
        }
    }

    /// Keep a fetched token for `ttl` instead of the default
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    async fn fetch(&self) -> Result<String, AuthError> {
        let output = Command::new(&self.program)
            .args(["auth", "print-access-token"])
            .output()
            .await
            .map_err(|source| AuthError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AuthError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(AuthError::EmptyToken(self.program.clone()));
        }
        Ok(token)
    }
}

impl Default for GcloudCliToken {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccessTokenSource for GcloudCliToken {
    async fn access_token(&self) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some((token, minted_at)) = cached.as_ref() {
            if minted_at.elapsed() < self.ttl {
                return Ok(token.clone());
            }
        }

        debug!(program = %self.program, "Refreshing access token");
        let token = self.fetch().await?;
        *cached = Some((token.clone(), Instant::now()));
        Ok(token)
    }

    fn name(&self) -> &'static str {
        "gcloud"
    }
}

/// Pick the token source for this process
///
/// A token in `GOOGLE_CLOUD_ACCESS_TOKEN` wins. Otherwise `TUTOR_CREDENTIALS`
/// picks the source: `gcloud` shells out to the CLI, anything else (the
/// default, `adc`) uses application-default credentials.
pub fn token_source_from_env(env: &dyn EnvSource) -> Arc<dyn AccessTokenSource> {
    if let Some(token) = env.var(ACCESS_TOKEN_ENV) {
        return Arc::new(StaticToken::new(token));
    }
    match env.var(CREDENTIALS_ENV).as_deref().map(str::trim) {
        Some("gcloud") => Arc::new(GcloudCliToken::new()),
        Some(other) if other != "adc" => {
            warn!(value = other, "Unknown {CREDENTIALS_ENV} value, using application default credentials");
            Arc::new(ApplicationDefaultCredentials::new())
        }
        _ => Arc::new(ApplicationDefaultCredentials::new()),
    }
}
