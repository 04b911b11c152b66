pub mod error;

use std::fmt;
use std::sync::RwLock;
use std::time::SystemTime;

use tonic::Request;
use tracing::{debug, info, warn};

use crate::channel::EmployeeChannel;
use crate::employee_proto::TokenRequest;

use self::error::AuthError;

/// Username/password pair presented to the authentication endpoint.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An issued auth token and the instant it stops being valid.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at: SystemTime,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: SystemTime) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> SystemTime {
        self.expires_at
    }

    /// A credential is stale when it holds no token or `now` has reached its expiry.
    pub fn is_stale_at(&self, now: SystemTime) -> bool {
        self.token.is_empty() || now >= self.expires_at
    }

    /// The `Authorization` header value for this credential.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Holds the current [`Credential`] and decides when it must be refreshed.
///
/// Reads are cheap and never wait on a refresh in progress. Refreshes are serialized behind an
/// async gate. [`TokenCache::ensure`] re-checks the credential once it holds the gate, so callers
/// that queued behind a refresh reuse its result instead of authenticating again.
#[derive(Debug, Default)]
pub struct TokenCache {
    credential: RwLock<Option<Credential>>,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache with a credential issued out of band.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Whether a refresh is required before an authenticated call, measured against `now`.
    pub fn needs_refresh_at(&self, now: SystemTime) -> bool {
        self.current_at(now).is_none()
    }

    /// Whether a refresh is required before an authenticated call.
    ///
    /// Staleness is evaluated against the system clock on every call.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(SystemTime::now())
    }

    /// The held credential if it is usable at `now`.
    pub fn current_at(&self, now: SystemTime) -> Option<Credential> {
        self.credential
            .read()
            .expect("credential lock poisoned")
            .as_ref()
            .filter(|credential| !credential.is_stale_at(now))
            .cloned()
    }

    /// The held credential if it is usable right now.
    pub fn current(&self) -> Option<Credential> {
        self.current_at(SystemTime::now())
    }

    /// Drop the held credential, forcing the next authenticated call to refresh.
    pub fn invalidate(&self) {
        let previous = self
            .credential
            .write()
            .expect("credential lock poisoned")
            .take();
        if previous.is_some() {
            debug!("Credential invalidated");
        }
    }

    /// Return the held credential, refreshing it first if it is absent or stale.
    pub async fn ensure<C>(
        &self,
        channel: &C,
        credentials: &Credentials,
    ) -> Result<Credential, AuthError>
    where
        C: EmployeeChannel + ?Sized,
    {
        if let Some(credential) = self.current() {
            return Ok(credential);
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited on the gate.
        if let Some(credential) = self.current() {
            debug!("Reusing credential from concurrent refresh");
            return Ok(credential);
        }

        self.replace(channel, credentials).await
    }

    /// Authenticate and replace the held credential.
    ///
    /// On failure the previously held credential is left untouched.
    pub async fn refresh<C>(
        &self,
        channel: &C,
        credentials: &Credentials,
    ) -> Result<Credential, AuthError>
    where
        C: EmployeeChannel + ?Sized,
    {
        let _gate = self.refresh_gate.lock().await;
        self.replace(channel, credentials).await
    }

    /// Must be called with the refresh gate held.
    async fn replace<C>(
        &self,
        channel: &C,
        credentials: &Credentials,
    ) -> Result<Credential, AuthError>
    where
        C: EmployeeChannel + ?Sized,
    {
        let credential = authenticate(channel, credentials).await?;

        *self.credential.write().expect("credential lock poisoned") = Some(credential.clone());

        info!(
            username = %credentials.username,
            expires_at = ?credential.expires_at(),
            "Credential refreshed"
        );

        Ok(credential)
    }
}

async fn authenticate<C>(channel: &C, credentials: &Credentials) -> Result<Credential, AuthError>
where
    C: EmployeeChannel + ?Sized,
{
    debug!(username = %credentials.username, "Requesting token");

    let response = channel
        .create_token(Request::new(TokenRequest {
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        }))
        .await
        .inspect_err(|status| warn!(code = ?status.code(), "Token request failed"))?
        .into_inner();

    if !response.success || response.token.is_empty() {
        warn!(username = %credentials.username, "Token request rejected");
        return Err(AuthError::Rejected {
            username: credentials.username.clone(),
        });
    }

    let expiration = response.expiration.ok_or(AuthError::MissingExpiration)?;
    let expires_at = SystemTime::try_from(expiration)?;

    let credential = Credential::new(response.token, expires_at);
    if credential.is_stale_at(SystemTime::now()) {
        warn!(username = %credentials.username, ?expires_at, "Issued token already expired");
        return Err(AuthError::Expired { expires_at });
    }

    Ok(credential)
}
