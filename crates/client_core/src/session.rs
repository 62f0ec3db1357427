//! Sign-in state: token decoding, persistence and logout teardown.

use std::sync::Arc;

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use shared::domain::Role;
use storage::Storage;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::{
    academic_year::AcademicYearContext,
    api::ResearchHubClient,
    error::{ClientError, Result},
    navigation::{nav_for, NavDescriptor},
    ClientEvent,
};

/// Claims the backend puts in its access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub sub: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub exp: u64,
}

/// Reads the claims of a backend token.
///
/// The signing key stays on the server, so the signature is not checked
/// here; expiry still is.
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;
    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    token: String,
    claims: TokenClaims,
}

impl AuthSession {
    pub fn from_token(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let claims = decode_claims(&token)?;
        Ok(Self { token, claims })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    pub fn role(&self) -> Role {
        self.claims.role
    }

    pub fn username(&self) -> &str {
        &self.claims.sub
    }

    /// Full name when the token has one, else the username.
    pub fn display_name(&self) -> &str {
        self.claims
            .full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.claims.sub)
    }

    pub fn nav(&self) -> &'static NavDescriptor {
        nav_for(self.role())
    }
}

pub struct SessionManager {
    client: Arc<ResearchHubClient>,
    storage: Storage,
    years: Arc<AcademicYearContext>,
    current: RwLock<Option<AuthSession>>,
    events: broadcast::Sender<ClientEvent>,
}

impl SessionManager {
    pub fn new(
        client: Arc<ResearchHubClient>,
        storage: Storage,
        years: Arc<AcademicYearContext>,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            client,
            storage,
            years,
            current: RwLock::new(None),
            events,
        }
    }

    pub fn client(&self) -> &Arc<ResearchHubClient> {
        &self.client
    }

    pub fn years(&self) -> &Arc<AcademicYearContext> {
        &self.years
    }

    pub async fn current(&self) -> Option<AuthSession> {
        self.current.read().await.clone()
    }

    /// Current session or [`ClientError::Unauthenticated`].
    pub async fn require(&self) -> Result<AuthSession> {
        self.current().await.ok_or(ClientError::Unauthenticated)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "username and password are required".to_string(),
            ));
        }

        let response = self.client.login(username.trim(), password).await?;
        let session = AuthSession::from_token(response.access_token)?;
        self.storage
            .set_auth_token(session.token())
            .await
            .map_err(ClientError::Storage)?;
        self.activate(session.clone()).await;

        info!(username = session.username(), role = %session.role(), "signed in");
        Ok(session)
    }

    /// Picks up a token persisted by an earlier run. A token that no longer
    /// decodes is removed and treated as signed out.
    pub async fn restore(&self) -> Result<Option<AuthSession>> {
        let Some(token) = self
            .storage
            .auth_token()
            .await
            .map_err(ClientError::Storage)?
        else {
            return Ok(None);
        };

        match AuthSession::from_token(token) {
            Ok(session) => {
                self.activate(session.clone()).await;
                Ok(Some(session))
            }
            Err(err) => {
                warn!(error = %err, "discarding stored token");
                self.storage
                    .clear_auth_token()
                    .await
                    .map_err(ClientError::Storage)?;
                Ok(None)
            }
        }
    }

    /// Drops the token everywhere and resets the academic-year context.
    /// The persisted year selection is kept for the next sign-in.
    pub async fn logout(&self) -> Result<()> {
        let previous = self.current.write().await.take();
        self.client.clear_token().await;
        self.years.teardown().await;
        self.storage
            .clear_auth_token()
            .await
            .map_err(ClientError::Storage)?;

        if let Some(session) = previous {
            info!(username = session.username(), "signed out");
        }
        let _ = self.events.send(ClientEvent::SignedOut);
        Ok(())
    }

    async fn activate(&self, session: AuthSession) {
        self.client.set_token(session.token()).await;
        let role = session.role();
        let username = session.username().to_string();
        *self.current.write().await = Some(session);
        let _ = self.events.send(ClientEvent::SignedIn { username, role });
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
