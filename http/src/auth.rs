//! Sign-in, sign-up and sign-out.
//!
//! A successful sign-in persists the [`Session`] in device storage, where the
//! stores' effects pick up the bearer token. Signing out removes the session
//! and every cached snapshot belonging to the user.

use crate::client::{build_client, endpoint, execute, parse_base};
use crate::config::ClientConfig;
use crate::wire::{AuthReply, SignInBody, SignUpBody, accept};
use checklist_core::environment::{Clock, SystemClock};
use checklist_core::error::{ChecklistError, Result};
use checklist_core::session::{self, DeviceStorage, LIST_CACHE_PREFIX, Session, SessionToken, lists_cache_key};
use reqwest::{Client, Url};
use serde::Serialize;

/// Authentication client
#[derive(Debug, Clone)]
pub struct AuthClient<S, C = SystemClock> {
    client: Client,
    base: Url,
    storage: S,
    clock: C,
}

impl<S: DeviceStorage> AuthClient<S> {
    /// Create a client using the system clock
    ///
    /// # Errors
    ///
    /// Returns [`ChecklistError::Transport`] if the service URL is invalid.
    pub fn new(config: &ClientConfig, storage: S) -> Result<Self> {
        Self::with_clock(config, storage, SystemClock)
    }
}

impl<S: DeviceStorage, C: Clock> AuthClient<S, C> {
    /// Create a client with an explicit clock
    ///
    /// # Errors
    ///
    /// Returns [`ChecklistError::Transport`] if the service URL is invalid.
    pub fn with_clock(config: &ClientConfig, storage: S, clock: C) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            base: parse_base(&config.api_url)?,
            storage,
            clock,
        })
    }

    /// Signs in and persists the session.
    ///
    /// # Errors
    ///
    /// Transport and HTTP errors, [`ChecklistError::Rejected`] for
    /// `result: false`, [`ChecklistError::MissingPayload`] when the reply
    /// lacks the user or token, and storage failures.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<Session> {
        self.authenticate("signin", &SignInBody { username, password })
            .await
    }

    /// Creates an account, signs in and persists the session.
    ///
    /// # Errors
    ///
    /// Same as [`AuthClient::sign_in`].
    pub async fn sign_up(&self, username: &str, email: &str, password: &str) -> Result<Session> {
        self.authenticate(
            "signup",
            &SignUpBody {
                username,
                email,
                password,
            },
        )
        .await
    }

    /// The stored session, if any
    ///
    /// # Errors
    ///
    /// [`ChecklistError::NotAuthenticated`] when nobody is signed in.
    pub async fn current_session(&self) -> Result<Session> {
        session::load(&self.storage).await
    }

    /// Removes the session, then every cached snapshot.
    ///
    /// Signing out while signed out is not an error. Snapshots that cannot
    /// be removed are logged and left behind.
    ///
    /// # Errors
    ///
    /// Propagates storage failures while removing the session.
    pub async fn sign_out(&self) -> Result<()> {
        let user_id = session::load(&self.storage).await.ok().map(|current| current.user_id);
        session::clear(&self.storage).await?;

        let mut cached: Vec<String> = match self.storage.keys().await {
            Ok(keys) => keys
                .into_iter()
                .filter(|key| key.starts_with(LIST_CACHE_PREFIX))
                .collect(),
            Err(error) => {
                tracing::warn!(%error, "Failed to enumerate cached snapshots");
                Vec::new()
            },
        };
        cached.extend(user_id.as_ref().map(lists_cache_key));

        for key in &cached {
            if let Err(error) = self.storage.remove(key).await {
                tracing::warn!(%key, %error, "Failed to remove cached snapshot");
            }
        }

        if let Some(user_id) = user_id {
            tracing::info!(%user_id, "Signed out");
        }
        Ok(())
    }

    async fn authenticate<B: Serialize + Sync>(&self, path: &'static str, body: &B) -> Result<Session> {
        let url = endpoint(&self.base, &[path]);
        tracing::debug!(path = url.path(), "Authenticating");

        let reply: AuthReply = execute(self.client.post(url).json(body)).await?;
        accept(reply.result)?;
        let user = reply.user_info.ok_or(ChecklistError::MissingPayload("user"))?;
        let token = reply
            .token
            .filter(|token| !token.is_empty())
            .ok_or(ChecklistError::MissingPayload("token"))?;

        let session = Session {
            user_id: user.id,
            username: user.username,
            token: SessionToken::new(token),
            signed_in_at: self.clock.now(),
        };
        session::save(&self.storage, &session).await?;

        tracing::info!(user_id = %session.user_id, "Signed in");
        Ok(session)
    }
}
