use std::sync::{Arc, Weak};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::models::Seller;

use super::storage::{KeyValueStore, SessionStorage};

/// Shown when sign-in fails without an API-reported message
pub const SIGN_IN_FALLBACK: &str = "Unable to sign in. Please try again later.";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No seller is signed in")]
    NotSignedIn,

    #[error("Sign-in response did not include an access token")]
    MissingAccessToken,
}

/// Who is logged in.
///
/// `Restoring`, `Authenticating` and `SigningOut` are transient; outside
/// observers only see them through `is_loading`.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Restoring,
    Unauthenticated,
    Authenticating,
    Authenticated {
        seller: Seller,
        since: DateTime<Utc>,
    },
    SigningOut,
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            SessionState::Restoring | SessionState::Authenticating | SessionState::SigningOut
        )
    }

    pub fn seller(&self) -> Option<&Seller> {
        match self {
            SessionState::Authenticated { seller, .. } => Some(seller),
            _ => None,
        }
    }
}

struct SessionInner {
    api: ApiClient,
    storage: SessionStorage,
    state: RwLock<SessionState>,
}

/// Single source of truth for the signed-in seller.
///
/// Owns the API client: the client's unauthorized handler is registered at
/// construction and signs the session out. Cloning shares the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    pub fn new(base_url: &str, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        let inner = Arc::new_cyclic(|weak: &Weak<SessionInner>| {
            let weak = weak.clone();
            let api = ApiClient::builder(base_url)
                .on_unauthorized(move || {
                    let weak = weak.clone();
                    async move {
                        if let Some(inner) = weak.upgrade() {
                            inner.sign_out().await;
                        }
                    }
                    .boxed()
                })
                .build_with(http);

            SessionInner {
                api,
                storage: SessionStorage::new(store),
                state: RwLock::new(SessionState::Unauthenticated),
            }
        });

        Ok(Self { inner })
    }

    /// The client used for every request of this session
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub async fn state(&self) -> SessionState {
        self.inner.state.read().await.clone()
    }

    pub async fn current_seller(&self) -> Option<Seller> {
        self.inner.state.read().await.seller().cloned()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.state.read().await.seller().is_some()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.state.read().await.is_loading()
    }

    /// Restore the persisted session at start-up.
    ///
    /// Returns whether a session was restored. Storage failures degrade to
    /// an unauthenticated state.
    pub async fn restore_session(&self) -> bool {
        self.inner.set_state(SessionState::Restoring).await;

        match self.inner.storage.load() {
            Ok(Some((seller, token))) => {
                self.inner.api.set_token(token).await;
                info!(seller_id = %seller.id, "Session restored");
                self.inner
                    .set_state(SessionState::Authenticated {
                        seller,
                        since: Utc::now(),
                    })
                    .await;
                true
            }
            Ok(None) => {
                debug!("No persisted session");
                self.inner.set_state(SessionState::Unauthenticated).await;
                false
            }
            Err(e) => {
                warn!(error = %e, "Failed to restore session");
                self.inner.set_state(SessionState::Unauthenticated).await;
                false
            }
        }
    }

    /// Exchange credentials for a token, load the seller profile and persist
    /// both. On failure nothing is persisted and the session is left
    /// unauthenticated.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Seller> {
        self.inner.set_state(SessionState::Authenticating).await;

        match self.try_sign_in(email, password).await {
            Ok((seller, token)) => {
                info!(seller_id = %seller.id, "Signed in");
                debug!(token_len = token.len(), "Access token stored");
                self.inner
                    .set_state(SessionState::Authenticated {
                        seller: seller.clone(),
                        since: Utc::now(),
                    })
                    .await;
                Ok(seller)
            }
            Err(e) => {
                warn!(error = %e, "Sign-in failed");
                self.inner.api.clear_token().await;
                self.inner.set_state(SessionState::Unauthenticated).await;
                Err(e)
            }
        }
    }

    async fn try_sign_in(&self, email: &str, password: &str) -> Result<(Seller, String)> {
        let token = self
            .inner
            .api
            .create_session(email, password)
            .await
            .context("Failed to create session")?
            .ok_or(SessionError::MissingAccessToken)?;

        self.inner.api.set_token(token.clone()).await;

        let seller = self
            .inner
            .api
            .fetch_current_seller()
            .await
            .context("Failed to load seller profile")?;

        self.inner
            .storage
            .save(&seller, &token)
            .context("Failed to persist session")?;

        Ok((seller, token))
    }

    /// End the session locally and notify the API (best-effort)
    pub async fn sign_out(&self) {
        self.inner.sign_out().await;
    }

    /// Replace the signed-in seller (after a profile update) and re-persist it.
    /// The token is untouched.
    pub async fn update_seller_logged(&self, seller: Seller) -> Result<()> {
        let mut state = self.inner.state.write().await;
        let since = match &*state {
            SessionState::Authenticated { since, .. } => *since,
            _ => return Err(SessionError::NotSignedIn.into()),
        };

        self.inner
            .storage
            .save_seller(&seller)
            .context("Failed to persist updated seller")?;

        debug!(seller_id = %seller.id, "Seller updated");
        *state = SessionState::Authenticated { seller, since };
        Ok(())
    }
}

impl SessionInner {
    async fn set_state(&self, state: SessionState) {
        *self.state.write().await = state;
    }

    async fn sign_out(&self) {
        self.set_state(SessionState::SigningOut).await;

        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }

        let token = self.api.token().await;
        self.api.clear_token().await;
        self.set_state(SessionState::Unauthenticated).await;
        info!("Signed out");

        if let Err(e) = self.api.end_session(token.as_deref()).await {
            debug!(error = %e, "Remote sign-out failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::user_message;
    use crate::auth::storage::{MemoryStore, SELLER_KEY, TOKEN_KEY};

    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn seller_json() -> serde_json::Value {
        serde_json::json!({
            "id": "s-1",
            "name": "Ana",
            "phone": "11987654321",
            "email": "ana@example.com",
            "avatar": null
        })
    }

    fn seller() -> Seller {
        serde_json::from_value(seller_json()).unwrap()
    }

    async fn mount_sign_out(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/sign-out"))
            .respond_with(ResponseTemplate::new(204))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_restore_with_persisted_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"products": []})))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        SessionStorage::new(store.clone()).save(&seller(), "tok-1").unwrap();

        let session = SessionManager::new(&server.uri(), store).unwrap();
        assert!(session.restore_session().await);
        assert!(session.is_authenticated().await);
        assert!(!session.is_loading().await);
        assert_eq!(session.current_seller().await, Some(seller()));
        assert_eq!(session.api().token().await.as_deref(), Some("tok-1"));

        session.api().fetch_products().await.unwrap();
    }

    #[tokio::test]
    async fn test_restore_without_persisted_session() {
        let session = SessionManager::new("http://localhost:3333", Arc::new(MemoryStore::new())).unwrap();
        assert!(!session.restore_session().await);
        assert_eq!(session.state().await, SessionState::Unauthenticated);
        assert!(session.api().token().await.is_none());
    }

    #[tokio::test]
    async fn test_restore_with_only_token() {
        let store = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, "tok-1").unwrap();

        let session = SessionManager::new("http://localhost:3333", store.clone()).unwrap();
        assert!(!session.restore_session().await);
        assert!(session.api().token().await.is_none());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_in_persists_seller_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sellers/sessions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"accessToken": "tok-1"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sellers/me"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"seller": seller_json()})))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::new(&server.uri(), store.clone()).unwrap();

        let signed_in = session.sign_in("ana@example.com", "123").await.unwrap();
        assert_eq!(signed_in, seller());
        assert!(session.is_authenticated().await);
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("tok-1"));
        assert!(store.get(SELLER_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rejected_sign_in_persists_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sellers/sessions"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(serde_json::json!({"message": "Invalid credentials."})),
            )
            .mount(&server)
            .await;
        mount_sign_out(&server).await;

        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::new(&server.uri(), store.clone()).unwrap();

        let err = session.sign_in("ana@example.com", "wrong").await.unwrap_err();
        assert_eq!(user_message(&err, SIGN_IN_FALLBACK), "Invalid credentials.");
        assert_eq!(session.state().await, SessionState::Unauthenticated);
        assert!(session.api().token().await.is_none());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(SELLER_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_in_profile_failure_clears_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sellers/sessions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"accessToken": "tok-1"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sellers/me"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::new(&server.uri(), store.clone()).unwrap();

        let err = session.sign_in("ana@example.com", "123").await.unwrap_err();
        assert_eq!(user_message(&err, SIGN_IN_FALLBACK), SIGN_IN_FALLBACK);
        assert!(session.api().token().await.is_none());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_in_without_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sellers/sessions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let session = SessionManager::new(&server.uri(), Arc::new(MemoryStore::new())).unwrap();
        let err = session.sign_in("ana@example.com", "123").await.unwrap_err();
        assert!(err.downcast_ref::<SessionError>().is_some());
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_unauthorized_response_signs_out_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/sign-out"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        SessionStorage::new(store.clone()).save(&seller(), "tok-1").unwrap();
        let session = SessionManager::new(&server.uri(), store.clone()).unwrap();
        assert!(session.restore_session().await);

        assert!(session.api().fetch_products().await.is_err());

        assert!(!session.is_authenticated().await);
        assert!(session.api().token().await.is_none());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(SELLER_KEY).unwrap(), None);
        // MockServer verifies the single sign-out call on drop
    }

    #[tokio::test]
    async fn test_sign_out_is_best_effort() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sign-out"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        SessionStorage::new(store.clone()).save(&seller(), "tok-1").unwrap();
        let session = SessionManager::new(&server.uri(), store.clone()).unwrap();
        session.restore_session().await;

        session.sign_out().await;
        assert_eq!(session.state().await, SessionState::Unauthenticated);
        assert_eq!(store.get(SELLER_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_seller_logged() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::new("http://localhost:3333", store.clone()).unwrap();

        let err = session.update_seller_logged(seller()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<SessionError>(), Some(SessionError::NotSignedIn)));
        assert_eq!(store.get(SELLER_KEY).unwrap(), None);

        SessionStorage::new(store.clone()).save(&seller(), "tok-1").unwrap();
        session.restore_session().await;

        let mut updated = seller();
        updated.name = "Ana Souza".to_string();
        session.update_seller_logged(updated.clone()).await.unwrap();

        assert_eq!(session.current_seller().await, Some(updated));
        assert_eq!(session.api().token().await.as_deref(), Some("tok-1"));
        let (persisted, token) = SessionStorage::new(store).load().unwrap().unwrap();
        assert_eq!(persisted.name, "Ana Souza");
        assert_eq!(token, "tok-1");
    }

    #[test]
    fn test_transient_states_are_loading() {
        assert!(SessionState::Restoring.is_loading());
        assert!(SessionState::Authenticating.is_loading());
        assert!(SessionState::SigningOut.is_loading());
        assert!(!SessionState::Unauthenticated.is_loading());
        assert!(SessionState::Unauthenticated.seller().is_none());
    }
}
