//! Session manager - single source of truth for "who is logged in"
//!
//! Owns the bearer token and the profile it resolves to for the lifetime of
//! the client, persists the credential across restarts, and broadcasts
//! every state transition to subscribers.

use crate::state::SessionState;
use crate::storage::FileTokenStore;
use crate::{SessionError, SessionResult};
use portfolio_core::{
    IdentityProvider, PortfolioConfig, PortfolioResult, TokenStore, UserProfile,
};
use portfolio_identity::{IdentityClient, IdentityClientConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Process-wide session manager
///
/// All mutating operations replace the `{token, profile}` pair atomically
/// and notify subscribers synchronously before returning. Overlapping
/// resolutions degrade to last-writer-wins: each attempt is tagged with a
/// generation, and a completion whose generation is no longer current is
/// discarded, so a resolution that lands after `logout` cannot resurrect
/// the session.
pub struct SessionManager {
    /// Remote identity collaborator
    identity: Arc<dyn IdentityProvider>,
    /// Durable slot for the bearer token
    tokens: Arc<dyn TokenStore>,
    /// Current session snapshot
    state: RwLock<SessionState>,
    /// Generation counter guarding stale resolutions
    generation: AtomicU64,
    /// State change broadcaster
    updates: broadcast::Sender<SessionState>,
}

impl SessionManager {
    /// Create a new session manager over the given collaborators
    pub fn new(identity: Arc<dyn IdentityProvider>, tokens: Arc<dyn TokenStore>) -> Self {
        // Buffer a handful of transitions for slow subscribers
        let (updates, _) = broadcast::channel::<SessionState>(16);

        Self {
            identity,
            tokens,
            state: RwLock::new(SessionState::uninitialized()),
            generation: AtomicU64::new(0),
            updates,
        }
    }

    /// Create a session manager wired to the real identity service and a
    /// file-backed token slot, per configuration
    pub fn from_config(config: &PortfolioConfig) -> PortfolioResult<Self> {
        let client = IdentityClient::new(IdentityClientConfig::from_service(&config.service))?;
        let store = FileTokenStore::new(config.storage.token_path());
        Ok(Self::new(Arc::new(client), Arc::new(store)))
    }

    /// Get a snapshot of the current session state
    pub fn state(&self) -> SessionState {
        self.state.read().unwrap().clone()
    }

    /// Whether a validated token and profile are present
    pub fn is_authenticated(&self) -> bool {
        self.state.read().unwrap().is_authenticated()
    }

    /// Whether the authenticated profile carries the administrator marker
    pub fn is_admin(&self) -> bool {
        self.state.read().unwrap().is_admin()
    }

    /// Subscribe to session state changes
    ///
    /// Every transition is delivered as a full state snapshot, in order.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionState> {
        self.updates.subscribe()
    }

    /// Restore the session at application start
    ///
    /// Reads the persisted token; with none the session settles anonymous
    /// without touching the network. Resolution failure clears the stale
    /// credential and also settles anonymous - initialization never fails.
    pub async fn initialize(&self) {
        let stored = match self.tokens.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token; starting anonymous");
                None
            }
        };

        match stored {
            None => {
                debug!("No persisted token found");
                self.set_state(SessionState::anonymous());
            }
            Some(token) => {
                info!("Found persisted token, resolving");
                let attempt = self.begin_attempt();
                if let Err(e) = self.resolve(token, attempt).await {
                    warn!(error = %e, "Persisted token did not resolve; session cleared");
                }
            }
        }
    }

    /// Log in with a token already issued by the identity service
    ///
    /// On failure the session settles anonymous and the error is returned
    /// for the caller to surface.
    pub async fn login(&self, token: impl Into<String>) -> SessionResult<UserProfile> {
        let attempt = self.begin_attempt();
        self.resolve(token.into(), attempt).await
    }

    /// Log in with email/password credentials
    ///
    /// Performs the credential exchange against the identity service, then
    /// resolves the issued token like `login`.
    pub async fn login_with_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> SessionResult<UserProfile> {
        let attempt = self.begin_attempt();

        let token = match self.identity.exchange_credentials(email, password).await {
            Ok(token) => token,
            Err(e) => {
                if self.commit_if_current(attempt, SessionState::anonymous()) {
                    if let Err(clear_err) = self.tokens.clear() {
                        warn!(error = %clear_err, "Failed to remove persisted token");
                    }
                }
                return Err(e.into());
            }
        };

        self.resolve(token, attempt).await
    }

    /// Clear the session
    ///
    /// Synchronous and infallible: the generation bump invalidates any
    /// in-flight resolution, the persisted token is removed, and
    /// subscribers see the anonymous state before this returns.
    pub fn logout(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "Failed to remove persisted token during logout");
        }

        self.set_state(SessionState::anonymous());
        info!("Session cleared");
    }

    /// Start a resolution attempt: bump the generation and enter the
    /// transient authenticating state
    fn begin_attempt(&self) -> u64 {
        let attempt = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_state(SessionState::authenticating());
        attempt
    }

    /// Resolve a token against the identity service and commit the outcome
    async fn resolve(&self, token: String, attempt: u64) -> SessionResult<UserProfile> {
        match self.identity.resolve_token(&token).await {
            Ok(profile) => {
                let committed = self.commit_if_current(
                    attempt,
                    SessionState::authenticated(token.clone(), profile.clone()),
                );
                if !committed {
                    debug!("Discarding resolution that finished after the session moved on");
                    return Err(SessionError::Superseded);
                }

                if let Err(e) = self.tokens.store(&token) {
                    // The in-memory session still works; only persistence
                    // across restarts is lost.
                    warn!(error = %e, "Failed to persist token");
                }

                // A logout may have landed between the commit and the write
                // above; its clear must win over the just-persisted token.
                if self.generation.load(Ordering::SeqCst) != attempt {
                    if let Err(e) = self.tokens.clear() {
                        warn!(error = %e, "Failed to remove token persisted across a logout");
                    }
                }

                info!("Session authenticated as {}", profile.display_string());
                Ok(profile)
            }
            Err(e) => {
                if self.commit_if_current(attempt, SessionState::anonymous()) {
                    if let Err(clear_err) = self.tokens.clear() {
                        warn!(error = %clear_err, "Failed to remove persisted token");
                    }
                }
                Err(e.into())
            }
        }
    }

    /// Replace the session snapshot and notify subscribers
    fn set_state(&self, next: SessionState) {
        {
            let mut state = self.state.write().unwrap();
            *state = next.clone();
        }
        // No receivers is fine
        let _ = self.updates.send(next);
    }

    /// Commit an attempt's outcome unless the session has moved on
    ///
    /// The generation check happens under the state lock, so a logout that
    /// wins the race can never be overwritten by a stale resolution.
    fn commit_if_current(&self, attempt: u64, next: SessionState) -> bool {
        {
            let mut state = self.state.write().unwrap();
            if self.generation.load(Ordering::SeqCst) != attempt {
                return false;
            }
            *state = next.clone();
        }
        let _ = self.updates.send(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionPhase;
    use crate::storage::MemoryTokenStore;
    use async_trait::async_trait;
    use portfolio_core::{ErrorContext, PortfolioError, UserRole};
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{mpsc, Mutex};
    use tokio::sync::Notify;

    fn profile(id: i64, name: &str, role: UserRole) -> UserProfile {
        UserProfile {
            id,
            full_name: name.to_string(),
            email: format!("{}@uni.edu", name.to_lowercase()),
            photo_url: None,
            course: Some("Engenharia de Software".to_string()),
            shift: None,
            role,
        }
    }

    fn auth_failure(message: &str) -> PortfolioError {
        PortfolioError::Authentication {
            message: message.to_string(),
            context: ErrorContext::new("mock_identity"),
        }
    }

    /// Identity provider backed by in-memory maps, with an optional gate
    /// that holds every resolution until the test releases it
    #[derive(Default)]
    struct MockIdentity {
        tokens: HashMap<String, UserProfile>,
        credentials: HashMap<(String, String), String>,
        resolve_calls: AtomicUsize,
        entered: Option<Arc<Notify>>,
        gate: Option<Arc<Notify>>,
    }

    impl MockIdentity {
        fn with_token(token: &str, profile: UserProfile) -> Self {
            let mut mock = Self::default();
            mock.tokens.insert(token.to_string(), profile);
            mock
        }

        fn with_credentials(email: &str, password: &str, token: &str, profile: UserProfile) -> Self {
            let mut mock = Self::with_token(token, profile);
            mock.credentials.insert(
                (email.to_string(), password.to_string()),
                token.to_string(),
            );
            mock
        }

        fn gated(mut self, entered: Arc<Notify>, gate: Arc<Notify>) -> Self {
            self.entered = Some(entered);
            self.gate = Some(gate);
            self
        }

        fn resolve_call_count(&self) -> usize {
            self.resolve_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityProvider for MockIdentity {
        async fn exchange_credentials(
            &self,
            email: &str,
            password: &str,
        ) -> portfolio_core::PortfolioResult<String> {
            self.credentials
                .get(&(email.to_string(), password.to_string()))
                .cloned()
                .ok_or_else(|| auth_failure("invalid credentials"))
        }

        async fn resolve_token(
            &self,
            token: &str,
        ) -> portfolio_core::PortfolioResult<UserProfile> {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(entered) = &self.entered {
                entered.notify_one();
            }
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            self.tokens
                .get(token)
                .cloned()
                .ok_or_else(|| auth_failure("invalid or expired token"))
        }
    }

    /// Token store whose `store()` blocks until the test releases it
    struct GatedStore {
        inner: MemoryTokenStore,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl TokenStore for GatedStore {
        fn load(&self) -> portfolio_core::PortfolioResult<Option<String>> {
            self.inner.load()
        }

        fn store(&self, token: &str) -> portfolio_core::PortfolioResult<()> {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.release.lock().unwrap().recv();
            self.inner.store(token)
        }

        fn clear(&self) -> portfolio_core::PortfolioResult<()> {
            self.inner.clear()
        }
    }

    fn manager(identity: MockIdentity, tokens: MemoryTokenStore) -> SessionManager {
        SessionManager::new(Arc::new(identity), Arc::new(tokens))
    }

    #[tokio::test]
    async fn test_initialize_without_stored_token_is_anonymous_and_offline() {
        let identity = Arc::new(MockIdentity::default());
        let manager = SessionManager::new(identity.clone(), Arc::new(MemoryTokenStore::new()));

        assert_eq!(manager.state().phase(), SessionPhase::Uninitialized);
        manager.initialize().await;

        assert_eq!(manager.state().phase(), SessionPhase::Anonymous);
        assert!(!manager.is_authenticated());
        assert_eq!(identity.resolve_call_count(), 0);
    }

    #[tokio::test]
    async fn test_initialize_with_stored_admin_token() {
        let identity = MockIdentity::with_token("tok", profile(1, "Ana", UserRole::Admin));
        let tokens = MemoryTokenStore::with_token("tok");
        let manager = manager(identity, tokens);

        manager.initialize().await;

        let state = manager.state();
        assert_eq!(state.phase(), SessionPhase::Authenticated);
        assert!(state.is_authenticated());
        assert!(state.is_admin());
        assert_eq!(state.token(), Some("tok"));
    }

    #[tokio::test]
    async fn test_initialize_with_rejected_token_clears_storage() {
        let identity = MockIdentity::default(); // knows no tokens
        let store = Arc::new(MemoryTokenStore::with_token("stale"));
        let manager = SessionManager::new(Arc::new(identity), store.clone());

        manager.initialize().await;

        assert_eq!(manager.state().phase(), SessionPhase::Anonymous);
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_success_persists_token_and_derives_flags() {
        let identity = MockIdentity::with_token("tok", profile(1, "Ana", UserRole::Student));
        let store = Arc::new(MemoryTokenStore::new());
        let manager = SessionManager::new(Arc::new(identity), store.clone());
        manager.initialize().await;

        let resolved = manager.login("tok").await.unwrap();
        assert_eq!(resolved.full_name, "Ana");

        let state = manager.state();
        assert!(state.is_authenticated());
        assert!(!state.is_admin());
        assert_eq!(store.load().unwrap(), Some("tok".to_string()));
    }

    #[tokio::test]
    async fn test_login_failure_leaves_session_anonymous() {
        let identity = MockIdentity::with_token("good", profile(1, "Ana", UserRole::Student));
        let store = Arc::new(MemoryTokenStore::new());
        let manager = SessionManager::new(Arc::new(identity), store.clone());
        manager.initialize().await;

        let result = manager.login("bad").await;
        assert!(result.is_err());

        assert_eq!(manager.state().phase(), SessionPhase::Anonymous);
        assert!(!manager.is_authenticated());
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_with_credentials() {
        let identity = MockIdentity::with_credentials(
            "ana@uni.edu",
            "secret",
            "tok",
            profile(1, "Ana", UserRole::Student),
        );
        let manager = manager(identity, MemoryTokenStore::new());
        manager.initialize().await;

        let resolved = manager
            .login_with_credentials("ana@uni.edu", "secret")
            .await
            .unwrap();
        assert_eq!(resolved.id, 1);
        assert!(manager.is_authenticated());

        // wrong password: error surfaced, session back to anonymous
        let result = manager.login_with_credentials("ana@uni.edu", "wrong").await;
        assert!(result.is_err());
        assert_eq!(manager.state().phase(), SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn test_logout_clears_everything_synchronously() {
        let identity = MockIdentity::with_token("tok", profile(1, "Ana", UserRole::Admin));
        let store = Arc::new(MemoryTokenStore::with_token("tok"));
        let manager = SessionManager::new(Arc::new(identity), store.clone());
        manager.initialize().await;
        assert!(manager.is_admin());

        manager.logout();

        assert_eq!(manager.state().phase(), SessionPhase::Anonymous);
        assert!(!manager.is_authenticated());
        assert!(!manager.is_admin());
        assert_eq!(store.load().unwrap(), None);

        // logout from anonymous is also fine
        manager.logout();
        assert_eq!(manager.state().phase(), SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn test_late_resolution_after_logout_is_discarded() {
        let entered = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());
        let identity = MockIdentity::with_token("tok", profile(1, "Ana", UserRole::Admin))
            .gated(entered.clone(), gate.clone());
        let store = Arc::new(MemoryTokenStore::new());
        let manager = Arc::new(SessionManager::new(Arc::new(identity), store.clone()));
        manager.initialize().await;

        let task = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.login("tok").await })
        };

        // wait until the resolution is in flight, then pull the rug
        entered.notified().await;
        assert_eq!(manager.state().phase(), SessionPhase::Authenticating);
        manager.logout();
        gate.notify_one();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(SessionError::Superseded)));

        // the late success must not resurrect the session
        assert_eq!(manager.state().phase(), SessionPhase::Anonymous);
        assert!(!manager.is_authenticated());
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_logout_during_token_persist_leaves_store_empty() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let store = Arc::new(GatedStore {
            inner: MemoryTokenStore::new(),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        let identity = MockIdentity::with_token("tok", profile(1, "Ana", UserRole::Student));
        let manager = Arc::new(SessionManager::new(Arc::new(identity), store.clone()));
        manager.initialize().await;

        let task = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.login("tok").await })
        };

        // the session commits before the write begins, so once the store is
        // entered the state is already authenticated
        entered_rx.recv().unwrap();
        assert_eq!(manager.state().phase(), SessionPhase::Authenticated);

        manager.logout();
        assert_eq!(manager.state().phase(), SessionPhase::Anonymous);
        assert_eq!(store.load().unwrap(), None);

        // let the in-flight write finish after the logout
        release_tx.send(()).unwrap();
        task.await.unwrap().unwrap();

        // the late write must not resurrect the credential
        assert_eq!(manager.state().phase(), SessionPhase::Anonymous);
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_credential_exchange_clears_persisted_token() {
        let identity = MockIdentity::with_credentials(
            "ana@uni.edu",
            "secret",
            "tok",
            profile(1, "Ana", UserRole::Student),
        );
        let store = Arc::new(MemoryTokenStore::new());
        let manager = SessionManager::new(Arc::new(identity), store.clone());
        manager.initialize().await;

        manager
            .login_with_credentials("ana@uni.edu", "secret")
            .await
            .unwrap();
        assert_eq!(store.load().unwrap(), Some("tok".to_string()));

        let result = manager.login_with_credentials("ana@uni.edu", "wrong").await;
        assert!(result.is_err());

        // a restart after the failed re-login must not restore the old session
        assert_eq!(manager.state().phase(), SessionPhase::Anonymous);
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_subscribers_observe_transitions_in_order() {
        let identity = MockIdentity::with_token("tok", profile(1, "Ana", UserRole::Student));
        let manager = manager(identity, MemoryTokenStore::new());

        let mut updates = manager.subscribe();

        manager.initialize().await;
        manager.login("tok").await.unwrap();
        manager.logout();

        assert_eq!(
            updates.try_recv().unwrap().phase(),
            SessionPhase::Anonymous
        );
        assert_eq!(
            updates.try_recv().unwrap().phase(),
            SessionPhase::Authenticating
        );
        assert_eq!(
            updates.try_recv().unwrap().phase(),
            SessionPhase::Authenticated
        );
        assert_eq!(
            updates.try_recv().unwrap().phase(),
            SessionPhase::Anonymous
        );
    }

    #[tokio::test]
    async fn test_flags_invariant_across_operation_sequence() {
        let identity = MockIdentity::with_token("tok", profile(1, "Ana", UserRole::Admin));
        let manager = manager(identity, MemoryTokenStore::new());

        let check = |state: &SessionState| {
            assert_eq!(
                state.is_authenticated(),
                state.token().is_some() && state.profile().is_some()
            );
            if state.is_admin() {
                assert!(state.is_authenticated());
            }
        };

        check(&manager.state());
        manager.initialize().await;
        check(&manager.state());
        let _ = manager.login("nope").await;
        check(&manager.state());
        manager.login("tok").await.unwrap();
        check(&manager.state());
        manager.logout();
        check(&manager.state());
    }
}
