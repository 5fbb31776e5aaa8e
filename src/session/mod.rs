pub mod state;

pub use state::SessionState;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::errors::AuthError;
use crate::guard::GuardContext;
use crate::models::credentials::{Credentials, OtpPurpose, RegisterPayload};
use crate::models::tokens::TokenPair;
use crate::models::user::{AccountSnapshot, ProfileSet, RoleTag, User};
use crate::roles::{RoleResolution, RoleResolutionError, RoleResolver, RoleRoutes};
use crate::services::auth_api::{ApiError, AuthApi, LoginSuccess};
use crate::store::session_store::{
    SessionStore, ACCESS_TOKEN_KEY, ACTIVE_ROLE_KEY, REFRESH_TOKEN_KEY,
};

#[derive(Default)]
struct SessionCell {
    state: SessionState,
    tokens: Option<TokenPair>,
    user: Option<User>,
    profiles: Option<ProfileSet>,
    active_role: Option<RoleTag>,
}

/// Owns the token pair, the session state machine, and the active role.
/// One instance per running client, created at startup and shared
/// (`Arc`) with everything that makes authenticated requests. The store
/// and remote API are injected behind traits so web, mobile, and tests
/// each supply their own.
///
/// Tokens have exactly one writer path (login/refresh/logout here);
/// everyone else reads.
pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn SessionStore>,
    resolver: RoleResolver,
    cell: RwLock<SessionCell>,
    /// Serializes refresh-token rotation.
    refresh_gate: Mutex<()>,
    /// Bumped on every token-pair change; lets a queued refresh caller see
    /// that the rotation it wanted already happened.
    generation: AtomicU64,
    /// Bumped at each login submission; a completion that is no longer the
    /// latest attempt is discarded.
    login_attempts: AtomicU64,
    /// Bumped on logout; in-flight request failures from before the bump
    /// are reported as cancelled rather than as errors.
    logout_epoch: AtomicU64,
}

impl SessionManager {
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn SessionStore>, routes: RoleRoutes) -> Self {
        Self {
            api,
            store,
            resolver: RoleResolver::new(routes),
            cell: RwLock::new(SessionCell::default()),
            refresh_gate: Mutex::new(()),
            generation: AtomicU64::new(0),
            login_attempts: AtomicU64::new(0),
            logout_epoch: AtomicU64::new(0),
        }
    }

    /// Reads the persisted session back from durable storage, resolving the
    /// initial `Loading` state to `Authenticated` or `Anonymous`.
    pub async fn initialize(&self) -> Result<SessionState, AuthError> {
        let access = self.store.get(ACCESS_TOKEN_KEY).await?;
        let refresh = self.store.get(REFRESH_TOKEN_KEY).await?;
        let active_role = self
            .store
            .get(ACTIVE_ROLE_KEY)
            .await?
            .and_then(|value| RoleTag::parse(&value));

        let state = match (access, refresh) {
            (Some(access_token), Some(refresh_token)) => {
                let mut cell = self.cell.write().await;
                cell.tokens = Some(TokenPair {
                    access_token,
                    refresh_token,
                });
                cell.active_role = active_role;
                cell.state = SessionState::Authenticated;
                SessionState::Authenticated
            }
            (None, None) => {
                self.cell.write().await.state = SessionState::Anonymous;
                SessionState::Anonymous
            }
            _ => {
                // Half a token pair is unusable; drop whatever is left.
                tracing::warn!("found partial token pair in storage, clearing it");
                self.purge_stored_session().await;
                self.cell.write().await.state = SessionState::Anonymous;
                SessionState::Anonymous
            }
        };

        tracing::debug!(?state, "session initialized from storage");
        Ok(state)
    }

    pub async fn login(&self, credentials: Credentials) -> Result<User, AuthError> {
        let attempt = self.login_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = self.api.login(&credentials).await;

        if self.login_attempts.load(Ordering::SeqCst) != attempt {
            // The user resubmitted while this call was in flight; the newer
            // attempt owns the outcome.
            tracing::debug!("discarding superseded login response");
            return Err(AuthError::Superseded);
        }

        let success = outcome.map_err(credential_error)?;
        self.install_session(success).await
    }

    /// Registration assigns one role at creation and signs the new account
    /// in, so a success is handled exactly like a login.
    pub async fn register(&self, payload: RegisterPayload) -> Result<User, AuthError> {
        let success = self
            .api
            .register(&payload)
            .await
            .map_err(credential_error)?;
        self.install_session(success).await
    }

    /// Asks the service to dispatch a one-time code. Resend throttling is
    /// the caller's job (see [`crate::utils::cooldown::ResendCooldown`]);
    /// this method always forwards the request.
    pub async fn send_otp(&self, phone_number: &str, purpose: OtpPurpose) -> Result<(), AuthError> {
        self.api
            .send_otp(phone_number, purpose)
            .await
            .map_err(credential_error)
    }

    pub async fn verify_otp(&self, phone_number: &str, code: &str) -> Result<(), AuthError> {
        self.api
            .verify_otp(phone_number, code)
            .await
            .map_err(credential_error)
    }

    /// Exchanges the refresh token for a new pair. Safe under concurrent
    /// callers: rotation is serialized, and a caller that queued behind an
    /// already-completed rotation receives the fresh pair without a second
    /// network call.
    pub async fn refresh(&self) -> Result<TokenPair, AuthError> {
        let observed_generation = self.generation.load(Ordering::SeqCst);
        let observed_epoch = self.logout_epoch.load(Ordering::SeqCst);
        let _gate = self.refresh_gate.lock().await;

        if self.generation.load(Ordering::SeqCst) != observed_generation {
            let cell = self.cell.read().await;
            return match &cell.tokens {
                Some(pair) => Ok(pair.clone()),
                None => Err(AuthError::SessionExpired),
            };
        }

        let refresh_token = {
            let mut cell = self.cell.write().await;
            let Some(pair) = cell.tokens.as_ref() else {
                return Err(AuthError::SessionExpired);
            };
            let refresh_token = pair.refresh_token.clone();
            cell.state = SessionState::Refreshing;
            refresh_token
        };

        match self.api.refresh(&refresh_token).await {
            Ok(pair) => {
                if self.logout_epoch.load(Ordering::SeqCst) != observed_epoch {
                    // The user logged out while the exchange was in flight;
                    // the rotated pair must not resurrect the session.
                    tracing::debug!("discarding refreshed tokens after logout");
                    return Err(AuthError::Cancelled);
                }

                let persisted = async {
                    self.store.set(ACCESS_TOKEN_KEY, &pair.access_token).await?;
                    self.store.set(REFRESH_TOKEN_KEY, &pair.refresh_token).await
                }
                .await;
                if let Err(err) = persisted {
                    // The in-memory session stays good; the stale stored
                    // pair just won't survive a restart.
                    tracing::warn!(%err, "failed to persist rotated tokens");
                }

                let mut cell = self.cell.write().await;
                cell.tokens = Some(pair.clone());
                cell.state = SessionState::Authenticated;
                drop(cell);
                self.generation.fetch_add(1, Ordering::SeqCst);
                tracing::debug!("token pair rotated");
                Ok(pair)
            }
            Err(ApiError::Network(message)) => {
                // The service was unreachable; the pair may still be good,
                // so keep the session and let the caller retry.
                let mut cell = self.cell.write().await;
                if cell.state == SessionState::Refreshing {
                    cell.state = SessionState::Authenticated;
                }
                Err(AuthError::Network(message))
            }
            Err(err) => {
                tracing::warn!(%err, "refresh rejected, tearing down session");
                self.clear_local().await;
                Err(AuthError::SessionExpired)
            }
        }
    }

    /// Best-effort remote revocation, then an unconditional local clear.
    /// Never blocked by network failure.
    pub async fn logout(&self) {
        self.logout_epoch.fetch_add(1, Ordering::SeqCst);

        let refresh_token = {
            let cell = self.cell.read().await;
            cell.tokens.as_ref().map(|pair| pair.refresh_token.clone())
        };
        if let Some(token) = refresh_token {
            if let Err(err) = self.api.logout(&token).await {
                tracing::warn!(%err, "logout revocation failed, clearing local session anyway");
            }
        }

        self.clear_local().await;
    }

    /// Runs an authenticated request with the current access token. On a
    /// 401 the token pair is refreshed exactly once and the request retried
    /// once with the new token; a second 401 is fatal for this request.
    ///
    /// The refresh exchange itself never goes through here, so it cannot
    /// recurse.
    pub async fn with_auth<T, F, Fut>(&self, op: F) -> Result<T, AuthError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let observed_epoch = self.logout_epoch.load(Ordering::SeqCst);
        let token = self
            .access_token()
            .await
            .ok_or(AuthError::SessionExpired)?;

        match op(token).await {
            Ok(value) => Ok(value),
            Err(ApiError::Unauthorized { .. }) => {
                let pair = match self.refresh().await {
                    Ok(pair) => pair,
                    Err(err) => return Err(self.absorb_after_logout(observed_epoch, err)),
                };
                match op(pair.access_token).await {
                    Ok(value) => Ok(value),
                    Err(ApiError::Unauthorized { .. }) => {
                        Err(self.absorb_after_logout(observed_epoch, AuthError::SessionExpired))
                    }
                    Err(err) => {
                        Err(self.absorb_after_logout(observed_epoch, request_error(err)))
                    }
                }
            }
            Err(err) => Err(self.absorb_after_logout(observed_epoch, request_error(err))),
        }
    }

    /// Fetches the user record and role profiles, refreshing the cached
    /// copies and dropping a persisted active role that the new resolution
    /// no longer allows.
    pub async fn fetch_account(&self) -> Result<AccountSnapshot, AuthError> {
        let api = Arc::clone(&self.api);
        let snapshot = self
            .with_auth(move |token| {
                let api = Arc::clone(&api);
                async move { api.me(&token).await }
            })
            .await?;

        {
            let mut cell = self.cell.write().await;
            cell.user = Some(snapshot.user.clone());
            cell.profiles = Some(snapshot.profiles.clone());
        }
        self.reconcile_active_role(&snapshot).await;
        Ok(snapshot)
    }

    /// Computes the role options for the current account, fetching it
    /// first if needed. A single-option resolution is selected on the spot
    /// so the caller can navigate without prompting.
    pub async fn resolve_roles(&self) -> Result<RoleResolution, AuthError> {
        let cached = {
            let cell = self.cell.read().await;
            match (&cell.user, &cell.profiles) {
                (Some(user), Some(profiles)) => Some((user.clone(), profiles.clone())),
                _ => None,
            }
        };
        let (user, profiles) = match cached {
            Some(pair) => pair,
            None => {
                let snapshot = self.fetch_account().await?;
                (snapshot.user, snapshot.profiles)
            }
        };

        let resolution = self.resolver.resolve(&user, &profiles)?;
        if let Some(only) = resolution.single() {
            if self.active_role().await != Some(only.role) {
                self.select_role(only.role).await?;
            }
        }
        Ok(resolution)
    }

    /// Makes the user's explicit choice the active role, after checking it
    /// against the current resolution.
    pub async fn select_role(&self, role: RoleTag) -> Result<(), AuthError> {
        let (user, profiles) = {
            let cell = self.cell.read().await;
            match (&cell.user, &cell.profiles) {
                (Some(user), Some(profiles)) => (user.clone(), profiles.clone()),
                _ => return Err(RoleResolutionError::NotAvailable(role).into()),
            }
        };

        let resolution = self.resolver.resolve(&user, &profiles)?;
        if !resolution.contains(role) {
            return Err(RoleResolutionError::NotAvailable(role).into());
        }

        self.store.set(ACTIVE_ROLE_KEY, role.as_str()).await?;
        self.cell.write().await.active_role = Some(role);
        tracing::info!(role = role.as_str(), "active role selected");
        Ok(())
    }

    pub async fn state(&self) -> SessionState {
        self.cell.read().await.state
    }

    /// Derived from token presence; never stored as an independent flag
    /// that could drift from the tokens.
    pub async fn is_authenticated(&self) -> bool {
        self.cell.read().await.tokens.is_some()
    }

    pub async fn access_token(&self) -> Option<String> {
        let cell = self.cell.read().await;
        cell.tokens.as_ref().map(|pair| pair.access_token.clone())
    }

    pub async fn active_role(&self) -> Option<RoleTag> {
        self.cell.read().await.active_role
    }

    pub async fn current_user(&self) -> Option<User> {
        self.cell.read().await.user.clone()
    }

    pub async fn guard_context(&self) -> GuardContext {
        let cell = self.cell.read().await;
        GuardContext {
            loading: cell.state == SessionState::Loading,
            authenticated: cell.tokens.is_some(),
            active_role: cell.active_role,
        }
    }

    async fn install_session(&self, success: LoginSuccess) -> Result<User, AuthError> {
        let LoginSuccess { tokens, user } = success;

        let persisted = async {
            self.store.set(ACCESS_TOKEN_KEY, &tokens.access_token).await?;
            self.store.set(REFRESH_TOKEN_KEY, &tokens.refresh_token).await
        }
        .await;
        if let Err(err) = persisted {
            self.purge_stored_session().await;
            return Err(err.into());
        }
        // A new session starts with no role selected; the previous
        // account's choice must not leak into this one.
        if let Err(err) = self.store.remove(ACTIVE_ROLE_KEY).await {
            tracing::warn!(%err, "failed to clear persisted active role");
        }

        let mut cell = self.cell.write().await;
        cell.tokens = Some(tokens);
        cell.user = Some(user.clone());
        cell.profiles = None;
        cell.active_role = None;
        cell.state = SessionState::Authenticated;
        drop(cell);
        self.generation.fetch_add(1, Ordering::SeqCst);

        tracing::info!(user_id = %user.id, "session established");
        Ok(user)
    }

    async fn reconcile_active_role(&self, snapshot: &AccountSnapshot) {
        let active = self.cell.read().await.active_role;
        let Some(role) = active else { return };

        let still_valid = self
            .resolver
            .resolve(&snapshot.user, &snapshot.profiles)
            .map(|resolution| resolution.contains(role))
            .unwrap_or(false);
        if still_valid {
            return;
        }

        tracing::info!(role = role.as_str(), "active role no longer valid, clearing selection");
        if let Err(err) = self.store.remove(ACTIVE_ROLE_KEY).await {
            tracing::warn!(%err, "failed to clear persisted active role");
        }
        self.cell.write().await.active_role = None;
    }

    async fn purge_stored_session(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, ACTIVE_ROLE_KEY] {
            if let Err(err) = self.store.remove(key).await {
                tracing::warn!(%err, key, "failed to remove session key from storage");
            }
        }
    }

    async fn clear_local(&self) {
        self.purge_stored_session().await;

        let mut cell = self.cell.write().await;
        cell.tokens = None;
        cell.user = None;
        cell.profiles = None;
        cell.active_role = None;
        cell.state = SessionState::Anonymous;
        drop(cell);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn absorb_after_logout(&self, observed_epoch: u64, err: AuthError) -> AuthError {
        if self.logout_epoch.load(Ordering::SeqCst) != observed_epoch {
            AuthError::Cancelled
        } else {
            err
        }
    }
}

/// Login, registration, and OTP rejections surface the server's message
/// when there is one; anything the service answered is a credential-class
/// failure from the user's point of view.
fn credential_error(err: ApiError) -> AuthError {
    match err {
        ApiError::Unauthorized { message } | ApiError::Rejected { message, .. } => {
            AuthError::Credential {
                message: if message.is_empty() {
                    "Invalid credentials".to_string()
                } else {
                    message
                },
            }
        }
        ApiError::Network(message) | ApiError::Decode(message) => AuthError::Network(message),
    }
}

/// Failures of ordinary authenticated requests keep their own category.
fn request_error(err: ApiError) -> AuthError {
    match err {
        ApiError::Unauthorized { .. } => AuthError::SessionExpired,
        ApiError::Rejected { status, message } => AuthError::Rejected { status, message },
        ApiError::Network(message) | ApiError::Decode(message) => AuthError::Network(message),
    }
}
