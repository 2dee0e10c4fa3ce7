use std::sync::{Arc, Mutex, MutexGuard};

use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use uuid::Uuid;

use crate::backend::{SessionBackend, SessionEvent};
use crate::cache::{SESSION_KEY, SessionCache};
use crate::dto::auth::{ProfileDraft, ProfilePatch};
use crate::enums::Capability;
use crate::error::{AppError, AppResult};
use crate::models::Identity;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated(Identity),
}

/// A mutating UI action held back until the visitor signs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    AddToCart { product_id: Uuid },
    BookService { service_id: Uuid },
    OpenSellerDashboard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub identity: Identity,
    /// The action deferred by `require_auth`, handed back exactly once.
    pub resumed: Option<PendingAction>,
}

struct GateInner {
    state: SessionState,
    deferred: Option<PendingAction>,
}

pub struct SessionGate {
    backend: Arc<dyn SessionBackend>,
    cache: Arc<dyn SessionCache>,
    inner: Mutex<GateInner>,
}

/// Background subscription to session events; stops when dropped.
pub struct SessionWatch {
    task: JoinHandle<()>,
}

impl Drop for SessionWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl SessionGate {
    pub fn new(backend: Arc<dyn SessionBackend>, cache: Arc<dyn SessionCache>) -> Self {
        Self {
            backend,
            cache,
            inner: Mutex::new(GateInner {
                state: SessionState::Anonymous,
                deferred: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn current(&self) -> Option<Identity> {
        match &self.lock().state {
            SessionState::Authenticated(identity) => Some(identity.clone()),
            SessionState::Anonymous | SessionState::Authenticating => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// The signed-in identity, or `NotAuthenticated`.
    pub fn actor(&self) -> AppResult<Identity> {
        self.current().ok_or(AppError::NotAuthenticated)
    }

    pub fn require_capability(&self, capability: Capability) -> AppResult<Identity> {
        let identity = self.actor()?;
        identity.ensure(capability)?;
        Ok(identity)
    }

    /// Lets `action` proceed for a signed-in identity. Otherwise the action
    /// replaces any previously deferred one and `AuthRequired` is returned so
    /// the caller can show the sign-in prompt.
    pub fn require_auth(&self, action: PendingAction) -> AppResult<Identity> {
        let mut inner = self.lock();
        if let SessionState::Authenticated(identity) = &inner.state {
            return Ok(identity.clone());
        }
        tracing::debug!(?action, "action deferred until sign-in");
        inner.deferred = Some(action);
        Err(AppError::AuthRequired)
    }

    pub fn deferred(&self) -> Option<PendingAction> {
        self.lock().deferred
    }

    /// Drops the deferred action, e.g. when the sign-in prompt is dismissed.
    pub fn dismiss_prompt(&self) {
        self.lock().deferred = None;
    }

    /// A signed-in identity has to log out first, so a failed attempt can
    /// never leave the cache holding a session the gate has dropped.
    fn begin_authenticating(&self) -> AppResult<()> {
        let mut inner = self.lock();
        if let SessionState::Authenticated(current) = &inner.state {
            tracing::debug!(user_id = %current.id, "sign-in refused, already signed in");
            return Err(AppError::Validation(
                "already signed in, sign out first".into(),
            ));
        }
        inner.state = SessionState::Authenticating;
        Ok(())
    }

    async fn settle(&self, result: AppResult<Identity>) -> AppResult<LoginOutcome> {
        let identity = match result {
            Ok(identity) => identity,
            Err(err) => {
                self.lock().state = SessionState::Anonymous;
                tracing::info!(error = %err, "sign-in failed");
                return Err(err);
            }
        };

        let resumed = {
            let mut inner = self.lock();
            inner.state = SessionState::Authenticated(identity.clone());
            inner.deferred.take()
        };
        self.persist(&identity).await;
        tracing::info!(user_id = %identity.id, role = %identity.role, "signed in");
        Ok(LoginOutcome { identity, resumed })
    }

    async fn persist(&self, identity: &Identity) {
        let raw = match serde_json::to_string(identity) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "identity not cached");
                return;
            }
        };
        if let Err(err) = self.cache.write(SESSION_KEY, &raw).await {
            tracing::warn!(error = %err, "identity not cached");
        }
    }

    async fn forget(&self) {
        {
            let mut inner = self.lock();
            inner.state = SessionState::Anonymous;
            inner.deferred = None;
        }
        if let Err(err) = self.cache.clear(SESSION_KEY).await {
            tracing::warn!(error = %err, "session cache not cleared");
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginOutcome> {
        self.begin_authenticating()?;
        let result = self.backend.sign_in(email, password).await;
        self.settle(result).await
    }

    /// Validates locally first; a draft that fails never reaches the backend.
    pub async fn register(&self, draft: &ProfileDraft, password: &str) -> AppResult<LoginOutcome> {
        let profile = draft.validate(password)?;
        self.begin_authenticating()?;
        let result = self.backend.sign_up(&profile, password).await;
        self.settle(result).await
    }

    pub async fn logout(&self) -> AppResult<()> {
        if let Err(err) = self.backend.sign_out().await {
            tracing::warn!(error = %err, "remote sign-out failed, clearing local session");
        }
        self.forget().await;
        tracing::info!("signed out");
        Ok(())
    }

    /// Restores the cached identity, if any. No network call is made.
    pub async fn rehydrate(&self) -> SessionState {
        let raw = match self.cache.read(SESSION_KEY).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "session cache unreadable");
                None
            }
        };
        let Some(raw) = raw else {
            return self.state();
        };
        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) => {
                tracing::info!(user_id = %identity.id, "session restored from cache");
                self.lock().state = SessionState::Authenticated(identity);
            }
            Err(err) => {
                tracing::warn!(error = %err, "discarding corrupt cached session");
                self.forget().await;
            }
        }
        self.state()
    }

    /// Asks the backend whether the restored session is still live. An
    /// unreachable backend keeps the cached identity.
    pub async fn revalidate(&self) -> AppResult<SessionState> {
        match self.backend.current_session().await {
            Ok(Some(identity)) => {
                self.lock().state = SessionState::Authenticated(identity.clone());
                self.persist(&identity).await;
            }
            Ok(None) => {
                if self.is_authenticated() {
                    tracing::info!("cached session no longer valid");
                    self.forget().await;
                }
            }
            Err(err) if err.is_unavailable() => {
                tracing::warn!(error = %err, "session check skipped");
            }
            Err(err) => return Err(err),
        }
        Ok(self.state())
    }

    pub async fn handle_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::SignedIn(_) => {}
            SessionEvent::SignedOut | SessionEvent::Expired => {
                if self.is_authenticated() {
                    tracing::info!(?event, "session ended out-of-band");
                    self.forget().await;
                }
            }
        }
    }

    /// Follows the backend's session notifications until the returned watch
    /// is dropped.
    pub fn watch(self: &Arc<Self>) -> SessionWatch {
        let mut events = self.backend.subscribe();
        let gate = Arc::clone(self);
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => gate.handle_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session events lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        SessionWatch { task }
    }

    pub async fn update_profile(&self, patch: &ProfilePatch) -> AppResult<Identity> {
        let changes = patch.validate()?;
        let actor = self.actor()?;
        let identity = self.backend.update_profile(&actor, &changes).await?;
        {
            let mut inner = self.lock();
            if matches!(&inner.state, SessionState::Authenticated(current) if current.id == identity.id)
            {
                inner.state = SessionState::Authenticated(identity.clone());
            }
        }
        self.persist(&identity).await;
        tracing::info!(user_id = %identity.id, "profile updated");
        Ok(identity)
    }
}
