//! Per-role authenticated session state.
//!
//! The [`StorageStateManager`] runs a role's login flow at most once per run,
//! captures the resulting browser storage as a [`SessionState`], persists it,
//! and hands it to every scenario of that role's suite. Later runs load the
//! persisted record instead of logging in again unless regeneration is
//! forced.

mod login;
mod store;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::browser::BrowserAdapter;
use crate::context::{ExecutionContext, TEARDOWN_GRACE};
use crate::error::AuthSetupError;

pub use login::{LoginFlow, ScenarioLoginFlow};
pub use store::{FileStateStore, MemoryStateStore, StateStore, StateStoreError};

/// An authenticated session snapshot for one role.
///
/// `data` is whatever the browser adapter's
/// [`storage_state`](crate::BrowserPage::storage_state) produced; the engine
/// never looks inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Role the session belongs to.
    pub role: String,
    /// Capture time in seconds since the Unix epoch.
    pub captured_at: u64,
    /// Adapter-defined cookies and storage.
    pub data: serde_json::Value,
}

impl SessionState {
    /// Capture `data` for `role` at the current time.
    #[must_use]
    pub fn new(role: impl Into<String>, data: serde_json::Value) -> Self {
        let captured_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        Self {
            role: role.into(),
            captured_at,
            data,
        }
    }
}

#[derive(Default)]
enum RoleSlot {
    #[default]
    Empty,
    Ready(SessionState),
    Failed(AuthSetupError),
}

/// Produces, persists and restores per-role session state.
pub struct StorageStateManager {
    adapter: Arc<dyn BrowserAdapter>,
    store: Arc<dyn StateStore>,
    login: Arc<dyn LoginFlow>,
    regenerate: bool,
    base_url: Option<String>,
    slots: Mutex<HashMap<String, Arc<tokio::sync::Mutex<RoleSlot>>>>,
}

impl StorageStateManager {
    /// Create a manager that logs in through `login` on pages opened by
    /// `adapter` and persists the result in `store`.
    #[must_use]
    pub fn new(
        adapter: Arc<dyn BrowserAdapter>,
        store: Arc<dyn StateStore>,
        login: Arc<dyn LoginFlow>,
    ) -> Self {
        Self {
            adapter,
            store,
            login,
            regenerate: false,
            base_url: None,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Ignore persisted state and log in again, once per role for the life of
    /// this manager.
    #[must_use]
    pub fn with_regeneration(mut self, regenerate: bool) -> Self {
        self.regenerate = regenerate;
        self
    }

    /// Base URL handed to the login flow's execution context.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<RoleSlot>>>> {
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn slot(&self, role: &str) -> Arc<tokio::sync::Mutex<RoleSlot>> {
        Arc::clone(self.slots().entry(role.to_owned()).or_default())
    }

    /// Return session state for `role`, logging in only when needed.
    ///
    /// Calls for the same role are serialised: a second caller waits for the
    /// first and receives the same state. Calls for different roles proceed
    /// independently. A failed setup is remembered and returned to later
    /// callers without another login attempt.
    ///
    /// # Errors
    /// Returns [`AuthSetupError`] when the login flow fails or its result
    /// cannot be captured or persisted.
    pub async fn ensure(&self, role: &str) -> Result<SessionState, AuthSetupError> {
        self.ensure_before(role, None).await
    }

    /// Like [`ensure`](Self::ensure), but gives up once `deadline` passes.
    ///
    /// Waiting on another caller's login counts against the deadline, as
    /// does every step of this caller's own login. The login page is closed
    /// even when the deadline interrupts the flow, and a login cut short is
    /// remembered as failed.
    ///
    /// # Errors
    /// Returns [`AuthSetupError`] as [`ensure`](Self::ensure) does, or when
    /// `deadline` passes first.
    pub async fn ensure_before(
        &self,
        role: &str,
        deadline: Option<Instant>,
    ) -> Result<SessionState, AuthSetupError> {
        let slot = self.slot(role);
        let mut guard = within(deadline, slot.lock())
            .await
            .ok_or_else(|| deadline_exceeded(role))?;
        match &*guard {
            RoleSlot::Ready(state) => return Ok(state.clone()),
            RoleSlot::Failed(err) => return Err(err.clone()),
            RoleSlot::Empty => {}
        }

        let outcome = match self.restore(role) {
            Some(state) => Ok(state),
            None => self.regenerate_state(role, deadline).await,
        };
        *guard = match &outcome {
            Ok(state) => RoleSlot::Ready(state.clone()),
            Err(err) => RoleSlot::Failed(err.clone()),
        };
        outcome
    }

    fn restore(&self, role: &str) -> Option<SessionState> {
        if self.regenerate {
            return None;
        }
        match self.store.load(role) {
            Ok(Some(state)) => {
                debug!(role, captured_at = state.captured_at, "restored session state");
                Some(state)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(role, error = %err, "ignoring unreadable session state");
                None
            }
        }
    }

    async fn regenerate_state(
        &self,
        role: &str,
        deadline: Option<Instant>,
    ) -> Result<SessionState, AuthSetupError> {
        info!(role, "running login flow");
        let page = within(deadline, self.adapter.open_page(None))
            .await
            .ok_or_else(|| deadline_exceeded(role))?
            .map_err(|err| {
                AuthSetupError::new(role, format!("could not open a browser page: {err}"))
            })?;
        let mut ctx = ExecutionContext::new(page).with_base_url(self.base_url.clone());
        let captured = within(deadline, self.capture(role, &mut ctx))
            .await
            .unwrap_or_else(|| Err(deadline_exceeded(role)));
        match tokio::time::timeout(TEARDOWN_GRACE, ctx.teardown()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(role, error = %err, "failed to close login page"),
            Err(_) => warn!(role, "closing the login page timed out"),
        }
        let state = captured?;
        self.store.save(&state).map_err(|err| {
            AuthSetupError::new(role, format!("could not persist session state: {err}"))
        })?;
        info!(role, "session state captured");
        Ok(state)
    }

    async fn capture(
        &self,
        role: &str,
        ctx: &mut ExecutionContext,
    ) -> Result<SessionState, AuthSetupError> {
        self.login
            .login(role, ctx)
            .await
            .map_err(|err| AuthSetupError::new(role, err.to_string()))?;
        let page = ctx
            .page()
            .map_err(|err| AuthSetupError::new(role, err.to_string()))?;
        let data = page.storage_state().await.map_err(|err| {
            AuthSetupError::new(role, format!("could not capture storage state: {err}"))
        })?;
        Ok(SessionState::new(role, data))
    }
}

/// Await `future`, or return `None` once `deadline` passes.
async fn within<F: Future>(deadline: Option<Instant>, future: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, future).await.ok(),
        None => Some(future.await),
    }
}

fn deadline_exceeded(role: &str) -> AuthSetupError {
    AuthSetupError::new(role, "run deadline exceeded during login")
}
