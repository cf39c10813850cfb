// ── Session lifecycle ──
//
// Owns the one session the remote holds with the appliance: sign-in,
// transparent re-authentication on 401, and sign-out. Every other module
// reaches the appliance through `with_session`.
//
// Login is single-flight. The `LoggedOut -> Authenticating` and
// `Active -> Authenticating` transitions are claimed atomically on the
// state channel; whoever loses the claim waits for the state to settle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use sinkhole_api::{ApiClient, LoginGrant, SessionId, TransportConfig};
use strum::Display;
use tokio::sync::{Mutex, broadcast, watch};
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::error::CoreError;
use crate::model::HostIdentity;
use crate::store::{Generation, StatusStore};

const EVENT_CHANNEL_SIZE: usize = 16;

// ── SessionState ─────────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SessionState {
    LoggedOut,
    /// A login is in flight, either a fresh sign-in or a re-authentication
    /// after the appliance rejected the session.
    Authenticating,
    Active,
}

/// Notable lifecycle transitions, broadcast to any UI that cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { hostname: Option<String> },
    /// The appliance expired the session and a fresh one replaced it.
    Renewed,
    SignedOut,
    /// Credentials were rejected or re-authentication failed. Route the
    /// user to credential entry.
    AuthenticationFailed { message: String },
}

/// Read-only view of the live session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub server_url: url::Url,
    pub obtained_at: DateTime<Utc>,
    /// Idle validity reported by the appliance at login.
    pub validity: Option<Duration>,
}

// ── SessionManager ───────────────────────────────────────────────

/// Cheaply cloneable handle to the session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    transport: TransportConfig,
    store: Arc<StatusStore>,
    state: watch::Sender<SessionState>,
    current: ArcSwapOption<Bound>,
    /// Held for the duration of any login, so at most one is ever on
    /// the wire.
    auth_lock: Mutex<()>,
    last_failure: ArcSwapOption<CoreError>,
    events: broadcast::Sender<SessionEvent>,
}

/// A session id together with everything needed to replace it.
struct Bound {
    client: ApiClient,
    credentials: Credentials,
    sid: SessionId,
    obtained_at: DateTime<Utc>,
    validity: Option<Duration>,
}

impl Bound {
    fn new(client: ApiClient, credentials: Credentials, grant: LoginGrant) -> Self {
        Self {
            client,
            credentials,
            sid: grant.sid,
            obtained_at: Utc::now(),
            validity: grant.validity,
        }
    }
}

impl SessionManager {
    pub fn new(transport: TransportConfig, store: Arc<StatusStore>) -> Self {
        let (state, _) = watch::channel(SessionState::LoggedOut);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            inner: Arc::new(SessionInner {
                transport,
                store,
                state,
                current: ArcSwapOption::empty(),
                auth_lock: Mutex::new(()),
                last_failure: ArcSwapOption::empty(),
                events,
            }),
        }
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub fn info(&self) -> Option<SessionInfo> {
        self.inner.current.load().as_ref().map(|bound| SessionInfo {
            server_url: bound.credentials.server_url.clone(),
            obtained_at: bound.obtained_at,
            validity: bound.validity,
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Sign in with `credentials`.
    ///
    /// No-op when already `Active`. When a login is already in flight
    /// this waits for it and shares its outcome instead of starting a
    /// second one.
    pub async fn activate(&self, credentials: Credentials) -> Result<(), CoreError> {
        let claimed = self.inner.state.send_if_modified(|state| {
            if *state == SessionState::LoggedOut {
                *state = SessionState::Authenticating;
                true
            } else {
                false
            }
        });
        if !claimed {
            debug!(state = %self.state(), "sign-in already active or in progress");
            return self.settled().await;
        }

        let _auth = self.inner.auth_lock.lock().await;
        debug!(server = %credentials.server_url, "signing in");

        match self.sign_in(&credentials).await {
            Ok((client, grant, host)) => {
                let hostname = host.as_ref().map(|h| h.hostname.clone());
                self.inner.last_failure.store(None);
                self.inner.store.set_host(host);
                self.inner
                    .current
                    .store(Some(Arc::new(Bound::new(client, credentials, grant))));
                self.inner.state.send_replace(SessionState::Active);
                info!(hostname = hostname.as_deref().unwrap_or("unknown"), "signed in");
                let _ = self.inner.events.send(SessionEvent::SignedIn { hostname });
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "sign-in failed");
                self.inner.last_failure.store(Some(Arc::new(err.clone())));
                self.inner.state.send_replace(SessionState::LoggedOut);
                if err.is_auth_failure() {
                    let _ = self.inner.events.send(SessionEvent::AuthenticationFailed {
                        message: err.to_string(),
                    });
                }
                Err(err)
            }
        }
    }

    /// End the session.
    ///
    /// A sign-in still in flight is allowed to settle first, so the
    /// session it produces is the one torn down. No network call when
    /// already logged out. Logout failures are logged and swallowed.
    pub async fn deactivate(&self) {
        let mut rx = self.inner.state.subscribe();
        let Ok(settled) = rx
            .wait_for(|state| *state != SessionState::Authenticating)
            .await
            .map(|state| *state)
        else {
            return;
        };
        if settled != SessionState::Active {
            debug!("deactivate: already logged out");
            return;
        }

        let Some(bound) = self.retire() else {
            return;
        };
        if let Err(e) = bound.client.logout(&bound.sid).await {
            warn!(error = %e, "logout failed (non-fatal)");
        }
        info!("signed out");
    }

    /// Run `op` with the current session, re-authenticating once if the
    /// appliance answers 401.
    ///
    /// A second 401 after a successful re-authentication is reported as
    /// [`CoreError::AuthenticationFailed`] without further retries; the
    /// session stays `Active`.
    pub async fn with_session<T, F, Fut>(&self, op: F) -> Result<T, CoreError>
    where
        F: Fn(ApiClient, SessionId) -> Fut,
        Fut: Future<Output = Result<T, sinkhole_api::Error>>,
    {
        self.with_session_fenced(op).await.map(|(value, _)| value)
    }

    /// Like [`with_session`](Self::with_session), also returning the
    /// cache generation the result belongs to.
    pub(crate) async fn with_session_fenced<T, F, Fut>(
        &self,
        op: F,
    ) -> Result<(T, Generation), CoreError>
    where
        F: Fn(ApiClient, SessionId) -> Fut,
        Fut: Future<Output = Result<T, sinkhole_api::Error>>,
    {
        let (bound, generation) = self.bound().await?;

        match op(bound.client.clone(), bound.sid.clone()).await {
            Err(e) if e.is_unauthorized() => {
                debug!(error = %e, "session rejected");
            }
            other => return other.map(|value| (value, generation)).map_err(CoreError::from),
        }

        let renewed = self.reauthenticate(&bound).await?;
        match op(renewed.client.clone(), renewed.sid.clone()).await {
            Err(e) if e.is_unauthorized() => {
                warn!(error = %e, "session rejected again after re-authentication");
                Err(CoreError::AuthenticationFailed {
                    message: format!("rejected after re-authentication: {e}"),
                })
            }
            other => other.map(|value| (value, generation)).map_err(CoreError::from),
        }
    }

    // ── Internals ────────────────────────────────────────────────

    async fn sign_in(
        &self,
        credentials: &Credentials,
    ) -> Result<(ApiClient, LoginGrant, Option<HostIdentity>), CoreError> {
        let client = ApiClient::new(credentials.server_url.clone(), &self.inner.transport)?;
        let grant = client.login(&credentials.password).await?;

        let host = match client.host_info(&grant.sid).await {
            Ok(info) => Some(HostIdentity::from(info)),
            Err(e) => {
                warn!(error = %e, "could not read appliance hostname");
                None
            }
        };
        Ok((client, grant, host))
    }

    /// Wait out any login in flight, then report whether we are signed in.
    async fn settled(&self) -> Result<(), CoreError> {
        let mut rx = self.inner.state.subscribe();
        let settled = match rx
            .wait_for(|state| *state != SessionState::Authenticating)
            .await
        {
            Ok(state) => *state,
            Err(_) => SessionState::LoggedOut,
        };
        if settled == SessionState::Active {
            Ok(())
        } else {
            Err(self.last_failure().unwrap_or(CoreError::NotSignedIn))
        }
    }

    /// The session to issue a call under, and the generation its results
    /// belong to.
    async fn bound(&self) -> Result<(Arc<Bound>, Generation), CoreError> {
        let mut rx = self.inner.state.subscribe();
        let waited = *rx.borrow_and_update() == SessionState::Authenticating;
        let settled = match rx
            .wait_for(|state| *state != SessionState::Authenticating)
            .await
        {
            Ok(state) => *state,
            Err(_) => SessionState::LoggedOut,
        };
        if settled != SessionState::Active {
            let failure = if waited { self.last_failure() } else { None };
            return Err(failure.unwrap_or(CoreError::NotSignedIn));
        }

        // Generation first: a retire between the two reads then either
        // leaves us with no session or with a generation it has fenced off.
        let generation = self.inner.store.generation();
        let bound = self.inner.current.load_full().ok_or(CoreError::NotSignedIn)?;
        Ok((bound, generation))
    }

    /// Replace `stale` with a fresh session from its stored credentials.
    ///
    /// Callers that lose the race for `auth_lock` pick up the winner's
    /// session or its failure without logging in again.
    async fn reauthenticate(&self, stale: &Arc<Bound>) -> Result<Arc<Bound>, CoreError> {
        let _auth = self.inner.auth_lock.lock().await;

        match self.inner.current.load_full() {
            Some(current) if !Arc::ptr_eq(&current, stale) => {
                debug!("session already renewed by a concurrent caller");
                return Ok(current);
            }
            None => return Err(self.last_failure().unwrap_or(CoreError::NotSignedIn)),
            Some(_) => {}
        }

        let claimed = self.inner.state.send_if_modified(|state| {
            if *state == SessionState::Active {
                *state = SessionState::Authenticating;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(CoreError::NotSignedIn);
        }
        info!("session expired, re-authenticating");

        let grant = match stale.client.login(&stale.credentials.password).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(error = %e, "re-authentication failed");
                let err = CoreError::AuthenticationFailed {
                    message: format!("re-authentication failed: {e}"),
                };
                self.inner.last_failure.store(Some(Arc::new(err.clone())));
                let _ = self.inner.events.send(SessionEvent::AuthenticationFailed {
                    message: err.to_string(),
                });
                self.retire();
                return Err(err);
            }
        };

        let renewed = Arc::new(Bound::new(
            stale.client.clone(),
            stale.credentials.clone(),
            grant,
        ));
        let installed = {
            let expected = Some(Arc::clone(stale));
            let previous = self
                .inner
                .current
                .compare_and_swap(&expected, Some(Arc::clone(&renewed)));
            matches!(&*previous, Some(p) if Arc::ptr_eq(p, stale))
        };
        if !installed {
            // Signed out while the login was on the wire.
            debug!("discarding session renewed after sign-out");
            if let Err(e) = renewed.client.logout(&renewed.sid).await {
                debug!(error = %e, "logout of orphaned session failed");
            }
            return Err(CoreError::NotSignedIn);
        }

        self.inner.state.send_if_modified(|state| {
            if *state == SessionState::Authenticating {
                *state = SessionState::Active;
                true
            } else {
                false
            }
        });
        let _ = self.inner.events.send(SessionEvent::Renewed);
        Ok(renewed)
    }

    /// Drop the session and fence off every response still in flight
    /// for it. Returns the retired session, if there was one.
    fn retire(&self) -> Option<Arc<Bound>> {
        let previous = self.inner.current.swap(None);
        self.inner.store.invalidate();
        self.inner.state.send_replace(SessionState::LoggedOut);
        if previous.is_some() {
            let _ = self.inner.events.send(SessionEvent::SignedOut);
        }
        previous
    }

    fn last_failure(&self) -> Option<CoreError> {
        self.inner.last_failure.load_full().map(|err| (*err).clone())
    }
}
