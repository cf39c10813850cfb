// ── Remote facade ──
//
// Bundles the session, poller, router and companion bridge behind one
// handle. The host UI feeds foreground lifecycle into `resume` and
// `suspend`; everything else is commands and subscriptions.

use std::future::Future;
use std::sync::{Arc, PoisonError};

use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::command::{Command, CommandResult};
use crate::companion::{CompanionBridge, CompanionRequest, CompanionTransport};
use crate::config::{Credentials, RemoteConfig};
use crate::credentials::CredentialStore;
use crate::error::CoreError;
use crate::model::{BlockingStatus, DomainList, HostIdentity};
use crate::poller::StatusPoller;
use crate::router::CommandRouter;
use crate::session::{SessionEvent, SessionInfo, SessionManager, SessionState};
use crate::store::StatusStore;
use crate::stream::StatusStream;

const COMPANION_CHANNEL_SIZE: usize = 8;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<RemoteInner>`. Does not sign in on
/// construction; call [`resume()`](Self::resume) or
/// [`sign_in()`](Self::sign_in).
#[derive(Clone)]
pub struct Remote {
    inner: Arc<RemoteInner>,
}

struct RemoteInner {
    config: RemoteConfig,
    store: Arc<StatusStore>,
    session: SessionManager,
    router: CommandRouter,
    poller: StatusPoller,
    bridge: Option<CompanionBridge>,
    credentials: Arc<dyn CredentialStore>,
    companion_tx: Option<mpsc::Sender<CompanionRequest>>,
    companion_rx: std::sync::Mutex<Option<mpsc::Receiver<CompanionRequest>>>,
    cancel: CancellationToken,
    /// Tasks that live for one signed-in stretch.
    activation: Mutex<Activation>,
    /// Tasks that live until `shutdown`.
    background: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

struct Activation {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Remote {
    pub fn new(config: RemoteConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        Self::build(config, credentials, None)
    }

    /// Like [`new`](Self::new), relaying status to and commands from a
    /// companion device over `transport`.
    pub fn with_companion(
        config: RemoteConfig,
        credentials: Arc<dyn CredentialStore>,
        transport: Arc<dyn CompanionTransport>,
    ) -> Self {
        let remote = Self::build(config, credentials, Some(transport));
        remote.serve_companion();
        remote
    }

    fn build(
        config: RemoteConfig,
        credentials: Arc<dyn CredentialStore>,
        transport: Option<Arc<dyn CompanionTransport>>,
    ) -> Self {
        let store = Arc::new(StatusStore::new());
        let session = SessionManager::new(config.transport(), Arc::clone(&store));
        let router = CommandRouter::new(session.clone(), Arc::clone(&store));
        let poller = StatusPoller::new(session.clone(), Arc::clone(&store), config.poll_interval);
        let bridge = transport.map(|transport| {
            CompanionBridge::new(
                session.clone(),
                Arc::clone(&store),
                router.clone(),
                transport,
            )
        });
        let (companion_tx, companion_rx) = if bridge.is_some() {
            let (tx, rx) = mpsc::channel(COMPANION_CHANNEL_SIZE);
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };
        let cancel = CancellationToken::new();

        Self {
            inner: Arc::new(RemoteInner {
                config,
                store,
                session,
                router,
                poller,
                bridge,
                credentials,
                companion_tx,
                companion_rx: std::sync::Mutex::new(companion_rx),
                activation: Mutex::new(Activation {
                    cancel: cancel.child_token(),
                    handles: Vec::new(),
                }),
                cancel,
                background: std::sync::Mutex::new(Vec::new()),
            }),
        }
    }

    // ── Foreground lifecycle ─────────────────────────────────────

    /// The app came to the foreground: sign in with the stored
    /// credentials and start polling.
    pub async fn resume(&self) -> Result<(), CoreError> {
        let Some(credentials) = self.inner.credentials.load()? else {
            debug!("no stored credentials, staying signed out");
            return Err(CoreError::NotSignedIn);
        };
        self.start(credentials).await
    }

    /// Sign in with freshly entered credentials. They are saved to the
    /// credential store only once the appliance has accepted them.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<(), CoreError> {
        self.start(credentials.clone()).await?;
        self.inner.credentials.save(&credentials)?;
        Ok(())
    }

    /// The app left the foreground: stop background work, then sign out.
    pub async fn suspend(&self) {
        let handles = {
            let mut activation = self.inner.activation.lock().await;
            activation.cancel.cancel();
            std::mem::take(&mut activation.handles)
        };
        for handle in handles {
            let _ = handle.await;
        }
        self.inner.session.deactivate().await;
        info!("suspended");
    }

    /// Suspend and stop serving companion requests. The handle is inert
    /// afterwards.
    pub async fn shutdown(&self) {
        self.suspend().await;
        self.inner.cancel.cancel();
        let handles = std::mem::take(
            &mut *self
                .inner
                .background
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            let _ = handle.await;
        }
        debug!("shut down");
    }

    async fn start(&self, credentials: Credentials) -> Result<(), CoreError> {
        self.serve_companion();
        self.inner.session.activate(credentials).await?;
        self.spawn_tasks().await;
        Ok(())
    }

    /// Start answering companion requests, signed in or not. Runs once,
    /// on the first call made inside a Tokio runtime.
    fn serve_companion(&self) {
        let Some(bridge) = self.inner.bridge.clone() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no runtime yet, companion serving deferred");
            return;
        };
        let rx = self
            .inner
            .companion_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(rx) = rx else {
            return;
        };

        let handle = runtime.spawn(bridge.serve(rx, self.inner.cancel.clone()));
        self.inner
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    async fn spawn_tasks(&self) {
        let mut activation = self.inner.activation.lock().await;
        if activation.handles.iter().any(|h| !h.is_finished()) {
            debug!("background tasks already running");
            return;
        }
        activation.handles.clear();
        activation.cancel = self.inner.cancel.child_token();

        let poll_interval = self.inner.config.poll_interval;
        if !poll_interval.is_zero() {
            let poller = self.inner.poller.clone();
            let cancel = activation.cancel.clone();
            activation.handles.push(tokio::spawn(poller.run(cancel)));
        }

        let push_interval = self.inner.config.companion_push_interval;
        let bridge = self.inner.bridge.clone().filter(|_| !push_interval.is_zero());
        if let Some(bridge) = bridge {
            let cancel = activation.cancel.clone();
            activation
                .handles
                .push(tokio::spawn(bridge.run_push(push_interval, cancel)));
        }
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// Resume, run the closure, suspend.
    ///
    /// Intended for the CLI: background polling and pushes are disabled,
    /// callers use [`refresh()`](Self::refresh) for a single read.
    pub async fn oneshot<F, Fut, T>(
        config: RemoteConfig,
        credentials: Arc<dyn CredentialStore>,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(Remote) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let remote = Remote::new(config.foreground_only(), credentials);
        remote.resume().await?;
        let result = f(remote.clone()).await;
        remote.suspend().await;
        result
    }

    // ── Commands ─────────────────────────────────────────────────

    pub async fn execute(&self, command: Command) -> Result<CommandResult, CoreError> {
        self.inner.router.execute(command).await
    }

    pub async fn pause_blocking(&self, seconds: u32) -> Result<BlockingStatus, CoreError> {
        self.inner.router.pause_blocking(seconds).await
    }

    pub async fn add_domain(&self, domain: &str, list: DomainList) -> Result<(), CoreError> {
        self.inner.router.add_domain(domain, list).await
    }

    pub async fn remove_domain(&self, domain: &str, list: DomainList) -> Result<(), CoreError> {
        self.inner.router.remove_domain(domain, list).await
    }

    /// Read the blocking state now, outside the poll schedule.
    pub async fn refresh(&self) -> Result<BlockingStatus, CoreError> {
        self.inner.poller.poll_once().await
    }

    // ── State observation ────────────────────────────────────────

    pub fn config(&self) -> &RemoteConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<StatusStore> {
        &self.inner.store
    }

    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    pub fn status(&self) -> StatusStream {
        self.inner.store.stream()
    }

    pub fn current_status(&self) -> Option<BlockingStatus> {
        self.inner.store.current()
    }

    pub fn host(&self) -> Option<HostIdentity> {
        self.inner.store.host()
    }

    pub fn session_state(&self) -> watch::Receiver<SessionState> {
        self.inner.session.watch_state()
    }

    pub fn session_info(&self) -> Option<SessionInfo> {
        self.inner.session.info()
    }

    /// Subscribe to session events. An `AuthenticationFailed` means the
    /// UI should ask for credentials again.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.session.events()
    }

    /// Sender for inbound companion requests. `None` when the remote was
    /// built without a companion transport.
    ///
    /// Requests are answered straight away; while signed out the reply
    /// is a failure.
    pub fn companion_requests(&self) -> Option<mpsc::Sender<CompanionRequest>> {
        self.serve_companion();
        self.inner.companion_tx.clone()
    }

    pub fn bridge(&self) -> Option<&CompanionBridge> {
        self.inner.bridge.as_ref()
    }
}
