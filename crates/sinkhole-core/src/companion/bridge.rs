// ── Companion bridge ──
//
// Pushes the cached status to the companion while signed in, holding
// while it is unreachable, and answers its commands one request at a
// time. Nothing is queued for a companion that cannot be answered now.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::{CompanionRequest, CompanionTransport};
use crate::error::CoreError;
use crate::model::{CompanionCommand, CompanionReply};
use crate::router::CommandRouter;
use crate::session::{SessionManager, SessionState};
use crate::store::StatusStore;

/// Relays cached status out to the companion and its commands in to the
/// [`CommandRouter`].
#[derive(Clone)]
pub struct CompanionBridge {
    session: SessionManager,
    store: Arc<StatusStore>,
    router: CommandRouter,
    transport: Arc<dyn CompanionTransport>,
}

impl CompanionBridge {
    pub fn new(
        session: SessionManager,
        store: Arc<StatusStore>,
        router: CommandRouter,
        transport: Arc<dyn CompanionTransport>,
    ) -> Self {
        Self {
            session,
            store,
            router,
            transport,
        }
    }

    /// Execute one companion command and build its reply.
    ///
    /// Refused without any network call unless signed in. On failure the
    /// reply still carries the last known state.
    pub async fn handle(&self, command: CompanionCommand) -> CompanionReply {
        if !self.session.is_active() {
            debug!(?command, "companion command while not signed in");
            return CompanionReply::failed(self.known_active());
        }

        match command {
            CompanionCommand::PauseBlocking { seconds } => {
                match self.router.pause_blocking(seconds).await {
                    Ok(status) => CompanionReply::ok(status.active),
                    Err(e) => {
                        warn!(error = %e, "companion pause failed");
                        CompanionReply::failed(self.known_active())
                    }
                }
            }
        }
    }

    /// Push the cached status once.
    ///
    /// Returns `Ok(false)` when there is nothing to push (signed out or
    /// nothing cached yet), and [`CoreError::CompanionUnreachable`] while
    /// the transport is down.
    pub fn push_status(&self) -> Result<bool, CoreError> {
        if !self.session.is_active() {
            return Ok(false);
        }
        if !self.transport.is_reachable() {
            return Err(CoreError::CompanionUnreachable);
        }
        let Some(status) = self.store.current() else {
            return Ok(false);
        };

        let context =
            serde_json::to_value(status).map_err(|e| CoreError::Internal(e.to_string()))?;
        self.transport.send_context(context)?;
        trace!(active = status.active, "pushed status to companion");
        Ok(true)
    }

    /// Push on `period` until cancelled or signed out.
    pub async fn run_push(self, period: Duration, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut held = false;

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if self.session.state() == SessionState::LoggedOut {
                        debug!("signed out, stopping companion push");
                        break;
                    }
                    match self.push_status() {
                        Ok(_) => {
                            if held {
                                debug!("companion reachable again, resuming pushes");
                            }
                            held = false;
                        }
                        Err(CoreError::CompanionUnreachable) => {
                            if !held {
                                debug!("companion unreachable, holding pushes");
                            }
                            held = true;
                        }
                        Err(e) => warn!(error = %e, "companion push failed"),
                    }
                }
            }
        }
    }

    /// Answer inbound requests until cancelled or every sender is gone.
    pub async fn serve(self, mut rx: mpsc::Receiver<CompanionRequest>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                request = rx.recv() => {
                    let Some(request) = request else { break };
                    let reply = self.handle(request.command).await;
                    if request.reply_tx.send(reply).is_err() {
                        debug!("companion stopped waiting for reply");
                    }
                }
            }
        }
    }

    fn known_active(&self) -> bool {
        self.store.current().is_some_and(|status| status.active)
    }
}
