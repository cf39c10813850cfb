// ── Blocking-state poller ──
//
// Reads the appliance's blocking state on a fixed period while signed in
// and publishes it to the store. One poll is outstanding at most; a
// tick that fires while a poll is still running is skipped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::CoreError;
use crate::model::BlockingStatus;
use crate::session::{SessionManager, SessionState};
use crate::store::StatusStore;

#[derive(Clone)]
pub struct StatusPoller {
    session: SessionManager,
    store: Arc<StatusStore>,
    period: Duration,
}

impl StatusPoller {
    pub fn new(session: SessionManager, store: Arc<StatusStore>, period: Duration) -> Self {
        Self {
            session,
            store,
            period,
        }
    }

    /// Issue one status read and publish the result.
    ///
    /// The write ticket is taken when the request is sent, so a command
    /// accepted while it was in flight keeps precedence.
    pub async fn poll_once(&self) -> Result<BlockingStatus, CoreError> {
        let ticket = self.store.ticket();
        let dispatched = Utc::now();
        let (state, generation) = self
            .session
            .with_session_fenced(|client, sid| async move { client.blocking(&sid).await })
            .await?;

        let status = BlockingStatus::confirmed(state.blocking, dispatched);
        if !self.store.apply(generation, ticket, status) {
            trace!(active = status.active, "poll result not applied");
        }
        Ok(status)
    }

    /// Poll until `cancel` fires or the session ends. The first poll is
    /// issued immediately.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if self.session.state() == SessionState::LoggedOut {
                        debug!("signed out, stopping status poller");
                        break;
                    }
                    let result = tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        result = self.poll_once() => result,
                    };
                    match result {
                        Ok(status) => trace!(active = status.active, "status poll"),
                        Err(e) if self.session.state() == SessionState::LoggedOut => {
                            debug!(error = %e, "session ended during poll, stopping");
                            break;
                        }
                        Err(e) => warn!(error = %e, "status poll failed"),
                    }
                }
            }
        }
    }
}
