// ── Command routing ──
//
// Turns user intent into appliance calls. Inputs are checked locally
// first; nothing invalid reaches the network. At most one command of
// each kind is in flight.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashSet;
use tracing::{debug, info};

use crate::command::{Command, CommandKind, CommandResult};
use crate::error::CoreError;
use crate::model::{BlockingStatus, DomainEntry, DomainList};
use crate::session::SessionManager;
use crate::store::StatusStore;

#[derive(Clone)]
pub struct CommandRouter {
    session: SessionManager,
    store: Arc<StatusStore>,
    in_flight: Arc<DashSet<CommandKind>>,
}

/// Releases the in-flight slot for its kind on drop.
struct InFlight<'a> {
    set: &'a DashSet<CommandKind>,
    kind: CommandKind,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.kind);
    }
}

impl CommandRouter {
    pub fn new(session: SessionManager, store: Arc<StatusStore>) -> Self {
        Self {
            session,
            store,
            in_flight: Arc::new(DashSet::new()),
        }
    }

    /// Route a [`Command`] to the matching operation.
    pub async fn execute(&self, command: Command) -> Result<CommandResult, CoreError> {
        match command {
            Command::PauseBlocking { seconds } => self
                .pause_blocking(seconds)
                .await
                .map(CommandResult::Blocking),
            Command::AddDomain(DomainEntry { name, list }) => {
                self.add_domain(&name, list).await?;
                Ok(CommandResult::Ok)
            }
            Command::RemoveDomain(DomainEntry { name, list }) => {
                self.remove_domain(&name, list).await?;
                Ok(CommandResult::Ok)
            }
        }
    }

    /// Disable filtering for `seconds`.
    ///
    /// On acceptance the cache is set to inactive right away, ahead of
    /// the next poll. Returns that optimistic status.
    pub async fn pause_blocking(&self, seconds: u32) -> Result<BlockingStatus, CoreError> {
        if seconds == 0 {
            return Err(CoreError::ValidationFailed {
                message: "pause duration must be at least one second".into(),
            });
        }
        let _slot = self.claim(CommandKind::PauseBlocking)?;

        let ((), generation) = self
            .session
            .with_session_fenced(move |client, sid| async move {
                client.set_blocking(&sid, false, Some(seconds)).await
            })
            .await?;

        let ticket = self.store.ticket();
        let status = BlockingStatus::optimistic(false, Utc::now());
        if !self.store.apply(generation, ticket, status) {
            debug!("session ended before pause was recorded");
        }
        info!(seconds, "blocking paused");
        Ok(status)
    }

    /// Add `domain` to `list`. An entry already present is reported as
    /// [`CoreError::DomainConflict`].
    pub async fn add_domain(&self, domain: &str, list: DomainList) -> Result<(), CoreError> {
        let domain = validate_domain(domain)?;
        let _slot = self.claim(CommandKind::AddDomain)?;

        let added = self
            .session
            .with_session(|client, sid| {
                let domain = domain.to_owned();
                async move {
                    match client.add_domain(&sid, list, &domain).await {
                        Ok(()) => Ok(true),
                        Err(e) if e.is_duplicate_entry() => Ok(false),
                        Err(e) => Err(e),
                    }
                }
            })
            .await?;

        if !added {
            return Err(CoreError::DomainConflict {
                domain: domain.to_owned(),
                list,
            });
        }
        info!(domain, %list, "domain added");
        Ok(())
    }

    /// Remove `domain` from `list`.
    pub async fn remove_domain(&self, domain: &str, list: DomainList) -> Result<(), CoreError> {
        let domain = validate_domain(domain)?;
        let _slot = self.claim(CommandKind::RemoveDomain)?;

        self.session
            .with_session(|client, sid| {
                let domain = domain.to_owned();
                async move { client.remove_domain(&sid, list, &domain).await }
            })
            .await?;

        info!(domain, %list, "domain removed");
        Ok(())
    }

    fn claim(&self, kind: CommandKind) -> Result<InFlight<'_>, CoreError> {
        if !self.in_flight.insert(kind) {
            debug!(%kind, "rejecting overlapping command");
            return Err(CoreError::CommandInFlight { kind });
        }
        Ok(InFlight {
            set: &self.in_flight,
            kind,
        })
    }
}

/// Reject names that cannot be a domain.
///
/// The appliance accepts wildcards and regex fragments on some lists, so
/// this only rules out the empty string and whitespace.
pub fn validate_domain(domain: &str) -> Result<&str, CoreError> {
    if domain.is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "domain must not be empty".into(),
        });
    }
    if domain.chars().any(char::is_whitespace) {
        return Err(CoreError::ValidationFailed {
            message: format!("'{}' contains whitespace", domain.escape_debug()),
        });
    }
    Ok(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_domain_accepts_plain_names() {
        assert_eq!(validate_domain("ads.example.com").ok(), Some("ads.example.com"));
    }

    #[test]
    fn validate_domain_rejects_blank_and_inner_whitespace() {
        assert!(matches!(
            validate_domain("   "),
            Err(CoreError::ValidationFailed { .. })
        ));
        assert!(matches!(
            validate_domain("ads example.com"),
            Err(CoreError::ValidationFailed { .. })
        ));
        assert!(matches!(
            validate_domain("ads.example.com\n"),
            Err(CoreError::ValidationFailed { .. })
        ));
        assert!(matches!(
            validate_domain(""),
            Err(CoreError::ValidationFailed { .. })
        ));
    }
}
