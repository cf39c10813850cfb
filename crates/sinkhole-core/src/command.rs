// ── Command API ──
//
// Every write against the appliance is a `Command`. The router validates
// it, enforces one-in-flight-per-kind, and applies the optimistic cache
// update on acceptance.

use strum::Display;

use crate::model::{BlockingStatus, DomainEntry, DomainList};

/// All write operations the remote can perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Disable filtering for `seconds`, after which the appliance
    /// re-enables it on its own.
    PauseBlocking { seconds: u32 },
    AddDomain(DomainEntry),
    RemoveDomain(DomainEntry),
}

impl Command {
    pub fn add_domain(name: impl Into<String>, list: DomainList) -> Self {
        Self::AddDomain(DomainEntry {
            name: name.into(),
            list,
        })
    }

    pub fn remove_domain(name: impl Into<String>, list: DomainList) -> Self {
        Self::RemoveDomain(DomainEntry {
            name: name.into(),
            list,
        })
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Self::PauseBlocking { .. } => CommandKind::PauseBlocking,
            Self::AddDomain(_) => CommandKind::AddDomain,
            Self::RemoveDomain(_) => CommandKind::RemoveDomain,
        }
    }
}

/// Discriminant used for the in-flight guard and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum CommandKind {
    PauseBlocking,
    AddDomain,
    RemoveDomain,
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    /// The optimistic status written on acceptance.
    Blocking(BlockingStatus),
}
