// sinkhole-core: Session lifecycle, status cache and command routing between
// sinkhole-api and consumers (CLI, app shells, companion devices).

pub mod command;
pub mod companion;
pub mod config;
pub mod credentials;
pub mod error;
pub mod model;
pub mod poller;
pub mod remote;
pub mod router;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandKind, CommandResult};
pub use companion::{
    ChannelTransport, CompanionBridge, CompanionRequest, CompanionTransport, channel_transport,
};
pub use config::{
    Credentials, DEFAULT_COMPANION_PUSH_INTERVAL, DEFAULT_POLL_INTERVAL, RemoteConfig,
    TlsVerification,
};
pub use credentials::{CredentialStore, MemoryCredentialStore};
pub use error::CoreError;
pub use poller::StatusPoller;
pub use remote::Remote;
pub use router::{CommandRouter, validate_domain};
pub use session::{SessionEvent, SessionInfo, SessionManager, SessionState};
pub use store::{Generation, StatusStore, Ticket};
pub use stream::{StatusStream, StatusWatchStream};

pub use model::{
    BlockingStatus, CompanionCommand, CompanionReply, DomainEntry, DomainList, HostIdentity,
    StatusSource,
};
