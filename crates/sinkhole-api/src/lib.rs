// sinkhole-api: Async Rust client for a DNS sinkhole appliance's REST API

pub mod auth;
pub mod client;
pub mod dns;
pub mod domains;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::SessionId;
pub use client::ApiClient;
pub use error::{Error, ErrorKind};
pub use models::{BlockingState, DomainList, HostInfo, LoginGrant};
pub use transport::{TlsMode, TransportConfig};
