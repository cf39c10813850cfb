// ── Domain model ──
//
// Canonical types shared by the session engine, the command router and
// the companion bridge.

pub mod companion;
pub mod status;

pub use companion::{CompanionCommand, CompanionReply};
pub use sinkhole_api::DomainList;
pub use status::{BlockingStatus, HostIdentity, StatusSource};

/// A domain on its way to (or off) one of the appliance's lists.
///
/// Transient: lives for one add/remove request and is never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEntry {
    pub name: String,
    pub list: DomainList,
}
