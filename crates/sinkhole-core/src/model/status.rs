use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

/// Which writer produced the cached blocking state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StatusSource {
    /// Read back from the appliance by a poll.
    Confirmed,
    /// Written on command acceptance, ahead of the next poll.
    Optimistic,
}

/// Cached snapshot of whether filtering is active.
///
/// `as_of` is the instant the value was known to hold: the dispatch time
/// of the poll that read it, or the acceptance time of the command that
/// set it. Writes are ordered by the store's tickets; `as_of` is for
/// display and never moves backwards in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingStatus {
    pub active: bool,
    pub as_of: DateTime<Utc>,
    pub source: StatusSource,
}

impl BlockingStatus {
    pub fn confirmed(active: bool, as_of: DateTime<Utc>) -> Self {
        Self {
            active,
            as_of,
            source: StatusSource::Confirmed,
        }
    }

    pub fn optimistic(active: bool, as_of: DateTime<Utc>) -> Self {
        Self {
            active,
            as_of,
            source: StatusSource::Optimistic,
        }
    }

    pub fn is_optimistic(&self) -> bool {
        self.source == StatusSource::Optimistic
    }
}

/// The appliance's hostname, fetched once per sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostIdentity {
    pub hostname: String,
}

impl From<sinkhole_api::HostInfo> for HostIdentity {
    fn from(info: sinkhole_api::HostInfo) -> Self {
        Self {
            hostname: info.hostname,
        }
    }
}
