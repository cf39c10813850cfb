// Wire models for the appliance REST API.
//
// Firmware revisions disagree on a few shapes (flat vs nested login
// payloads, boolean vs word blocking flags), so the decoders here accept
// both and normalize before anything leaves the crate.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::auth::SessionId;

// ── Login ───────────────────────────────────────────────────────────

/// Result of a successful `POST /api/auth`.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub sid: SessionId,
    /// Server-side idle validity, when the appliance reports one.
    pub validity: Option<Duration>,
}

/// `{"session": {"valid": true, "sid": "...", "validity": 1800}}` or a
/// flat `{"sid": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    session: Option<SessionPayload>,
    sid: Option<String>,
    validity: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SessionPayload {
    sid: Option<String>,
    validity: Option<u64>,
    message: Option<String>,
}

impl LoginResponse {
    /// Extract the session id, or the server's reason for not issuing one.
    pub(crate) fn into_grant(self) -> Result<LoginGrant, String> {
        let (sid, validity, message) = match self.session {
            Some(session) => (session.sid, session.validity, session.message),
            None => (self.sid, self.validity, None),
        };

        match sid.filter(|s| !s.is_empty()) {
            Some(sid) => Ok(LoginGrant {
                sid: SessionId::from(sid),
                validity: validity.map(Duration::from_secs),
            }),
            None => Err(message.unwrap_or_else(|| "no session id issued".into())),
        }
    }
}

// ── Host info ───────────────────────────────────────────────────────

/// Identity of the appliance, shown alongside the blocking state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostInfo {
    pub hostname: String,
}

impl HostInfo {
    /// Pull the hostname out of `GET /api/info/host`.
    ///
    /// Accepts `{"hostname": ".."}` and the nested
    /// `{"host": {"uname": {"nodename": ".."}}}` form.
    pub(crate) fn from_value(value: &serde_json::Value) -> Option<Self> {
        value
            .get("hostname")
            .or_else(|| value.pointer("/host/uname/nodename"))
            .and_then(serde_json::Value::as_str)
            .map(|h| Self {
                hostname: h.to_owned(),
            })
    }
}

// ── Blocking ────────────────────────────────────────────────────────

/// `GET /api/dns/blocking` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockingState {
    #[serde(deserialize_with = "blocking_flag")]
    pub blocking: bool,
    /// Seconds until a timed pause ends, if one is running.
    #[serde(default)]
    pub timer: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Word(String),
}

fn blocking_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match RawFlag::deserialize(deserializer)? {
        RawFlag::Bool(b) => Ok(b),
        RawFlag::Word(w) => match w.as_str() {
            "enabled" => Ok(true),
            "disabled" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "unknown blocking state '{other}'"
            ))),
        },
    }
}

// ── Domains ─────────────────────────────────────────────────────────

/// Which domain list an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainList {
    Allow,
    Deny,
}

impl DomainList {
    /// Path segment under `/api/domains/`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl fmt::Display for DomainList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Errors ──────────────────────────────────────────────────────────

/// The appliance reports failures as `{"error": {"key", "message", "hint"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub key: Option<String>,
    pub message: Option<String>,
    pub hint: Option<serde_json::Value>,
}

impl ErrorBody {
    pub(crate) fn describe(&self) -> Option<String> {
        let message = self.message.clone().or_else(|| self.key.clone())?;
        match self.hint.as_ref().and_then(serde_json::Value::as_str) {
            Some(hint) => Some(format!("{message} ({hint})")),
            None => Some(message),
        }
    }
}
