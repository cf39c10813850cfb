// Appliance HTTP client
//
// Wraps `reqwest::Client` with URL construction, session header
// injection, and response classification. Endpoint groups (auth, dns,
// domains) are implemented as inherent methods in separate files to keep
// this module focused on transport mechanics.

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::auth::SessionId;
use crate::error::Error;
use crate::models::ErrorEnvelope;
use crate::transport::TransportConfig;

/// Header carrying the session id on authenticated calls.
pub const SID_HEADER: &str = "X-FTL-SID";

const BODY_PREVIEW_CHARS: usize = 200;

/// Stateless request executor for the appliance REST API.
///
/// Knows nothing about sessions beyond attaching the id it is handed;
/// retry and re-authentication policy live in `sinkhole-core`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for the appliance at `base_url` (e.g. `http://pi.hole`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The appliance base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a full URL for an API path such as `api/dns/blocking`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Send one request and classify the outcome.
    ///
    /// The session id, when given, is attached as the [`SID_HEADER`].
    /// Success bodies are decoded as JSON (an empty body becomes
    /// `Value::Null`); any status of 400 or above becomes an [`Error`].
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        sid: Option<&SessionId>,
    ) -> Result<Value, Error> {
        let url = self.api_url(path)?;
        debug!(%method, %url, authenticated = sid.is_some(), "sending request");

        let mut builder = self.http.request(method, url);
        if let Some(sid) = sid {
            builder = builder.header(SID_HEADER, sid.expose());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        parse_response(resp).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) async fn get(&self, path: &str, sid: &SessionId) -> Result<Value, Error> {
        self.execute(Method::GET, path, None, Some(sid)).await
    }

    pub(crate) async fn post(
        &self,
        path: &str,
        body: &Value,
        sid: Option<&SessionId>,
    ) -> Result<Value, Error> {
        self.execute(Method::POST, path, Some(body), sid).await
    }

    pub(crate) async fn delete(
        &self,
        path: &str,
        body: Option<&Value>,
        sid: &SessionId,
    ) -> Result<Value, Error> {
        self.execute(Method::DELETE, path, body, Some(sid)).await
    }
}

/// Turn a response into JSON or a classified error.
async fn parse_response(resp: reqwest::Response) -> Result<Value, Error> {
    let status = resp.status();
    let body = resp.text().await?;
    trace!(%status, bytes = body.len(), "received response");

    if status.is_success() {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        });
    }

    let message = error_message(status, &body);
    Err(match status.as_u16() {
        401 => Error::Unauthorized { message },
        code @ 500.. => Error::Server {
            status: code,
            message,
        },
        code => Error::Client {
            status: code,
            message,
        },
    })
}

/// Prefer the appliance's structured error, then a body preview, then the
/// canonical reason phrase.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Some(described) = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error)
        .and_then(|err| err.describe())
    {
        return described;
    }

    let preview = preview(body);
    if preview.trim().is_empty() {
        status
            .canonical_reason()
            .map_or_else(|| format!("HTTP {status}"), str::to_owned)
    } else {
        preview
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
