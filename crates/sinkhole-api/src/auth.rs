// Session authentication
//
// Password login issues a session id; every later call carries it in a
// header until logout or server-side expiry.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{HostInfo, LoginGrant, LoginResponse};

/// Server-issued session id.
///
/// Wraps a [`SecretString`] so it never shows up in `Debug` output and is
/// zeroized on drop. Deliberately not `Serialize`.
#[derive(Clone)]
pub struct SessionId(SecretString);

impl SessionId {
    /// The raw id, for the request header only.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<String> for SessionId {
    fn from(sid: String) -> Self {
        Self(SecretString::from(sid))
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionId([REDACTED])")
    }
}

impl ApiClient {
    /// Authenticate with the appliance password.
    ///
    /// `POST /api/auth {password}`. A 401 means the password was wrong;
    /// a success body without a session id is treated the same way.
    pub async fn login(&self, password: &SecretString) -> Result<LoginGrant, Error> {
        debug!(base_url = %self.base_url(), "logging in");

        let body = json!({ "password": password.expose_secret() });
        let value = self.post("api/auth", &body, None).await?;

        let resp: LoginResponse =
            serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: value.to_string(),
            })?;
        let grant = resp
            .into_grant()
            .map_err(|message| Error::Unauthorized { message })?;

        debug!(validity = ?grant.validity, "login successful");
        Ok(grant)
    }

    /// End the session.
    ///
    /// `DELETE /api/auth`. The endpoint is idempotent: a 401 or 404 from a
    /// session that is already gone counts as success.
    pub async fn logout(&self, sid: &SessionId) -> Result<(), Error> {
        debug!("logging out");
        match self.delete("api/auth", None, sid).await {
            Ok(_) => {}
            Err(e) if e.is_unauthorized() || e.is_not_found() => {
                debug!("session already gone at logout");
            }
            Err(e) => return Err(e),
        }
        debug!("logout complete");
        Ok(())
    }

    /// Fetch the appliance's hostname.
    ///
    /// `GET /api/info/host`
    pub async fn host_info(&self, sid: &SessionId) -> Result<HostInfo, Error> {
        let value = self.get("api/info/host", sid).await?;
        HostInfo::from_value(&value).ok_or_else(|| Error::Deserialization {
            message: "host info response carries no hostname".into(),
            body: value.to_string(),
        })
    }
}
