// Allow/deny list endpoints

use serde_json::{Value, json};
use tracing::debug;

use crate::auth::SessionId;
use crate::client::ApiClient;
use crate::error::Error;
use crate::models::DomainList;

/// Substrings the appliance uses when an entry already exists.
const DUPLICATE_MARKERS: [&str; 2] = ["UNIQUE constraint", "already exists"];

impl ApiClient {
    /// Add a domain to a list.
    ///
    /// `POST /api/domains/{list} {domain}`. Some firmware reports per-item
    /// failures inline with a 2xx under `processed.errors`; those are
    /// lifted into an [`Error::Client`] with status 409.
    pub async fn add_domain(
        &self,
        sid: &SessionId,
        list: DomainList,
        domain: &str,
    ) -> Result<(), Error> {
        debug!(%list, domain, "adding domain");
        let path = format!("api/domains/{list}");
        let value = self
            .post(&path, &json!({ "domain": domain }), Some(sid))
            .await?;

        if let Some(message) = first_processed_error(&value) {
            return Err(Error::Client {
                status: 409,
                message,
            });
        }
        Ok(())
    }

    /// Remove a domain from a list.
    ///
    /// `DELETE /api/domains/{list} {domain}`
    pub async fn remove_domain(
        &self,
        sid: &SessionId,
        list: DomainList,
        domain: &str,
    ) -> Result<(), Error> {
        debug!(%list, domain, "removing domain");
        let path = format!("api/domains/{list}");
        self.delete(&path, Some(&json!({ "domain": domain })), sid)
            .await?;
        Ok(())
    }
}

impl Error {
    /// Returns `true` if the appliance refused an add because the entry is
    /// already on the list.
    pub fn is_duplicate_entry(&self) -> bool {
        match self {
            Self::Client { status: 409, .. } => true,
            Self::Client { message, .. } => DUPLICATE_MARKERS.iter().any(|m| message.contains(m)),
            _ => false,
        }
    }
}

fn first_processed_error(value: &Value) -> Option<String> {
    let errors = value.pointer("/processed/errors")?.as_array()?;
    let first = errors.first()?;
    let message = first
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("rejected by appliance");
    Some(match first.get("item").and_then(Value::as_str) {
        Some(item) => format!("{item}: {message}"),
        None => message.to_owned(),
    })
}
