// DNS blocking endpoints

use serde_json::json;
use tracing::debug;

use crate::auth::SessionId;
use crate::client::ApiClient;
use crate::error::Error;
use crate::models::BlockingState;

impl ApiClient {
    /// Current filtering state.
    ///
    /// `GET /api/dns/blocking`
    pub async fn blocking(&self, sid: &SessionId) -> Result<BlockingState, Error> {
        let value = self.get("api/dns/blocking", sid).await?;
        serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: value.to_string(),
        })
    }

    /// Switch filtering on or off, optionally reverting after `timer` seconds.
    ///
    /// `POST /api/dns/blocking {blocking, timer}`
    pub async fn set_blocking(
        &self,
        sid: &SessionId,
        blocking: bool,
        timer: Option<u32>,
    ) -> Result<(), Error> {
        debug!(blocking, ?timer, "setting blocking state");
        let body = json!({ "blocking": blocking, "timer": timer });
        self.post("api/dns/blocking", &body, Some(sid)).await?;
        Ok(())
    }
}
