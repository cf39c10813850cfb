// Secure-store boundary. The platform keeps server URL and password; the
// core only ever asks for them at sign-in and hands them back after a
// successful one.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::config::Credentials;
use crate::error::CoreError;

pub trait CredentialStore: Send + Sync {
    fn save(&self, credentials: &Credentials) -> Result<(), CoreError>;

    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Credentials>, CoreError>;
}

/// Keeps credentials in memory for the life of the process.
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: ArcSwapOption<Credentials>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(credentials: Credentials) -> Self {
        Self {
            slot: ArcSwapOption::from_pointee(credentials),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, credentials: &Credentials) -> Result<(), CoreError> {
        self.slot.store(Some(Arc::new(credentials.clone())));
        Ok(())
    }

    fn load(&self) -> Result<Option<Credentials>, CoreError> {
        Ok(self.slot.load_full().map(|c| (*c).clone()))
    }
}
