// Wire types exchanged with the companion device.

use serde::{Deserialize, Serialize};

/// A command originated on the companion device.
///
/// Wire form: `{"kind": "pauseBlocking", "seconds": 30}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CompanionCommand {
    PauseBlocking { seconds: u32 },
}

/// The single answer to a [`CompanionCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionReply {
    pub success: bool,
    /// Filtering state as the primary device knows it after the command.
    pub active: bool,
}

impl CompanionReply {
    pub fn ok(active: bool) -> Self {
        Self {
            success: true,
            active,
        }
    }

    pub fn failed(active: bool) -> Self {
        Self {
            success: false,
            active,
        }
    }
}
