// ── Companion device relay ──
//
// The companion has no network path to the appliance. It sees filtering
// state only through what this side pushes, and acts only through
// commands this side executes on its behalf.

mod bridge;
mod channel;

pub use bridge::CompanionBridge;
pub use channel::{ChannelTransport, channel_transport};

use tokio::sync::oneshot;

use crate::error::CoreError;
use crate::model::{CompanionCommand, CompanionReply};

/// Outbound link to the companion device.
///
/// Delivery is best-effort. Implementations report reachability
/// synchronously; the bridge never pushes while unreachable.
pub trait CompanionTransport: Send + Sync {
    fn is_reachable(&self) -> bool;

    /// Fire-and-forget delivery of an application context.
    fn send_context(&self, context: serde_json::Value) -> Result<(), CoreError>;
}

/// An inbound companion command with its reply slot.
///
/// The slot is answered exactly once; dropping the request unanswered
/// closes the channel, which the sender sees as a failure.
pub struct CompanionRequest {
    pub command: CompanionCommand,
    pub reply_tx: oneshot::Sender<CompanionReply>,
}

impl CompanionRequest {
    pub fn new(command: CompanionCommand) -> (Self, oneshot::Receiver<CompanionReply>) {
        let (reply_tx, reply_rx) = oneshot::channel();
        (Self { command, reply_tx }, reply_rx)
    }
}
