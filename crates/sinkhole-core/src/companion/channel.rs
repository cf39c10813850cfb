// In-process companion transport.
//
// Pairs with whatever actually talks to the device (a platform bridge,
// a test): contexts go out through an mpsc channel and reachability is
// toggled by the owner.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use super::CompanionTransport;
use crate::error::CoreError;

/// A [`CompanionTransport`] that hands contexts to an mpsc receiver.
#[derive(Clone)]
pub struct ChannelTransport {
    reachable: Arc<AtomicBool>,
    outbound: mpsc::UnboundedSender<serde_json::Value>,
}

/// Create a transport and the receiver its contexts arrive on. Starts
/// reachable.
pub fn channel_transport() -> (ChannelTransport, mpsc::UnboundedReceiver<serde_json::Value>) {
    let (outbound, rx) = mpsc::unbounded_channel();
    let transport = ChannelTransport {
        reachable: Arc::new(AtomicBool::new(true)),
        outbound,
    };
    (transport, rx)
}

impl ChannelTransport {
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Release);
    }
}

impl CompanionTransport for ChannelTransport {
    fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Acquire) && !self.outbound.is_closed()
    }

    fn send_context(&self, context: serde_json::Value) -> Result<(), CoreError> {
        if !self.reachable.load(Ordering::Acquire) {
            return Err(CoreError::CompanionUnreachable);
        }
        self.outbound
            .send(context)
            .map_err(|_| CoreError::CompanionUnreachable)
    }
}
