// ── Reactive status stream ──
//
// Subscription type for consuming blocking-state changes from the store.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::BlockingStatus;

/// A subscription to the cached blocking state.
///
/// Provides both point-in-time access and change notification via
/// [`changed()`](Self::changed) or by converting into a `Stream`.
pub struct StatusStream {
    current: Option<BlockingStatus>,
    receiver: watch::Receiver<Option<BlockingStatus>>,
}

impl StatusStream {
    pub(crate) fn new(receiver: watch::Receiver<Option<BlockingStatus>>) -> Self {
        let current = *receiver.borrow();
        Self { current, receiver }
    }

    /// The value captured at creation or at the last `changed()`.
    pub fn current(&self) -> Option<BlockingStatus> {
        self.current
    }

    /// The latest value (may have changed since `current`).
    pub fn latest(&self) -> Option<BlockingStatus> {
        *self.receiver.borrow()
    }

    /// Wait for the next change. Returns `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<Option<BlockingStatus>> {
        self.receiver.changed().await.ok()?;
        let next = *self.receiver.borrow_and_update();
        self.current = next;
        Some(next)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The first item is the value at conversion time.
    pub fn into_stream(self) -> StatusWatchStream {
        StatusWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct StatusWatchStream {
    inner: WatchStream<Option<BlockingStatus>>,
}

impl Stream for StatusWatchStream {
    type Item = Option<BlockingStatus>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
