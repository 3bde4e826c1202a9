// ── Snapshot subscriptions ──
//
// Consumers either poll `latest()`, await `changed()`, or turn the
// subscription into a `Stream`; all of them only ever observe whole,
// published passes.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::RouterSnapshot;

/// A subscription to published router snapshots.
pub struct SnapshotStream {
    current: Arc<RouterSnapshot>,
    receiver: watch::Receiver<Arc<RouterSnapshot>>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<RouterSnapshot>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<RouterSnapshot> {
        &self.current
    }

    /// The latest published snapshot.
    pub fn latest(&self) -> Arc<RouterSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published pass.
    /// Returns `None` once the monitor has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<RouterSnapshot>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Consume the subscription as a `Stream` of the passes published after
    /// this point.
    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::from_changes(self.receiver),
        }
    }
}

/// `Stream` adapter yielding each newly published snapshot.
pub struct SnapshotWatchStream {
    inner: WatchStream<Arc<RouterSnapshot>>,
}

impl Stream for SnapshotWatchStream {
    type Item = Arc<RouterSnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
