//! Caller-side cancellation of a reply stream.
//!
//! There is no separate cancel path: aborting makes the transport yield
//! [`ChatError::Aborted`], which flows through the normal error handling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_stream::stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::sync::Notify;

use crate::error::ChatError;

/// Cloneable handle that aborts the transport it was attached to.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    inner: Arc<AbortInner>,
}

#[derive(Debug, Default)]
struct AbortInner {
    aborted: AtomicBool,
    notify: Notify,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.inner.aborted.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::SeqCst)
    }

    /// Resolves once `abort` has been called.
    pub async fn aborted(&self) {
        loop {
            // Registered before the flag check so a concurrent abort is not missed.
            let notified = self.inner.notify.notified();
            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }
}

/// Wrap a byte stream so that aborting the handle ends it with an error.
pub fn abortable<S, E>(
    inner: S,
    handle: AbortHandle,
) -> impl Stream<Item = Result<Bytes, ChatError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin,
    E: Into<ChatError> + Send,
{
    stream! {
        let mut inner = inner;
        loop {
            let next = tokio::select! {
                biased;
                _ = handle.aborted() => None,
                item = inner.next() => Some(item),
            };

            match next {
                None => {
                    yield Err(ChatError::Aborted);
                    return;
                }
                Some(Some(item)) => yield item.map_err(Into::into),
                Some(None) => return,
            }
        }
    }
}
