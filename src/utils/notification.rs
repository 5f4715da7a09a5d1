use std::{
    future::poll_fn,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    task::Poll,
};

use futures::task::AtomicWaker;

/// Single waiter notification that can be signalled from interrupt context. The
/// notification is sticky: a notify that happens before `wait` is polled is not lost.
pub struct Notification {
    inner: Arc<Shared>,
}

/// Signalling half of a [Notification]. Cheap to clone into interrupt callbacks.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Shared>,
}

struct Shared {
    notified: AtomicBool,
    waker: AtomicWaker,
}

impl Notification {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Shared {
                notified: AtomicBool::new(false),
                waker: AtomicWaker::new(),
            }),
        }
    }

    /// Resolves once a notifier has signalled since the last wait or reset
    pub async fn wait(&self) {
        poll_fn(|cx| {
            self.inner.waker.register(cx.waker());
            if self.inner.notified.swap(false, Ordering::AcqRel) {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }

    /// Drops a pending notification, if any
    pub fn reset(&self) {
        self.inner.notified.store(false, Ordering::Release);
    }

    pub fn notifier(&self) -> Notifier {
        Notifier::from(self)
    }
}

impl Default for Notification {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&Notification> for Notifier {
    fn from(value: &Notification) -> Self {
        Self {
            inner: value.inner.clone(),
        }
    }
}

impl Notifier {
    /// Marks the notification and wakes the task waiting on it. Lock free, safe to call
    /// from an interrupt handler.
    pub fn notify(&self) {
        self.inner.notified.store(true, Ordering::Release);
        self.inner.waker.wake();
    }
}
