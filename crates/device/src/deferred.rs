//! Work scheduled from any thread and run on the device's owning thread.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use glhal_native::Platform;
use std::fmt;

/// Action run against the platform at the next safe point.
pub type DeferredAction = Box<dyn FnOnce(&mut dyn Platform) + Send>;

/// Cloneable handle for scheduling actions onto the owning thread.
#[derive(Clone)]
pub struct DeferredQueue {
    sender: Sender<DeferredAction>,
}

impl fmt::Debug for DeferredQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredQueue")
            .field("pending", &self.sender.len())
            .finish()
    }
}

impl DeferredQueue {
    /// Queue `action`. Returns `false`, dropping the action unrun, when the
    /// device is already gone.
    pub fn schedule(&self, action: impl FnOnce(&mut dyn Platform) + Send + 'static) -> bool {
        self.sender.send(Box::new(action)).is_ok()
    }

    pub fn pending(&self) -> usize {
        self.sender.len()
    }
}

/// Receiving end, kept inside the device.
pub(crate) struct DeferredActions {
    receiver: Receiver<DeferredAction>,
}

pub(crate) fn channel() -> (DeferredQueue, DeferredActions) {
    let (sender, receiver) = crossbeam_channel::unbounded();
    (DeferredQueue { sender }, DeferredActions { receiver })
}

impl DeferredActions {
    /// Run everything queued so far, including actions queued by the
    /// actions themselves.
    pub(crate) fn drain(&self, platform: &mut dyn Platform) -> usize {
        let mut ran = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(action) => {
                    action(platform);
                    ran += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        if ran > 0 {
            tracing::debug!("ran {ran} deferred actions");
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glhal_native::testing::FakePlatform;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn actions_run_in_order_on_drain() {
        let (queue, actions) = channel();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            assert!(queue.schedule(move |_| order.lock().push(i)));
        }
        assert_eq!(queue.pending(), 3);

        let mut platform = FakePlatform::new();
        assert_eq!(actions.drain(&mut platform), 3);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
        assert_eq!(actions.drain(&mut platform), 0);
    }

    #[test]
    fn scheduling_from_another_thread() {
        let (queue, actions) = channel();
        let hits = Arc::new(AtomicUsize::new(0));
        std::thread::scope(|s| {
            let queue = queue.clone();
            let hits = hits.clone();
            s.spawn(move || {
                queue.schedule(move |platform| {
                    platform.show_cursor(false);
                    hits.fetch_add(1, Ordering::SeqCst);
                })
            });
        });
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let mut platform = FakePlatform::new();
        actions.drain(&mut platform);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!platform.state().cursor_visible);
    }

    #[test]
    fn schedule_fails_once_receiver_is_gone() {
        let (queue, actions) = channel();
        drop(actions);
        assert!(!queue.schedule(|_| {}));
    }
}
