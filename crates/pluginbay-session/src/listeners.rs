//! Preset change listener registry.

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use pluginbay_core::PresetChangeEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handle returned by [`crate::SessionManager::add_listener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Arc<dyn Fn(&PresetChangeEvent) + Send + Sync>;

#[derive(Clone)]
enum Listener {
    Callback(Callback),
    Channel(Sender<PresetChangeEvent>),
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub(crate) fn add<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&PresetChangeEvent) + Send + Sync + 'static,
    {
        self.insert(Listener::Callback(Arc::new(callback)))
    }

    /// Unbounded stream of events. Dropping the receiver unregisters it on the
    /// next emit.
    pub(crate) fn stream(&self) -> Receiver<PresetChangeEvent> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.insert(Listener::Channel(sender));
        receiver
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Deliver `event` to every listener, in registration order.
    pub(crate) fn emit(&self, event: &PresetChangeEvent) {
        // Call out without the lock so listeners may (un)register.
        let snapshot: Vec<(ListenerId, Listener)> = self.listeners.lock().clone();

        let mut closed = Vec::new();
        for (id, listener) in snapshot {
            match listener {
                Listener::Callback(callback) => callback(event),
                Listener::Channel(sender) => {
                    if sender.send(event.clone()).is_err() {
                        closed.push(id);
                    }
                }
            }
        }

        if !closed.is_empty() {
            self.listeners
                .lock()
                .retain(|(id, _)| !closed.contains(id));
        }
    }

    fn insert(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        id
    }
}
