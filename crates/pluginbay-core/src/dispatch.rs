//! Delivery context for completions and notifications.
//!
//! Work runs wherever it is cheapest, but every callback a session hands back
//! to its caller goes through a single [`Dispatcher`] so UI-facing code only
//! ever observes results on one thread. The context is either a dedicated
//! thread ([`Dispatcher::spawn`]) or a queue the host's main loop drains
//! ([`Dispatcher::pumped`]).

use crate::error::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Envelope {
    Job(Job),
    Shutdown,
}

/// Sender half of the delivery context. Cloning is cheap.
#[derive(Clone)]
pub struct Dispatcher {
    sender: Sender<Envelope>,
}

/// Owner of a dedicated delivery thread. Stops the thread when dropped.
pub struct DeliveryThread {
    sender: Sender<Envelope>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Receiver half of a pumped delivery context. Jobs run on whichever thread
/// calls [`DispatchPump::run_pending`].
pub struct DispatchPump {
    receiver: Receiver<Envelope>,
}

impl Dispatcher {
    /// Spawn a named thread that runs dispatched jobs in submission order.
    pub fn spawn(name: &str) -> Result<(Self, DeliveryThread)> {
        let (sender, receiver) = crossbeam_channel::unbounded();

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || Self::delivery_thread_main(receiver))?;

        tracing::debug!("Delivery thread '{}' started", name);

        let dispatcher = Self {
            sender: sender.clone(),
        };
        let handle = DeliveryThread {
            sender,
            thread_handle: Some(thread_handle),
        };

        Ok((dispatcher, handle))
    }

    /// Create a delivery context drained manually, e.g. from a UI event loop.
    pub fn pumped() -> (Self, DispatchPump) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, DispatchPump { receiver })
    }

    /// Queue `job` on the delivery context. Returns false if the context is gone.
    pub fn dispatch<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.sender.send(Envelope::Job(Box::new(job))).is_err() {
            tracing::warn!("Delivery context closed, dropping job");
            return false;
        }
        true
    }

    fn delivery_thread_main(receiver: Receiver<Envelope>) {
        while let Ok(envelope) = receiver.recv() {
            match envelope {
                Envelope::Job(job) => job(),
                Envelope::Shutdown => break,
            }
        }
    }
}

impl DeliveryThread {
    pub fn shutdown(&mut self) {
        let _ = self.sender.send(Envelope::Shutdown);

        if let Some(handle) = self.thread_handle.take() {
            // A job dropping the last owner must not join its own thread.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for DeliveryThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl DispatchPump {
    /// Run every job queued so far. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(envelope) = self.receiver.try_recv() {
            if let Envelope::Job(job) = envelope {
                job();
                ran += 1;
            }
        }
        ran
    }

    /// Block up to `timeout` for one job and run it.
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(Envelope::Job(job)) => {
                job();
                true
            }
            Ok(Envelope::Shutdown) => false,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}
