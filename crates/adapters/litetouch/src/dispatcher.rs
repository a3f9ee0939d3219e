//! Signal-keyed fan-out of decoded frames.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::protocol::Frame;

/// Receiving end of a [`Dispatcher::subscribe`] call.
///
/// Dropping it unsubscribes; the dispatcher prunes it on the next dispatch.
#[derive(Debug)]
pub struct Subscription {
    signal: String,
    receiver: mpsc::UnboundedReceiver<Frame>,
}

impl Subscription {
    #[must_use]
    pub fn signal(&self) -> &str {
        &self.signal
    }

    /// Wait for the next frame. Returns `None` once the dispatcher is gone.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.receiver.recv().await
    }

    /// Take a frame that has already been delivered, without waiting.
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.receiver.try_recv().ok()
    }
}

/// Delivers frames to every subscriber of a signal.
#[derive(Debug, Default)]
pub struct Dispatcher {
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Frame>>>>,
}

impl Dispatcher {
    /// Register interest in `signal`.
    pub fn subscribe(&self, signal: impl Into<String>) -> Subscription {
        let signal = signal.into();
        let (sender, receiver) = mpsc::unbounded_channel();
        self.lock().entry(signal.clone()).or_default().push(sender);
        Subscription { signal, receiver }
    }

    /// Deliver a copy of `frame` to every live subscriber of `signal`.
    ///
    /// Returns the number of subscribers reached.
    pub fn dispatch(&self, signal: &str, frame: &Frame) -> usize {
        let mut subscribers = self.lock();
        let Some(senders) = subscribers.get_mut(signal) else {
            return 0;
        };
        senders.retain(|sender| sender.send(frame.clone()).is_ok());
        let delivered = senders.len();
        if delivered == 0 {
            subscribers.remove(signal);
        }
        delivered
    }

    /// Signals that still have at least one live subscriber.
    #[must_use]
    pub fn signals(&self) -> Vec<String> {
        let mut signals: Vec<String> = self
            .lock()
            .iter()
            .filter(|(_, senders)| senders.iter().any(|s| !s.is_closed()))
            .map(|(signal, _)| signal.clone())
            .collect();
        signals.sort();
        signals
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<mpsc::UnboundedSender<Frame>>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
