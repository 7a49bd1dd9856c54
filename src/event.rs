//! Typed driver events with explicit subscribe/unsubscribe.
//!
//! Listeners are dispatched in subscription order. Subscribing returns a
//! [`Subscription`] handle; passing it back to `unsubscribe` detaches the
//! listener.

use crate::protocol::pen::PenSample;

#[derive(Debug, Clone)]
pub enum PadEvent {
    HidConnect,
    HidDisconnect,
    PenSample(PenSample),
}

/// Disposable handle identifying one subscribed listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

type Listener = Box<dyn FnMut(&PadEvent) + Send>;

#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&PadEvent) + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        Subscription(id)
    }

    /// Detach a listener. Unknown handles (already unsubscribed) are a
    /// no-op.
    pub fn unsubscribe(&mut self, subscription: Subscription) {
        self.listeners.retain(|(id, _)| *id != subscription.0);
    }

    pub fn emit(&mut self, event: &PadEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}
