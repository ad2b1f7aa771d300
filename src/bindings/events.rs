//! Revalidation Events
//!
//! Focus and reconnect notifications fanned out to every subscribed resource.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

const EVENT_CAPACITY: usize = 64;

/// Host events that prompt cached resources to revalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevalidationEvent {
    /// The application regained focus
    Focus,
    /// The network came back online
    Reconnect,
}

// == Event Bus ==
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RevalidationEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Publishes an event. Returns how many listeners received it.
    pub fn emit(&self, event: RevalidationEvent) -> usize {
        // No listeners is not an error
        let delivered = self.sender.send(event).unwrap_or(0);
        debug!("Emitted {:?} to {} listeners", event, delivered);
        delivered
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RevalidationEvent> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// == Subscription ==
/// Handle to a running listener. Dropping or disposing it stops the listener.
#[derive(Debug)]
pub struct Subscription {
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// A subscription with nothing to stop.
    pub(crate) fn inactive() -> Self {
        Self { handle: None }
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stops listening.
    pub fn dispose(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}
