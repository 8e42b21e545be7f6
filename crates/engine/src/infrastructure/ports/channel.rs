//! Publish/subscribe channel port.

use std::sync::Arc;

use storyframe_shared::{EventKind, PreviewEvent};

/// A channel listener. Listeners run synchronously inside `emit`; anything
/// async must be spawned.
pub type Listener = Arc<dyn Fn(&PreviewEvent) + Send + Sync>;

/// Handle returned by [`Channel::on`], needed to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Typed event channel between the preview and its manager.
pub trait Channel: Send + Sync {
    fn emit(&self, event: PreviewEvent);

    fn on(&self, kind: EventKind, listener: Listener) -> ListenerId;

    /// Remove a listener. Returns false when it was not registered.
    fn off(&self, kind: EventKind, id: ListenerId) -> bool;

    /// Number of live listeners across all event kinds.
    fn listener_count(&self) -> usize;
}

/// A registered listener, remembered so it can be removed on teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub kind: EventKind,
    pub id: ListenerId,
}

impl Subscription {
    pub fn register(channel: &dyn Channel, kind: EventKind, listener: Listener) -> Self {
        let id = channel.on(kind, listener);
        Self { kind, id }
    }

    pub fn cancel(self, channel: &dyn Channel) {
        if !channel.off(self.kind, self.id) {
            tracing::debug!(kind = %self.kind, id = self.id.0, "Listener was already removed");
        }
    }
}
