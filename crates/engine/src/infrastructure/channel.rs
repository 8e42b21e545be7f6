//! In-process channel.
//!
//! Listeners run synchronously, in registration order, on the emitting
//! thread. A broadcast tap lets observers (the binary, tests) follow the
//! event stream without registering listeners.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use storyframe_shared::{EventKind, PreviewEvent};
use tokio::sync::broadcast;

use crate::infrastructure::ports::{Channel, Listener, ListenerId};

const TAP_CAPACITY: usize = 256;

pub struct InMemoryChannel {
    listeners: Mutex<BTreeMap<EventKind, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
    tap: broadcast::Sender<PreviewEvent>,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        let (tap, _) = broadcast::channel(TAP_CAPACITY);
        Self {
            listeners: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            tap,
        }
    }

    fn listeners(&self) -> MutexGuard<'_, BTreeMap<EventKind, Vec<(ListenerId, Listener)>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PreviewEvent> {
        self.tap.subscribe()
    }

    pub fn listener_count_for(&self, kind: EventKind) -> usize {
        self.listeners().get(&kind).map_or(0, Vec::len)
    }
}

impl Default for InMemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel for InMemoryChannel {
    fn emit(&self, event: PreviewEvent) {
        let kind = event.kind();
        // Listeners may emit or (un)register, so dispatch on a copy
        let listeners: Vec<Listener> = self
            .listeners()
            .get(&kind)
            .map(|entries| entries.iter().map(|(_, listener)| listener.clone()).collect())
            .unwrap_or_default();

        tracing::trace!(event = %kind, listeners = listeners.len(), "Emitting event");
        // Observers see an event before anything its listeners emit.
        // No receivers is fine
        let _ = self.tap.send(event.clone());
        for listener in listeners {
            listener(&event);
        }
    }

    fn on(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners()
            .entry(kind)
            .or_default()
            .push((id, listener));
        id
    }

    fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners();
        let Some(entries) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(&kind);
        }
        removed
    }

    fn listener_count(&self) -> usize {
        self.listeners().values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use storyframe_domain::StoryId;

    fn recorder(log: Arc<Mutex<Vec<String>>>, name: &'static str) -> Listener {
        Arc::new(move |_event: &PreviewEvent| {
            log.lock().unwrap().push(name.to_string());
        })
    }

    #[test]
    fn dispatches_in_registration_order_to_matching_kind() {
        let channel = InMemoryChannel::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        channel.on(EventKind::ForceReRender, recorder(log.clone(), "first"));
        channel.on(EventKind::ForceReRender, recorder(log.clone(), "second"));
        channel.on(EventKind::StoryRendered, recorder(log.clone(), "other"));

        channel.emit(PreviewEvent::ForceReRender);

        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn off_removes_exactly_one_listener() {
        let channel = InMemoryChannel::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = channel.on(EventKind::ForceReRender, recorder(log.clone(), "first"));
        channel.on(EventKind::ForceReRender, recorder(log.clone(), "second"));

        assert!(channel.off(EventKind::ForceReRender, first));
        assert!(!channel.off(EventKind::ForceReRender, first));
        assert!(!channel.off(EventKind::UpdateGlobals, first));
        channel.emit(PreviewEvent::ForceReRender);

        assert_eq!(*log.lock().unwrap(), vec!["second"]);
        assert_eq!(channel.listener_count(), 1);
    }

    #[test]
    fn listeners_may_emit_reentrantly() {
        let channel = Arc::new(InMemoryChannel::new());
        let inner = channel.clone();
        channel.on(
            EventKind::ForceReRender,
            Arc::new(move |_event: &PreviewEvent| {
                inner.emit(PreviewEvent::StoryRendered(StoryId::new("a--a")));
            }),
        );
        let mut tap = channel.subscribe();

        channel.emit(PreviewEvent::ForceReRender);

        assert_eq!(tap.try_recv().unwrap(), PreviewEvent::ForceReRender);
        assert_eq!(
            tap.try_recv().unwrap(),
            PreviewEvent::StoryRendered(StoryId::new("a--a"))
        );
    }
}
