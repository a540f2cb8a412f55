//! Change notifications emitted by the store.
//!
//! Presentation layers register a callback and re-read whatever they display
//! when an event arrives.
use log::trace;

/// What changed in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    NoteCreated { id: String },
    NoteUpdated { id: String },
    NoteDeleted { id: String },
    SelectionChanged { id: Option<String> },
    TemplateSaved { id: String },
    CategoryAdded { name: String },
    /// Search term, category filter or preview mode changed
    ViewChanged,
    /// The durable record rejected a write; in-memory state is still current
    PersistenceFailed { message: String },
}

/// Handle returned by [`Subscribers::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&StoreEvent)>;

/// Registry of change listeners, notified in subscription order.
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Callback)>,
}

impl Subscribers {
    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(callback)));
        id
    }

    /// Returns false if the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn notify(&mut self, event: &StoreEvent) {
        trace!("Notifying {} listeners: {:?}", self.listeners.len(), event);
        for (_, callback) in self.listeners.iter_mut() {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
