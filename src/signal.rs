use std::fmt;

use crate::context::Context;
use crate::name::Name;

/// Handle returned by [`ChangedSignal::connect`], used to disconnect later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

type Slot = Box<dyn Fn(&Context, &Name) + Send + Sync>;

/// Observers notified whenever an entry of a context is set or removed.
///
/// Slots run synchronously on the mutating thread, in connection order.
#[derive(Default)]
pub struct ChangedSignal {
    next_id: u64,
    slots: Vec<(ConnectionId, Slot)>,
}

impl ChangedSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect<F>(&mut self, slot: F) -> ConnectionId
    where
        F: Fn(&Context, &Name) + Send + Sync + 'static,
    {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.slots.push((id, Box::new(slot)));
        id
    }

    /// Returns false if `id` was not connected.
    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(slot_id, _)| *slot_id != id);
        self.slots.len() != before
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn emit(&self, context: &Context, name: &Name) {
        for (_, slot) in &self.slots {
            slot(context, name);
        }
    }
}

impl fmt::Debug for ChangedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangedSignal")
            .field("slots", &self.slots.len())
            .finish()
    }
}
