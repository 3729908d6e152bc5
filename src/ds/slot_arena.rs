//! Slot arena with stable handles.
//!
//! [`SlotArena`] is the single owner of records that more than one index needs
//! to point at. The LFU cache keeps its [`CacheNode`](crate::policy::lfu::CacheNode)s
//! here; the key index and the frequency index only ever hold [`SlotId`]s.
//!
//! ```text
//!   slots:     [ Some(a) | None | Some(c) | Some(d) ]
//!                  id_0    id_1    id_2      id_3
//!   free_list: [ 1 ]      ← next insert reuses id_1
//! ```
//!
//! Freed slots are recycled LIFO. A `SlotId` stays valid until the value it
//! names is removed; after that the id may be handed out again, so callers
//! must drop their copies of an id at the same time they remove it.

/// Handle to a value stored in a [`SlotArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    /// Returns the raw slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Vec-backed arena with a free list.
#[derive(Debug, Clone)]
pub struct SlotArena<T> {
    slots: Vec<Option<T>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Stores `value` and returns its handle.
    pub fn insert(&mut self, value: T) -> SlotId {
        let idx = match self.free_list.pop() {
            Some(idx) => {
                self.slots[idx] = Some(value);
                idx
            },
            None => {
                self.slots.push(Some(value));
                self.slots.len() - 1
            },
        };
        self.len += 1;
        SlotId(idx)
    }

    /// Takes the value out of `id`, freeing the slot for reuse.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let value = self.slots.get_mut(id.0)?.take()?;
        self.free_list.push(id.0);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every value and forgets all handles.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.len = 0;
    }

    pub fn shrink_to_fit(&mut self) {
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        let high = self.slots.len();
        self.free_list.retain(|&idx| idx < high);
        self.slots.shrink_to_fit();
        self.free_list.shrink_to_fit();
    }

    /// Iterates live `(id, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|value| (SlotId(idx), value)))
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
