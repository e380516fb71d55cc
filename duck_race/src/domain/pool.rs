// Slot-recycling storage for short-lived entities.

/// Fixed slots reused through a free list, so removing an entity never shifts
/// the others and a freed slot is the next one handed out.
#[derive(Debug, Clone)]
pub struct SlotPool<T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
    live: usize,
}

impl<T> Default for SlotPool<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T> SlotPool<T> {
    /// Pre-warms `capacity` empty slots.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            // Reversed so the lowest slot is popped first.
            free: (0..capacity).rev().collect(),
            live: 0,
        }
    }

    /// Stores `item` in a recycled slot (or a new one) and returns the slot index.
    pub fn insert(&mut self, item: T) -> usize {
        self.live += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(item);
                slot
            }
            None => {
                self.slots.push(Some(item));
                self.slots.len() - 1
            }
        }
    }

    pub fn remove(&mut self, slot: usize) -> Option<T> {
        let item = self.slots.get_mut(slot)?.take()?;
        self.free.push(slot);
        self.live -= 1;
        Some(item)
    }

    pub fn get(&self, slot: usize) -> Option<&T> {
        self.slots.get(slot)?.as_ref()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, item)| item.as_ref().map(|item| (slot, item)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(slot, item)| item.as_mut().map(|item| (slot, item)))
    }

    /// Frees every slot whose item fails `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            if entry.as_ref().is_some_and(|item| !keep(item)) {
                *entry = None;
                self.free.push(slot);
                self.live -= 1;
            }
        }
    }
}
