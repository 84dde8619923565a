//! Growable slot storage for sort comparators

/// Per-slot values of a sort comparator.
///
/// Allocation starts at `min(num_hits, initial_capacity)` and grows
/// geometrically on demand, never past `num_hits`. Storage never shrinks.
#[derive(Debug, Clone)]
pub struct SlotValues<T> {
    values: Vec<Option<T>>,
    num_hits: usize,
}

impl<T> SlotValues<T> {
    /// Storage for up to `num_hits` slots
    pub fn new(num_hits: usize, initial_capacity: usize) -> Self {
        let initial = num_hits.min(initial_capacity.max(1));
        SlotValues {
            values: Vec::with_capacity(initial),
            num_hits,
        }
    }

    /// Store `value` in `slot`, growing the storage if needed.
    ///
    /// Slots at or beyond `num_hits` are ignored.
    pub fn set(&mut self, slot: usize, value: Option<T>) {
        if slot >= self.num_hits {
            tracing::warn!(
                target: "fieldex::sort",
                slot,
                num_hits = self.num_hits,
                "Ignoring write past the last slot"
            );
            return;
        }
        if slot >= self.values.len() {
            self.grow_to(slot + 1);
        }
        self.values[slot] = value;
    }

    /// Value in `slot`; unset slots hold `None`
    pub fn get(&self, slot: usize) -> Option<&T> {
        self.values.get(slot).and_then(Option::as_ref)
    }

    /// Slots currently allocated
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Upper bound on slots
    pub fn num_hits(&self) -> usize {
        self.num_hits
    }

    fn grow_to(&mut self, len: usize) {
        let cap = self.values.capacity();
        if len > cap {
            let target = (cap.max(1) * 2).max(len).min(self.num_hits);
            self.values.reserve_exact(target - self.values.len());
        }
        self.values.resize_with(len, || None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_allocation_is_bounded() {
        let slots: SlotValues<u32> = SlotValues::new(1_000_000, 256);
        assert!(slots.capacity() >= 256);
        assert!(slots.capacity() < 1024);

        let small: SlotValues<u32> = SlotValues::new(10, 256);
        assert!(small.capacity() >= 10);
        assert!(small.capacity() < 256);
    }

    #[test]
    fn test_grows_on_demand_up_to_num_hits() {
        let mut slots = SlotValues::new(1000, 4);
        for i in 0..1000 {
            slots.set(i, Some(i));
        }
        assert_eq!(slots.get(999), Some(&999));
        assert!(slots.capacity() >= 1000);

        let before = slots.capacity();
        slots.set(1000, Some(1));
        assert!(slots.get(1000).is_none());
        assert_eq!(slots.capacity(), before);
    }

    #[test]
    fn test_unset_slots_are_none() {
        let mut slots = SlotValues::new(8, 2);
        slots.set(5, Some("x"));
        assert!(slots.get(3).is_none());
        assert_eq!(slots.get(5), Some(&"x"));
        slots.set(5, None);
        assert!(slots.get(5).is_none());
    }
}
