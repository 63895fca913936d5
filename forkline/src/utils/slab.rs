/// A simple slab of reusable slots.
///
/// A `Slab` stores values of type `T` in a contiguous vector and hands out
/// small indices that are reused after removal. The runtime keys spawned
/// futures by these indices, and wakers carry them back to the scheduler.
///
/// Lookups of a vacant or out-of-range index return `None` instead of
/// panicking: a waker may outlive the task it was created for.
pub(crate) struct Slab<T> {
    /// Storage for items; `None` marks a vacant slot.
    slots: Vec<Option<T>>,

    /// Stack of vacant indices that can be reused.
    free: Vec<usize>,

    /// Number of occupied slots.
    len: usize,
}

impl<T> Slab<T> {
    /// Creates a new `Slab` with room for `capacity` items before growing.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Inserts the value built by `make` from the index it will live at,
    /// and returns that index.
    ///
    /// A vacant slot is reused if one is available; otherwise the slab grows.
    pub(crate) fn insert_with(&mut self, make: impl FnOnce(usize) -> T) -> usize {
        self.len += 1;

        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(make(index));
                index
            }
            None => {
                let index = self.slots.len();
                self.slots.push(Some(make(index)));
                index
            }
        }
    }

    /// Removes and returns the value stored at `index`, if any.
    pub(crate) fn remove(&mut self, index: usize) -> Option<T> {
        let item = self.slots.get_mut(index)?.take()?;

        self.free.push(index);
        self.len -= 1;

        Some(item)
    }

    /// Returns a mutable reference to the value at `index`, if any.
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)?.as_mut()
    }

    /// Iterates over the occupied slots.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().flatten()
    }

    /// Returns the number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}
