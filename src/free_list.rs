//! Bounded buffer of idle resources

use crossbeam::queue::ArrayQueue;

/// Lock-free bounded queue whose push and pop never block.
///
/// `ArrayQueue` rejects a zero capacity, so a zero-sized free-list has no
/// queue at all: every push is refused and every pop misses.
pub(crate) struct FreeList<T> {
    queue: Option<ArrayQueue<T>>,
}

impl<T> FreeList<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: (capacity > 0).then(|| ArrayQueue::new(capacity)),
        }
    }

    /// Hands the value back when the list is full.
    pub fn try_push(&self, value: T) -> Result<(), T> {
        match &self.queue {
            Some(queue) => queue.push(value),
            None => Err(value),
        }
    }

    pub fn try_pop(&self) -> Option<T> {
        self.queue.as_ref().and_then(ArrayQueue::pop)
    }

    pub fn len(&self) -> usize {
        self.queue.as_ref().map_or(0, ArrayQueue::len)
    }

    pub fn capacity(&self) -> usize {
        self.queue.as_ref().map_or(0, ArrayQueue::capacity)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }
}
