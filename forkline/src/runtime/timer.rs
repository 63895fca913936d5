use std::cell::Cell;
use std::cmp::Ordering;
use std::rc::Rc;
use std::task::Waker;
use std::time::Instant;

/// An entry in the runtime timer heap.
///
/// `TimerEntry` is a scheduled wake-up at a specific deadline, stored in a
/// `BinaryHeap` ordered by deadline. The sleep future that registered it
/// may cancel it before it fires.
pub(crate) struct TimerEntry {
    /// The time at which the timer should fire.
    pub(crate) deadline: Instant,

    /// Waker to notify when the deadline is reached.
    pub(crate) waker: Waker,

    /// Cancellation flag shared with the associated sleep future.
    pub(crate) cancelled: Rc<Cell<bool>>,
}

impl TimerEntry {
    /// Wakes the owning task unless the timer was cancelled.
    pub(crate) fn fire(self) {
        if !self.cancelled.get() {
            self.waker.wake();
        }
    }
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline.eq(&other.deadline)
    }
}

impl Ord for TimerEntry {
    /// Reversed so that `BinaryHeap<TimerEntry>` pops the earliest deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.deadline.cmp(&self.deadline)
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
