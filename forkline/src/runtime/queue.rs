use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Instant;

/// Identifier reserved for the future passed to `block_on`.
pub(crate) const MAIN_TASK: usize = usize::MAX;

/// Queue of task identifiers whose futures were woken.
///
/// Wakers are `Send + Sync`, so this is the one piece of the runtime that
/// may be touched from another thread. It only ever carries identifiers;
/// the futures themselves stay on the runtime thread.
///
/// The queue also lets the runtime thread park until a waker fires,
/// bounded by the next timer deadline when there is one.
pub(crate) struct ReadyQueue {
    /// Identifiers of woken tasks, in wake order.
    queue: Mutex<VecDeque<usize>>,

    /// Condition variable used to wake the parked runtime thread.
    condvar: Condvar,
}

impl ReadyQueue {
    /// Creates a new empty queue.
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
        }
    }

    /// Pushes a woken task and wakes the runtime thread if it is parked.
    ///
    /// A task may be queued more than once; extra polls are spurious and
    /// harmless.
    pub(crate) fn push(&self, id: usize) {
        self.lock().push_back(id);
        self.condvar.notify_one();
    }

    /// Takes the oldest woken task.
    pub(crate) fn pop(&self) -> Option<usize> {
        self.lock().pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Parks the runtime thread until a task is woken, or until `deadline`
    /// if there is one.
    pub(crate) fn park(&self, deadline: Option<Instant>) {
        let mut queue = self.lock();

        while queue.is_empty() {
            queue = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return;
                    }

                    match self.condvar.wait_timeout(queue, deadline - now) {
                        Ok((guard, _)) => guard,
                        Err(poisoned) => poisoned.into_inner().0,
                    }
                }
                None => match self.condvar.wait(queue) {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                },
            };
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<usize>> {
        // Only identifiers live behind the lock; a poisoned guard is still usable.
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
