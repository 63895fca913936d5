use crate::runtime::queue::ReadyQueue;

use std::sync::{Arc, Weak};
use std::task::{Wake, Waker};

/// Wake target of a task.
///
/// Waking only pushes the task identifier onto the ready queue; the
/// scheduler looks the future up again when it gets to it. This keeps the
/// waker `Send + Sync` while the futures themselves stay thread-local.
///
/// The scheduler keeps one `Arc<TaskWaker>` per task for the task's whole
/// life. Every [`Waker`] handed out clones that `Arc`, so a strong count
/// above one means a waker is held somewhere the scheduler cannot see.
pub(crate) struct TaskWaker {
    /// Identifier of the task in the scheduler's slab.
    id: usize,

    /// Queue the identifier is pushed onto.
    ready: Arc<ReadyQueue>,
}

impl TaskWaker {
    pub(crate) fn new(id: usize, ready: Arc<ReadyQueue>) -> Arc<Self> {
        Arc::new(Self { id, ready })
    }

    /// Creates a [`Waker`] that reschedules this task when woken.
    pub(crate) fn waker(self: &Arc<Self>) -> Waker {
        Waker::from(self.clone())
    }

    /// Returns `true` while a [`Waker`] for this task is alive outside the
    /// scheduler, e.g. stored by a future that is woken from another thread.
    pub(crate) fn is_held(self: &Arc<Self>) -> bool {
        Arc::strong_count(self) > 1
    }
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.ready.push(self.id);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.ready.push(self.id);
    }
}

/// A waker registration that does not keep its task's waker alive.
///
/// Promises park their waiters as `WeakWaker`s when they can: a promise
/// only settles from code running on the runtime thread, so such a
/// registration must not stop the scheduler from reporting a stall.
#[derive(Clone)]
pub(crate) struct WeakWaker {
    task: Weak<TaskWaker>,
}

impl WeakWaker {
    pub(crate) fn new(task: &Arc<TaskWaker>) -> Self {
        Self {
            task: Arc::downgrade(task),
        }
    }

    /// Reschedules the task, unless it has already completed.
    pub(crate) fn wake(&self) {
        if let Some(task) = self.task.upgrade() {
            task.ready.push(task.id);
        }
    }

    pub(crate) fn will_wake(&self, other: &WeakWaker) -> bool {
        Weak::ptr_eq(&self.task, &other.task)
    }
}
