use crate::runtime::Scheduler;
use crate::runtime::task::waker::{TaskWaker, WeakWaker};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::task::Waker;

/// A promise reaction waiting to run.
pub(crate) type Job = Box<dyn FnOnce()>;

thread_local! {
    /// Thread-local handle to the scheduler currently driving this thread.
    ///
    /// This is set while [`block_on`](crate::Runtime::block_on) runs and
    /// lets spawning and timers reach the scheduler without explicit
    /// parameter passing.
    pub(crate) static CURRENT_SCHEDULER: RefCell<Option<Rc<Scheduler>>> =
        const { RefCell::new(None) };

    /// Thread-local microtask queue.
    ///
    /// Promise reactions are pushed here when a promise settles. The queue
    /// lives outside the scheduler so that chains can be assembled before a
    /// runtime starts; the next `block_on` on this thread drains it.
    static JOBS: RefCell<VecDeque<Job>> = const { RefCell::new(VecDeque::new()) };

    /// Waker of the future being polled, with its weak registration form.
    static POLLING: RefCell<Option<(Waker, WeakWaker)>> = const { RefCell::new(None) };
}

/// Enters the runtime execution context for the current thread.
///
/// The scheduler handle is installed for the duration of the closure `f`
/// and the previous context is restored afterwards.
pub(crate) fn enter_context<R>(scheduler: Rc<Scheduler>, f: impl FnOnce() -> R) -> R {
    let previous = CURRENT_SCHEDULER.with(|cell| cell.replace(Some(scheduler)));

    let out = f();

    CURRENT_SCHEDULER.with(|cell| cell.replace(previous));

    out
}

/// Returns `true` while a runtime is driving this thread.
pub(crate) fn is_entered() -> bool {
    CURRENT_SCHEDULER.with(|cell| cell.borrow().is_some())
}

/// Runs `f` while `task` is the future being polled with `waker`.
pub(crate) fn polling<R>(task: &Arc<TaskWaker>, waker: &Waker, f: impl FnOnce() -> R) -> R {
    let current = Some((waker.clone(), WeakWaker::new(task)));
    let previous = POLLING.with(|cell| cell.replace(current));

    let out = f();

    POLLING.with(|cell| cell.replace(previous));

    out
}

/// Returns the weak form of `waker` if it belongs to the future being
/// polled.
///
/// Wakers of any other origin, including ones wrapped by a foreign
/// combinator, return `None` and must be stored as they are.
pub(crate) fn weak_waker(waker: &Waker) -> Option<WeakWaker> {
    POLLING.with(|cell| {
        cell.borrow()
            .as_ref()
            .filter(|(current, _)| current.will_wake(waker))
            .map(|(_, weak)| weak.clone())
    })
}

/// Runs `f` against the scheduler of the current context.
///
/// # Panics
///
/// Panics if called outside of a running runtime.
pub(crate) fn with_scheduler<R>(what: &str, f: impl FnOnce(&Scheduler) -> R) -> R {
    let scheduler = CURRENT_SCHEDULER.with(|cell| cell.borrow().clone());

    match scheduler {
        Some(scheduler) => f(&scheduler),
        None => panic!("{what} must be called within the context of a runtime"),
    }
}

/// Queues a microtask.
pub(crate) fn enqueue(job: Job) {
    JOBS.with(|jobs| jobs.borrow_mut().push_back(job));
}

/// Runs queued microtasks until the queue is empty, including the ones
/// queued by the jobs themselves.
///
/// Returns the number of jobs executed.
pub(crate) fn drain_jobs() -> usize {
    let mut ran = 0;

    // The borrow is released before each job runs so that jobs can enqueue.
    while let Some(job) = JOBS.with(|jobs| jobs.borrow_mut().pop_front()) {
        job();
        ran += 1;
    }

    ran
}

/// Returns `true` if microtasks are waiting to run.
pub(crate) fn has_jobs() -> bool {
    JOBS.with(|jobs| !jobs.borrow().is_empty())
}

/// Drops every queued microtask without running it.
pub(crate) fn clear_jobs() {
    let dropped = JOBS.with(|jobs| std::mem::take(&mut *jobs.borrow_mut()));
    drop(dropped);
}
