use crate::error::Error;
use crate::runtime::context::{self, enter_context};
use crate::runtime::queue::{MAIN_TASK, ReadyQueue};
use crate::runtime::task::Task;
use crate::runtime::task::waker::TaskWaker;
use crate::runtime::timer::TimerEntry;
use crate::utils::Slab;

use std::cell::RefCell;
use std::collections::BinaryHeap;
use std::future::Future;
use std::mem;
use std::pin::pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

/// The main runtime handle.
///
/// `Runtime` drives everything on the thread that calls
/// [`block_on`](Self::block_on):
/// - polling the main future and spawned tasks,
/// - draining the microtask queue that promise reactions run on,
/// - firing timers registered by [`sleep`](crate::time::sleep).
///
/// The runtime is single-threaded and cooperative. A `Runtime` is not
/// `Send`, and neither are the promises it drives.
pub struct Runtime {
    scheduler: Rc<Scheduler>,
}

impl Runtime {
    /// Creates a new runtime instance.
    ///
    /// # Arguments
    ///
    /// * `job_budget` - Number of woken futures polled between timer checks.
    pub(crate) fn new(job_budget: usize) -> Self {
        Self {
            scheduler: Rc::new(Scheduler::new(job_budget)),
        }
    }

    /// Runs a future to completion on the current thread.
    ///
    /// While the future is pending, spawned tasks, promise reactions and
    /// timers make progress. Reactions queued before the runtime started
    /// (for example by a chain assembled outside of `block_on`) run first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stalled`] if the future is still pending while no
    /// microtask, runnable task or timer is left to wake it.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let runtime = RuntimeBuilder::new().build();
    /// let value = runtime.block_on(async { 42 })?;
    /// assert_eq!(value, 42);
    /// ```
    pub fn block_on<F>(&self, future: F) -> Result<F::Output, Error>
    where
        F: Future,
    {
        let _span = tracing::debug_span!("block_on").entered();

        enter_context(self.scheduler.clone(), || self.scheduler.run(future))
    }
}

impl Drop for Runtime {
    /// Drops every spawned task, pending timer and queued microtask.
    fn drop(&mut self) {
        // Taken out first: dropping a future must not find the slab borrowed.
        let tasks = mem::replace(&mut *self.scheduler.tasks.borrow_mut(), Slab::with_capacity(0));
        let timers = mem::take(&mut *self.scheduler.timers.borrow_mut());

        drop(tasks);
        drop(timers);

        // The microtask queue belongs to the thread. Another runtime still
        // driving it owns whatever is queued.
        if !context::is_entered() {
            context::clear_jobs();
        }
    }
}

/// A spawned task together with the waker handle it keeps for its life.
struct Slot {
    /// `None` while the task is being polled.
    task: Option<Task>,
    waker: Arc<TaskWaker>,
}

/// State shared between the runtime handle and the thread-local context.
pub(crate) struct Scheduler {
    /// Spawned futures keyed by the identifier their wakers carry.
    tasks: RefCell<Slab<Slot>>,

    /// Identifiers of woken futures.
    ready: Arc<ReadyQueue>,

    /// Pending timers, earliest deadline first.
    timers: RefCell<BinaryHeap<TimerEntry>>,

    /// Number of woken futures polled between timer checks.
    job_budget: usize,
}

impl Scheduler {
    fn new(job_budget: usize) -> Self {
        Self {
            tasks: RefCell::new(Slab::with_capacity(64)),
            ready: Arc::new(ReadyQueue::new()),
            timers: RefCell::new(BinaryHeap::new()),
            job_budget,
        }
    }

    /// Stores a task and queues its first poll.
    pub(crate) fn spawn(&self, task: Task) {
        let id = self.tasks.borrow_mut().insert_with(|id| Slot {
            task: Some(task),
            waker: TaskWaker::new(id, self.ready.clone()),
        });
        tracing::trace!(task = id, "task spawned");

        self.ready.push(id);
    }

    /// Registers a timer.
    pub(crate) fn register_timer(&self, entry: TimerEntry) {
        tracing::trace!(deadline = ?entry.deadline, "timer registered");

        self.timers.borrow_mut().push(entry);
    }

    /// The scheduler loop behind `block_on`.
    ///
    /// Each turn:
    /// 1. Drain microtasks
    /// 2. Poll up to `job_budget` woken futures, draining microtasks after each
    /// 3. Fire expired timers
    /// 4. Park if nothing is runnable, or report a stall if nothing ever
    ///    will be
    fn run<F: Future>(&self, future: F) -> Result<F::Output, Error> {
        let mut future = pin!(future);
        let main = TaskWaker::new(MAIN_TASK, self.ready.clone());

        self.ready.push(MAIN_TASK);

        loop {
            context::drain_jobs();

            for _ in 0..self.job_budget {
                let Some(id) = self.ready.pop() else {
                    break;
                };

                if id == MAIN_TASK {
                    let waker = main.waker();
                    let mut cx = Context::from_waker(&waker);

                    let poll = context::polling(&main, &waker, || future.as_mut().poll(&mut cx));
                    if let Poll::Ready(output) = poll {
                        return Ok(output);
                    }
                } else {
                    self.poll_task(id);
                }

                context::drain_jobs();
            }

            self.fire_timers();

            if !self.ready.is_empty() || context::has_jobs() {
                continue;
            }

            let next_deadline = self.timers.borrow().peek().map(|entry| entry.deadline);

            if next_deadline.is_none() && !self.woken_elsewhere(&main) {
                tracing::debug!(
                    tasks = self.tasks.borrow().len(),
                    "runtime stalled with the main future still pending"
                );
                return Err(Error::Stalled);
            }

            self.ready.park(next_deadline);
        }
    }

    /// Returns `true` if a waker of the main future or of a spawned task is
    /// held outside the scheduler, so a wake-up may still arrive.
    fn woken_elsewhere(&self, main: &Arc<TaskWaker>) -> bool {
        main.is_held() || self.tasks.borrow().iter().any(|slot| slot.waker.is_held())
    }

    /// Polls a spawned task once, removing it when it completes.
    ///
    /// Identifiers of tasks that already finished are ignored.
    fn poll_task(&self, id: usize) {
        // Taken out of its slot so the future can spawn while being polled;
        // the occupied slot keeps `id` from being reused meanwhile.
        let taken = self
            .tasks
            .borrow_mut()
            .get_mut(id)
            .and_then(|slot| Some((slot.task.take()?, slot.waker.clone())));

        let Some((mut task, task_waker)) = taken else {
            return;
        };

        let waker = task_waker.waker();
        let mut cx = Context::from_waker(&waker);

        let completed = context::polling(&task_waker, &waker, || task.poll(&mut cx));
        let mut tasks = self.tasks.borrow_mut();

        if completed {
            tracing::trace!(task = id, "task completed");
            tasks.remove(id);
        } else if let Some(slot) = tasks.get_mut(id) {
            slot.task = Some(task);
        }
    }

    /// Wakes every task whose timer deadline has passed.
    fn fire_timers(&self) {
        let now = Instant::now();

        loop {
            let entry = {
                let mut timers = self.timers.borrow_mut();
                match timers.peek() {
                    Some(entry) if entry.deadline <= now => timers.pop(),
                    _ => None,
                }
            };

            match entry {
                Some(entry) => entry.fire(),
                None => break,
            }
        }
    }
}
