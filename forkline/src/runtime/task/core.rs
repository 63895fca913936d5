use crate::runtime::context;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A spawned future owned by the scheduler.
///
/// Tasks never leave the runtime thread, so the future does not need to be
/// `Send`. The scheduler takes it out of its slot while polling so that the
/// future may spawn further tasks.
pub(crate) struct Task {
    future: Pin<Box<dyn Future<Output = ()>>>,
}

impl Task {
    /// Wraps a future into a task.
    pub(crate) fn new<F>(future: F) -> Self
    where
        F: Future<Output = ()> + 'static,
    {
        Self {
            future: Box::pin(future),
        }
    }

    /// Polls the task once.
    ///
    /// Returns `true` once the future has completed.
    pub(crate) fn poll(&mut self, cx: &mut Context<'_>) -> bool {
        matches!(self.future.as_mut().poll(cx), Poll::Ready(()))
    }
}

/// Spawns a future as a task onto the current runtime.
///
/// The task is queued immediately and first polled on the runtime's next
/// turn. There is no join handle: wrap the work in
/// [`Promise::spawn`](crate::Promise::spawn) to observe its result.
///
/// # Panics
///
/// Panics if called outside the context of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// task::spawn(async {
///     sleep(Duration::from_millis(10)).await;
///     println!("done");
/// });
/// ```
pub fn spawn<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    context::with_scheduler("spawn", |scheduler| scheduler.spawn(Task::new(future)));
}
