use crate::runtime::context;
use crate::runtime::timer::TimerEntry;

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Waits until `duration` has elapsed.
///
/// The deadline is fixed when `sleep` is called, not when the future is
/// first polled.
///
/// # Panics
///
/// Panics if the returned future is polled outside of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// Promise::<(), String>::spawn(async {
///     sleep(Duration::from_millis(10)).await;
///     Ok(())
/// });
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    Sleep::new(duration)
}

/// Future returned by [`sleep`].
///
/// Its timer entry is pushed onto the runtime's heap on the first pending
/// poll. Dropping an unfinished `Sleep` flags that entry so it fires
/// without waking anyone.
pub struct Sleep {
    deadline: Instant,
    registered: bool,

    /// Shared with the timer entry once registered.
    cancelled: Rc<Cell<bool>>,
}

impl Sleep {
    pub(crate) fn new(duration: Duration) -> Self {
        Self {
            deadline: Instant::now() + duration,
            registered: false,
            cancelled: Rc::new(Cell::new(false)),
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if Instant::now() >= this.deadline {
            return Poll::Ready(());
        }

        if !this.registered {
            this.registered = true;

            let entry = TimerEntry {
                deadline: this.deadline,
                waker: cx.waker().clone(),
                cancelled: this.cancelled.clone(),
            };

            context::with_scheduler("sleep", |scheduler| scheduler.register_timer(entry));
        }

        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        self.cancelled.set(true);
    }
}
