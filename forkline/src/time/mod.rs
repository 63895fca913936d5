//! Timer utilities.
//!
//! [`sleep`] schedules a wake-up on the current runtime. It is the only way
//! a task on this runtime waits for wall-clock time.

mod sleep;

#[doc(inline)]
pub use sleep::{Sleep, sleep};
