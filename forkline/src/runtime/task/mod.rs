//! Spawned task primitives.
//!
//! This module defines how the runtime represents and wakes futures that
//! were handed to [`spawn`]:
//! - the task container polled by the scheduler,
//! - the waker that routes wake-ups back to the ready queue.
//!
//! Most users reach tasks indirectly through
//! [`Promise::spawn`](crate::Promise::spawn).

pub(crate) mod waker;

mod core;

pub(crate) use core::Task;

pub use core::spawn;
