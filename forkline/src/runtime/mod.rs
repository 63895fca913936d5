//! Core runtime components.
//!
//! This module contains the single-threaded executor the promise layer
//! runs on.
//!
//! It is responsible for:
//! - polling the `block_on` future and spawned tasks,
//! - running promise reactions as microtasks between polls,
//! - firing timers and parking the thread while nothing is runnable.
//!
//! Most users will interact with [`Promise`](crate::Promise),
//! [`Chain`](crate::Chain) and [`Fork`](crate::Fork) rather than with
//! this module directly.

mod core;
mod queue;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod timer;

pub mod task;

pub use self::core::Runtime;
pub(crate) use self::core::Scheduler;
