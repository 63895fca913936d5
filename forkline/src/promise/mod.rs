//! The promise primitive the chain and fork layers are built on.
//!
//! This module provides:
//! - [`Promise`], an eagerly started, cloneable asynchronous value that can
//!   be built from a `(resolve, reject)` pair, continued with `then`, and
//!   awaited as a [`Future`](std::future::Future),
//! - the combinators [`all`], [`any`] and [`settle`] over a group of
//!   promises,
//! - [`Outcome`], the per-member report produced by [`settle`].
//!
//! Promise reactions run as microtasks on the current
//! [`Runtime`](crate::Runtime).

mod combinators;
mod core;
mod outcome;

pub use self::combinators::{all, any, settle};
pub use self::core::{Promise, Reject, Resolve};
pub use self::outcome::Outcome;
