//! # Forkline
//!
//! **Forkline** composes asynchronous tasks into pipelines that are mostly
//! sequential but can fan out into a parallel region at chosen points and
//! fan back in under one of three join policies.
//!
//! A task is either a *promiser*, a closure returning the [`Promise`] of its
//! result, or a *resolver*, a closure handed a `(resolve, reject)` pair.
//! Tasks are strung together on a [`Chain`]:
//!
//! - appends run one after the other, each waiting for everything before it,
//! - [`Chain::fork`] opens a [`Fork`] whose tasks start together once the
//!   chain so far has settled,
//! - [`Chain::join`], [`Chain::join_any`] and [`Chain::join_settle`] fold
//!   the region back into the chain, waiting for all tasks, for the first
//!   one, or for all of them without failing.
//!
//! Promises run on a small single-threaded [`Runtime`] that also provides
//! local task spawning and timers.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use forkline::{Chain, Promise};
//! use forkline::time::sleep;
//! use std::time::Duration;
//!
//! fn fetch(id: u32) -> Promise<u32, String> {
//!     Promise::spawn(async move {
//!         sleep(Duration::from_millis(10)).await;
//!         Ok(id)
//!     })
//! }
//!
//! #[forkline::main]
//! async fn main() {
//!     let completion = Chain::new()
//!         .append(|| fetch(1))
//!         .fork()
//!         .append(|| fetch(2))
//!         .append(|| fetch(3))
//!         .join()
//!         .append(|| fetch(4))
//!         .await;
//!
//!     println!("{completion:?}");
//! }
//! ```
//!
//! ## Modules
//!
//! - [`promise`]: The promise primitive and its `all` / `any` / `settle`
//!   combinators
//! - [`task`]: Spawning local futures on the current runtime
//! - [`time`]: Sleeping on the current runtime
//!
//! ## Logging
//!
//! Forkline emits [`tracing`] events and never installs a subscriber.

mod chain;
mod error;
mod fork;
mod promiser;
mod runtime;
mod utils;

pub mod promise;
pub mod time;

pub use chain::{Chain, Completion};
pub use error::Error;
pub use fork::{Activation, Fork};
pub use promise::{Outcome, Promise, Reject, Resolve};
pub use promiser::{Promiser, from_resolver};
pub use runtime::Runtime;
pub use runtime::builder::{JOB_BUDGET_ENV, RuntimeBuilder};
pub use runtime::task;

pub use forkline_macros::{main, test};
