//! Task adaptation.
//!
//! A task is handed to a [`Chain`](crate::Chain) or [`Fork`](crate::Fork)
//! in one of two forms:
//! - a *promiser*, `FnOnce() -> Promise<T, E>`, which starts its work when
//!   called and returns the promise of its result;
//! - a *resolver*, `FnOnce(Resolve<T, E>, Reject<T, E>)`, which receives
//!   the settlement callbacks directly.
//!
//! Resolvers are turned into promisers by wrapping them in
//! [`Promise::new`]; from then on both forms are handled identically.

use crate::promise::{Promise, Reject, Resolve};

/// A boxed task that has not started yet.
pub type Promiser<T, E> = Box<dyn FnOnce() -> Promise<T, E>>;

/// Boxes a promiser.
pub fn promiser<T, E, F>(task: F) -> Promiser<T, E>
where
    F: FnOnce() -> Promise<T, E> + 'static,
{
    Box::new(task)
}

/// Adapts a resolver into a promiser.
///
/// The resolver runs when the returned promiser is called, not before.
pub fn from_resolver<T, E, R>(resolver: R) -> impl FnOnce() -> Promise<T, E> + 'static
where
    T: Clone + 'static,
    E: Clone + 'static,
    R: FnOnce(Resolve<T, E>, Reject<T, E>) + 'static,
{
    move || Promise::new(resolver)
}
