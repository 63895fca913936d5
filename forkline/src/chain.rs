//! Sequential pipelines with optional parallel regions.
//!
//! A [`Chain`] keeps one tail promise standing for everything appended so
//! far. Appends extend the tail one step at a time until [`Chain::fork`]
//! opens a parallel region; appends then go to the region until one of the
//! join methods folds it back into the tail.

use crate::error::Error;
use crate::fork::{Activation, Fork};
use crate::promise::{self, Outcome, Promise, Reject, Resolve};
use crate::promiser;

use std::any::{Any, type_name};
use std::fmt;
use std::future::IntoFuture;

/// The value a chain's tail settles with.
///
/// Each step of a chain leaves a differently shaped result behind; the tail
/// records that shape instead of interpreting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<T, E> {
    /// Nothing ran: the chain had no parent and no step.
    Empty,

    /// Result of a sequential task, or of the winner of a `join_any`.
    Value(T),

    /// Results of a `join` or of an `append_many` step, in start order.
    All(Vec<Completion<T, E>>),

    /// Outcomes of a `join_settle`, in start order.
    Settled(Vec<Outcome<Completion<T, E>, E>>),
}

impl<T, E> Completion<T, E> {
    /// Returns the value of a [`Completion::Value`].
    pub fn value(&self) -> Option<&T> {
        match self {
            Completion::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Consumes the completion and returns the value of a
    /// [`Completion::Value`]; any other shape yields `None`.
    pub fn into_value(self) -> Option<T> {
        match self {
            Completion::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Returns every task value in the completion, depth first.
    ///
    /// Rejected members of a settle-join contribute nothing.
    pub fn values(&self) -> Vec<&T> {
        let mut values = Vec::new();
        self.collect_values(&mut values);
        values
    }

    fn collect_values<'a>(&'a self, values: &mut Vec<&'a T>) {
        match self {
            Completion::Empty => {}
            Completion::Value(value) => values.push(value),
            Completion::All(members) => {
                for member in members {
                    member.collect_values(values);
                }
            }
            Completion::Settled(outcomes) => {
                for member in outcomes.iter().filter_map(Outcome::value) {
                    member.collect_values(values);
                }
            }
        }
    }
}

/// A step of the chain that has not started yet.
type Step<T, E> = Box<dyn FnOnce() -> Promise<Completion<T, E>, E>>;

/// A pipeline of tasks, sequential by default, with fork/join regions.
///
/// Every method that changes the chain takes it by value and hands it back,
/// so a pipeline reads as one expression. [`then`](Self::then) and `.await`
/// end the chain; both fold any open region with an all-join first.
///
/// # Examples
///
/// ```rust,ignore
/// let completion = Chain::<u32, String>::new()
///     .append(|| load(1))
///     .fork()
///     .append(|| load(2))
///     .append(|| load(3))
///     .join()
///     .append(|| load(4))
///     .await?;
/// ```
pub struct Chain<T, E> {
    tail: Promise<Completion<T, E>, E>,
    fork: Option<Fork<Completion<T, E>, E>>,
    activation: Activation,
}

impl<T, E> Chain<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Creates an empty chain; its first step starts on the next microtask
    /// turn.
    pub fn new() -> Self {
        Self::from_tail(Promise::resolved(Completion::Empty))
    }

    /// Creates a chain whose first step waits for `parent`.
    pub fn with_parent(parent: &Promise<T, E>) -> Self {
        Self::from_tail(parent.map(Completion::Value))
    }

    /// Creates a chain from a parent of unknown type.
    ///
    /// Accepts a `Promise<T, E>`, or the `Promise<Completion<T, E>, E>` of
    /// another chain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `parent` is neither.
    pub fn try_with_parent(parent: &dyn Any) -> Result<Self, Error> {
        if let Some(parent) = parent.downcast_ref::<Promise<T, E>>() {
            return Ok(Self::with_parent(parent));
        }

        if let Some(tail) = parent.downcast_ref::<Promise<Completion<T, E>, E>>() {
            return Ok(Self::from_tail(tail.clone()));
        }

        Err(Error::invalid_argument(
            "parent",
            format!(
                "expected a Promise<{}, {}>",
                type_name::<T>(),
                type_name::<E>()
            ),
        ))
    }

    fn from_tail(tail: Promise<Completion<T, E>, E>) -> Self {
        Self {
            tail,
            fork: None,
            activation: Activation::default(),
        }
    }

    /// Sets the activation policy of forks opened from now on.
    pub fn activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Appends a promiser.
    ///
    /// Without an open fork the task starts once everything before it
    /// fulfilled; if anything before it rejected, it never starts and the
    /// rejection carries on down the chain. With an open fork the task joins
    /// the fork instead.
    pub fn append<F>(self, task: F) -> Self
    where
        F: FnOnce() -> Promise<T, E> + 'static,
    {
        self.push(Box::new(move || task().map(Completion::Value)))
    }

    /// Appends a resolver.
    pub fn append_resolver<R>(self, resolver: R) -> Self
    where
        R: FnOnce(Resolve<T, E>, Reject<T, E>) + 'static,
    {
        self.append(promiser::from_resolver(resolver))
    }

    /// Appends one step that starts every task together and waits for all
    /// of them, failing on the first rejection.
    ///
    /// This is a single step, not a fork: the step is placed like any other
    /// append, sequentially or into the open fork.
    pub fn append_many<I, F>(self, tasks: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Promise<T, E> + 'static,
    {
        let tasks: Vec<F> = tasks.into_iter().collect();

        self.push(Box::new(move || {
            let started = tasks.into_iter().map(|task| task());

            promise::all(started)
                .map(|values| Completion::All(values.into_iter().map(Completion::Value).collect()))
        }))
    }

    /// Appends one step that starts every resolver together and waits for
    /// all of them.
    pub fn append_many_resolvers<I, R>(self, resolvers: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: FnOnce(Resolve<T, E>, Reject<T, E>) + 'static,
    {
        self.append_many(resolvers.into_iter().map(promiser::from_resolver))
    }

    /// Opens a parallel region anchored at the current tail.
    ///
    /// Does nothing while a region is already open.
    pub fn fork(mut self) -> Self {
        if self.fork.is_some() {
            tracing::debug!("fork ignored, a fork is already open");
            return self;
        }

        self.fork = Some(Fork::anchored(&self.tail, self.activation));
        self
    }

    /// Closes the open region, waiting for all of its tasks.
    ///
    /// Does nothing if no region is open.
    pub fn join(mut self) -> Self {
        if let Some(fork) = self.take_fork() {
            self.tail = fork.join().map(Completion::All);
        }

        self
    }

    /// Closes the open region on whichever task settles first.
    ///
    /// Does nothing if no region is open. A region without tasks never
    /// settles, so a runtime driving the chain to completion fails with
    /// [`Error::Stalled`].
    pub fn join_any(mut self) -> Self {
        if let Some(fork) = self.take_fork() {
            self.tail = fork.join_any();
        }

        self
    }

    /// Closes the open region once all of its tasks settled, recording each
    /// outcome instead of failing.
    ///
    /// Does nothing if no region is open.
    pub fn join_settle(mut self) -> Self {
        if let Some(fork) = self.take_fork() {
            self.tail = fork.join_settle().map(Completion::Settled);
        }

        self
    }

    /// Ends the chain with both continuations.
    ///
    /// An open region is closed with [`join`](Self::join) first.
    pub fn then<U, F, G>(self, on_fulfilled: F, on_rejected: G) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(Completion<T, E>) -> Promise<U, E> + 'static,
        G: FnOnce(E) -> Promise<U, E> + 'static,
    {
        self.join().tail.then(on_fulfilled, on_rejected)
    }

    /// Returns the current tail without changing the chain.
    ///
    /// An open region is not part of the tail until it is joined.
    pub fn promise(&self) -> Promise<Completion<T, E>, E> {
        self.tail.clone()
    }

    /// Returns `true` while a region is open.
    pub fn is_forked(&self) -> bool {
        self.fork.is_some()
    }

    fn take_fork(&mut self) -> Option<Fork<Completion<T, E>, E>> {
        let fork = self.fork.take();

        if fork.is_none() {
            tracing::debug!("join ignored, no fork is open");
        }

        fork
    }

    fn push(mut self, step: Step<T, E>) -> Self {
        match self.fork.as_mut() {
            Some(fork) => {
                fork.add(step);
            }
            None => {
                tracing::trace!("sequential step appended");
                self.tail = self.tail.and_then(move |_| step());
            }
        }

        self
    }
}

impl<T, E> Default for Chain<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> IntoFuture for Chain<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    type Output = Result<Completion<T, E>, E>;
    type IntoFuture = Promise<Completion<T, E>, E>;

    /// Closes an open region with an all-join and awaits the tail.
    fn into_future(self) -> Self::IntoFuture {
        self.join().tail
    }
}

impl<T, E> fmt::Debug for Chain<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("tail", &self.tail)
            .field("fork", &self.fork)
            .field("activation", &self.activation)
            .finish()
    }
}
