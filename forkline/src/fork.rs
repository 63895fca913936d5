//! Parallel regions.
//!
//! A [`Fork`] gathers tasks that should run side by side once a common
//! anchor promise settles, and collapses them back into a single promise
//! with one of three join policies.

use crate::error::Error;
use crate::promise::{self, Outcome, Promise, Reject, Resolve};
use crate::promiser::{self, Promiser};

use std::any::{Any, type_name};
use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;
use std::str::FromStr;

/// What a fork does with its queued tasks when its anchor rejects.
///
/// Either way the anchor's rejection is not swallowed: every join of the
/// fork rejects with the anchor's reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// Start queued tasks once the anchor settles, whatever its outcome.
    #[default]
    Settled,

    /// Start queued tasks only if the anchor fulfils. On rejection, queued
    /// and later tasks are dropped without being started.
    Fulfilled,
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "settled" => Ok(Activation::Settled),
            "fulfilled" => Ok(Activation::Fulfilled),
            other => Err(Error::invalid_argument(
                "activation",
                format!("expected `settled` or `fulfilled`, got `{other}`"),
            )),
        }
    }
}

enum Phase<T, E> {
    /// The anchor has not settled; tasks wait here in insertion order.
    Waiting(Vec<Promiser<T, E>>),

    /// The anchor settled and tasks start as soon as they are added.
    Active,

    /// The anchor rejected under [`Activation::Fulfilled`].
    Abandoned,
}

/// Shared state of a fork, reachable from the anchor's reaction.
struct Region<T, E> {
    phase: Phase<T, E>,

    /// Promises of started tasks, in start order.
    started: Vec<Promise<T, E>>,
}

impl<T, E> Region<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Activation transition, run once when the anchor settles.
    ///
    /// With `start`, every queued task is invoked in insertion order before
    /// this returns. Without it, the queued tasks are dropped unstarted.
    fn on_anchor_settled(region: &Rc<RefCell<Self>>, start: bool) {
        let next = if start { Phase::Active } else { Phase::Abandoned };
        let previous = mem::replace(&mut region.borrow_mut().phase, next);

        let queued = match previous {
            Phase::Waiting(queued) => queued,
            // Activation happens at most once.
            previous => {
                region.borrow_mut().phase = previous;
                return;
            }
        };

        if !start {
            tracing::debug!(
                discarded = queued.len(),
                "fork anchor rejected, queued tasks will not start"
            );
            return;
        }

        tracing::debug!(tasks = queued.len(), "fork anchor settled, starting queued tasks");

        let started: Vec<_> = queued.into_iter().map(|task| task()).collect();
        region.borrow_mut().started.extend(started);
    }
}

/// A parallel region gated on an anchor promise.
///
/// Tasks added before the anchor settles are queued; when it settles they
/// are all started together, in the order they were added. Tasks added
/// afterwards start immediately. One of [`join`](Self::join),
/// [`join_any`](Self::join_any) or [`join_settle`](Self::join_settle)
/// collapses the region into a single promise.
///
/// # Examples
///
/// ```rust,ignore
/// let mut fork = Fork::<u32, String>::new();
/// fork.add(|| fetch(1)).add(|| fetch(2));
///
/// let values = fork.join().await?;
/// ```
pub struct Fork<T, E> {
    region: Rc<RefCell<Region<T, E>>>,

    /// Settles right after activation, with the anchor's outcome.
    gate: Promise<(), E>,
}

impl<T, E> Fork<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Creates a fork whose anchor has already fulfilled.
    ///
    /// Tasks added now still wait for the first microtask turn and then
    /// start together.
    pub fn new() -> Self {
        Self::with_anchor(&Promise::<(), E>::resolved(()))
    }

    /// Creates a fork gated on `anchor` with the default [`Activation`].
    pub fn with_anchor<A>(anchor: &Promise<A, E>) -> Self
    where
        A: Clone + 'static,
    {
        Self::anchored(anchor, Activation::default())
    }

    /// Creates a fork gated on `anchor`.
    pub fn anchored<A>(anchor: &Promise<A, E>, activation: Activation) -> Self
    where
        A: Clone + 'static,
    {
        let region = Rc::new(RefCell::new(Region {
            phase: Phase::Waiting(Vec::new()),
            started: Vec::new(),
        }));

        let on_fulfilled = region.clone();
        let on_rejected = region.clone();

        let gate = anchor.then(
            move |_| {
                Region::on_anchor_settled(&on_fulfilled, true);
                Promise::resolved(())
            },
            move |reason| {
                Region::on_anchor_settled(&on_rejected, activation == Activation::Settled);
                Promise::rejected(reason)
            },
        );

        Self { region, gate }
    }

    /// Creates a fork from an anchor of unknown type.
    ///
    /// Accepts a `Promise<T, E>` or a `Promise<(), E>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `anchor` is neither.
    pub fn try_with_anchor(anchor: &dyn Any) -> Result<Self, Error> {
        if let Some(anchor) = anchor.downcast_ref::<Promise<T, E>>() {
            return Ok(Self::with_anchor(anchor));
        }

        if let Some(anchor) = anchor.downcast_ref::<Promise<(), E>>() {
            return Ok(Self::with_anchor(anchor));
        }

        Err(Error::invalid_argument(
            "anchor",
            format!(
                "expected a Promise<{}, {}>",
                type_name::<T>(),
                type_name::<E>()
            ),
        ))
    }

    /// Adds a promiser to the fork.
    ///
    /// Before activation the task is queued; afterwards it is called right
    /// away. If the anchor rejected under [`Activation::Fulfilled`], the
    /// task is dropped without being called.
    pub fn add<F>(&mut self, task: F) -> &mut Self
    where
        F: FnOnce() -> Promise<T, E> + 'static,
    {
        let runnable = {
            let mut region = self.region.borrow_mut();

            match &mut region.phase {
                Phase::Waiting(queued) => {
                    queued.push(promiser::promiser(task));
                    tracing::trace!(queued = queued.len(), "task queued until the fork anchor settles");
                    None
                }
                Phase::Active => Some(task),
                Phase::Abandoned => {
                    tracing::trace!("fork anchor rejected, task dropped without starting");
                    None
                }
            }
        };

        // Called without holding the borrow: a task may be arbitrary code.
        if let Some(task) = runnable {
            let started = task();
            self.region.borrow_mut().started.push(started);
        }

        self
    }

    /// Adds a resolver to the fork.
    ///
    /// Sugar for [`add`](Self::add) with the resolver wrapped in
    /// [`Promise::new`].
    pub fn add_resolver<R>(&mut self, resolver: R) -> &mut Self
    where
        R: FnOnce(Resolve<T, E>, Reject<T, E>) + 'static,
    {
        self.add(promiser::from_resolver(resolver))
    }

    /// Joins on every started task.
    ///
    /// Fulfils with all results in start order, or rejects with the first
    /// rejection to happen.
    pub fn join(&self) -> Promise<Vec<T>, E> {
        self.collapse(promise::all)
    }

    /// Joins on whichever started task settles first.
    ///
    /// With no tasks the returned promise stays pending forever.
    pub fn join_any(&self) -> Promise<T, E> {
        self.collapse(promise::any)
    }

    /// Joins on every started task and reports each outcome.
    ///
    /// Never rejects unless the anchor did.
    pub fn join_settle(&self) -> Promise<Vec<Outcome<T, E>>, E> {
        self.collapse(promise::settle)
    }

    /// Returns `true` once the anchor has settled and queued tasks started.
    pub fn is_activated(&self) -> bool {
        !matches!(self.region.borrow().phase, Phase::Waiting(_))
    }

    /// Returns the number of tasks waiting for activation.
    pub fn pending_len(&self) -> usize {
        match &self.region.borrow().phase {
            Phase::Waiting(queued) => queued.len(),
            Phase::Active | Phase::Abandoned => 0,
        }
    }

    /// Returns the number of tasks started so far.
    pub fn started_len(&self) -> usize {
        self.region.borrow().started.len()
    }

    /// Applies `combine` to the started tasks once the fork is activated.
    ///
    /// Tasks are read when the gate's reaction runs, so tasks added before
    /// that point are part of the join.
    fn collapse<U, J>(&self, combine: J) -> Promise<U, E>
    where
        U: Clone + 'static,
        J: FnOnce(Vec<Promise<T, E>>) -> Promise<U, E> + 'static,
    {
        let region = self.region.clone();

        self.gate.and_then(move |()| {
            let started = region.borrow().started.clone();
            combine(started)
        })
    }
}

impl<T, E> Default for Fork<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Fork<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let region = self.region.borrow();
        let (phase, queued) = match &region.phase {
            Phase::Waiting(queued) => ("waiting", queued.len()),
            Phase::Active => ("active", 0),
            Phase::Abandoned => ("abandoned", 0),
        };

        f.debug_struct("Fork")
            .field("phase", &phase)
            .field("queued", &queued)
            .field("started", &region.started.len())
            .finish()
    }
}
