use crate::runtime::context;
use crate::runtime::task;
use crate::runtime::task::waker::WeakWaker;

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Callback run once a promise settles.
type Reaction<T, E> = Box<dyn FnOnce(Result<T, E>)>;

enum State<T, E> {
    Pending,
    Fulfilled(T),
    Rejected(E),
}

/// The settlement cell every handle to a promise points at.
struct Shared<T, E> {
    state: State<T, E>,

    /// Reactions registered through `then` and friends while pending.
    reactions: Vec<Reaction<T, E>>,

    /// Tasks awaiting the promise as a [`Future`].
    waiters: Vec<Waiter>,
}

type SharedCell<T, E> = Rc<RefCell<Shared<T, E>>>;

/// A task awaiting a promise.
enum Waiter {
    /// The runtime's own waker, held weakly: only code on the runtime
    /// thread can settle the promise.
    Local(WeakWaker),

    /// A waker from elsewhere, e.g. wrapped by a foreign combinator.
    Foreign(Waker),
}

impl Waiter {
    fn new(waker: &Waker) -> Self {
        match context::weak_waker(waker) {
            Some(weak) => Waiter::Local(weak),
            None => Waiter::Foreign(waker.clone()),
        }
    }

    fn will_wake(&self, other: &Waiter) -> bool {
        match (self, other) {
            (Waiter::Local(a), Waiter::Local(b)) => a.will_wake(b),
            (Waiter::Foreign(a), Waiter::Foreign(b)) => a.will_wake(b),
            _ => false,
        }
    }

    fn wake(self) {
        match self {
            Waiter::Local(weak) => weak.wake(),
            Waiter::Foreign(waker) => waker.wake(),
        }
    }
}

/// An eagerly started asynchronous value.
///
/// A `Promise` settles exactly once, either fulfilled with a `T` or
/// rejected with an `E`. Whatever produces the value is already running by
/// the time the promise exists: creating a promise is starting the work.
///
/// Handles are cheap to clone and all observe the same settlement, which is
/// why `T` and `E` must be `Clone`. Reactions attached with
/// [`then`](Self::then) never run synchronously: they are queued as
/// microtasks once the promise settles, in the order they were attached.
///
/// A promise can also be `.await`ed; it resolves to `Result<T, E>`.
///
/// # Examples
///
/// ```rust,ignore
/// let doubled = Promise::<u32, String>::new(|resolve, _reject| resolve.call(21))
///     .map(|n| n * 2);
///
/// assert_eq!(doubled.await, Ok(42));
/// ```
pub struct Promise<T, E> {
    shared: SharedCell<T, E>,
}

/// Fulfils the promise it was created with.
///
/// Only the first call to either [`Resolve::call`] or [`Reject::call`] of a
/// promise has an effect.
pub struct Resolve<T, E> {
    shared: SharedCell<T, E>,
}

/// Rejects the promise it was created with.
///
/// Only the first call to either [`Resolve::call`] or [`Reject::call`] of a
/// promise has an effect.
pub struct Reject<T, E> {
    shared: SharedCell<T, E>,
}

impl<T, E> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Creates a promise and runs `executor` with its settlement callbacks.
    ///
    /// The executor runs synchronously, before `new` returns. It may settle
    /// right away or hand the callbacks to work that settles later.
    pub fn new<X>(executor: X) -> Self
    where
        X: FnOnce(Resolve<T, E>, Reject<T, E>),
    {
        let (promise, resolve, reject) = Self::deferred();
        executor(resolve, reject);
        promise
    }

    /// Creates a pending promise together with its settlement callbacks.
    pub fn deferred() -> (Self, Resolve<T, E>, Reject<T, E>) {
        let shared = Rc::new(RefCell::new(Shared {
            state: State::Pending,
            reactions: Vec::new(),
            waiters: Vec::new(),
        }));

        (
            Self {
                shared: shared.clone(),
            },
            Resolve {
                shared: shared.clone(),
            },
            Reject { shared },
        )
    }

    /// Creates an already fulfilled promise.
    pub fn resolved(value: T) -> Self {
        Self::settled(State::Fulfilled(value))
    }

    /// Creates an already rejected promise.
    pub fn rejected(reason: E) -> Self {
        Self::settled(State::Rejected(reason))
    }

    fn settled(state: State<T, E>) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                state,
                reactions: Vec::new(),
                waiters: Vec::new(),
            })),
        }
    }

    /// Spawns `future` on the current runtime and returns a promise of its
    /// output.
    ///
    /// # Panics
    ///
    /// Panics if called outside the context of a running runtime.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + 'static,
    {
        let (promise, resolve, reject) = Self::deferred();

        task::spawn(async move {
            match future.await {
                Ok(value) => resolve.call(value),
                Err(reason) => reject.call(reason),
            }
        });

        promise
    }

    /// Returns `true` while the promise has not settled.
    pub fn is_pending(&self) -> bool {
        matches!(self.shared.borrow().state, State::Pending)
    }

    /// Attaches both continuations and returns the promise of their result.
    ///
    /// Exactly one of the two runs, as a microtask, once this promise
    /// settles. The returned promise adopts the outcome of the promise the
    /// continuation produces.
    pub fn then<U, F, G>(&self, on_fulfilled: F, on_rejected: G) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Promise<U, E> + 'static,
        G: FnOnce(E) -> Promise<U, E> + 'static,
    {
        let (next, resolve, reject) = Promise::deferred();

        self.subscribe(move |result| {
            let adopted = match result {
                Ok(value) => on_fulfilled(value),
                Err(reason) => on_rejected(reason),
            };

            adopted.subscribe(move |result| match result {
                Ok(value) => resolve.call(value),
                Err(reason) => reject.call(reason),
            });
        });

        next
    }

    /// Runs `on_fulfilled` after this promise fulfils.
    ///
    /// A rejection skips `on_fulfilled` and is forwarded unchanged.
    pub fn and_then<U, F>(&self, on_fulfilled: F) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Promise<U, E> + 'static,
    {
        self.then(on_fulfilled, Promise::rejected)
    }

    /// Runs `on_rejected` after this promise rejects.
    ///
    /// A fulfilment skips `on_rejected` and is forwarded unchanged.
    pub fn or_else<G>(&self, on_rejected: G) -> Promise<T, E>
    where
        G: FnOnce(E) -> Promise<T, E> + 'static,
    {
        self.then(Promise::resolved, on_rejected)
    }

    /// Maps the fulfilled value, forwarding a rejection unchanged.
    pub fn map<U, F>(&self, f: F) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> U + 'static,
    {
        let (next, resolve, reject) = Promise::deferred();

        self.subscribe(move |result| match result {
            Ok(value) => resolve.call(f(value)),
            Err(reason) => reject.call(reason),
        });

        next
    }

    /// Registers a reaction that receives the settlement as a `Result`.
    ///
    /// The reaction is queued as a microtask right away if the promise has
    /// already settled, otherwise as soon as it does.
    pub(crate) fn subscribe<F>(&self, reaction: F)
    where
        F: FnOnce(Result<T, E>) + 'static,
    {
        let result = {
            let mut guard = self.shared.borrow_mut();
            let shared = &mut *guard;

            match &shared.state {
                State::Pending => {
                    shared.reactions.push(Box::new(reaction));
                    return;
                }
                State::Fulfilled(value) => Ok(value.clone()),
                State::Rejected(reason) => Err(reason.clone()),
            }
        };

        context::enqueue(Box::new(move || reaction(result)));
    }
}

/// Moves a pending promise to its final state and releases its observers.
fn settle<T, E>(shared: &SharedCell<T, E>, result: Result<T, E>)
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    let (reactions, waiters) = {
        let mut shared = shared.borrow_mut();

        if !matches!(shared.state, State::Pending) {
            return;
        }

        shared.state = match &result {
            Ok(value) => State::Fulfilled(value.clone()),
            Err(reason) => State::Rejected(reason.clone()),
        };

        (
            mem::take(&mut shared.reactions),
            mem::take(&mut shared.waiters),
        )
    };

    for reaction in reactions {
        let result = result.clone();
        context::enqueue(Box::new(move || reaction(result)));
    }

    for waiter in waiters {
        waiter.wake();
    }
}

impl<T, E> Resolve<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Fulfils the promise with `value` unless it already settled.
    pub fn call(self, value: T) {
        settle(&self.shared, Ok(value));
    }
}

impl<T, E> Reject<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Rejects the promise with `reason` unless it already settled.
    pub fn call(self, reason: E) {
        settle(&self.shared, Err(reason));
    }
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T, E> Clone for Resolve<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T, E> Clone for Reject<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T, E> Future for Promise<T, E>
where
    T: Clone,
    E: Clone,
{
    type Output = Result<T, E>;

    /// Polls the promise.
    ///
    /// Once settled, every poll yields a clone of the settlement. While
    /// pending, the waker is registered unless an equivalent one already is.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut guard = self.shared.borrow_mut();
        let shared = &mut *guard;

        match &shared.state {
            State::Fulfilled(value) => Poll::Ready(Ok(value.clone())),
            State::Rejected(reason) => Poll::Ready(Err(reason.clone())),
            State::Pending => {
                let waiter = Waiter::new(cx.waker());

                if !shared.waiters.iter().any(|w| w.will_wake(&waiter)) {
                    shared.waiters.push(waiter);
                }

                Poll::Pending
            }
        }
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.shared.borrow().state {
            State::Pending => "pending",
            State::Fulfilled(_) => "fulfilled",
            State::Rejected(_) => "rejected",
        };

        f.debug_struct("Promise").field("state", &state).finish()
    }
}
