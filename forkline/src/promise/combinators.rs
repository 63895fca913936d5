use super::{Outcome, Promise};

use std::cell::RefCell;
use std::rc::Rc;

/// Slots filled in as members settle, in member order.
struct Gather<V> {
    slots: Vec<Option<V>>,
    remaining: usize,
}

impl<V> Gather<V> {
    fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| None).collect(),
            remaining: len,
        }
    }

    /// Stores the value of member `index`.
    ///
    /// Returns every value, in member order, once the last slot is filled.
    fn fill(&mut self, index: usize, value: V) -> Option<Vec<V>> {
        self.slots[index] = Some(value);
        self.remaining -= 1;

        if self.remaining > 0 {
            return None;
        }

        Some(self.slots.drain(..).flatten().collect())
    }
}

/// Waits for every promise to fulfil.
///
/// Fulfils with the values in the order the promises were given. Rejects
/// with the first rejection to happen, without waiting for the others; the
/// others keep running and their outcomes are dropped. An empty input
/// fulfils with an empty vector.
pub fn all<T, E, I>(promises: I) -> Promise<Vec<T>, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = Promise<T, E>>,
{
    let promises: Vec<_> = promises.into_iter().collect();

    if promises.is_empty() {
        return Promise::resolved(Vec::new());
    }

    let (combined, resolve, reject) = Promise::deferred();
    let gather = Rc::new(RefCell::new(Gather::new(promises.len())));

    for (index, promise) in promises.iter().enumerate() {
        let gather = gather.clone();
        let resolve = resolve.clone();
        let reject = reject.clone();

        promise.subscribe(move |result| match result {
            Ok(value) => {
                let done = gather.borrow_mut().fill(index, value);
                if let Some(values) = done {
                    resolve.call(values);
                }
            }
            Err(reason) => reject.call(reason),
        });
    }

    combined
}

/// Settles like whichever promise settles first, fulfilled or rejected.
///
/// An empty input never settles.
pub fn any<T, E, I>(promises: I) -> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = Promise<T, E>>,
{
    let (combined, resolve, reject) = Promise::deferred();

    for promise in promises {
        let resolve = resolve.clone();
        let reject = reject.clone();

        promise.subscribe(move |result| match result {
            Ok(value) => resolve.call(value),
            Err(reason) => reject.call(reason),
        });
    }

    combined
}

/// Waits for every promise to settle and reports each outcome.
///
/// Never rejects. The outcomes are in the order the promises were given. An
/// empty input fulfils with an empty vector.
pub fn settle<T, E, I>(promises: I) -> Promise<Vec<Outcome<T, E>>, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = Promise<T, E>>,
{
    let promises: Vec<_> = promises.into_iter().collect();

    if promises.is_empty() {
        return Promise::resolved(Vec::new());
    }

    let (combined, resolve, _reject) = Promise::deferred();
    let gather = Rc::new(RefCell::new(Gather::new(promises.len())));

    for (index, promise) in promises.iter().enumerate() {
        let gather = gather.clone();
        let resolve = resolve.clone();

        promise.subscribe(move |result| {
            let done = gather.borrow_mut().fill(index, Outcome::from(result));
            if let Some(outcomes) = done {
                resolve.call(outcomes);
            }
        });
    }

    combined
}
