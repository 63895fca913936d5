#![allow(dead_code)]

use forkline::time::sleep;
use forkline::{Promise, Reject, Resolve, task};

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

pub const FAST: Duration = Duration::from_millis(10);
pub const SLOW: Duration = Duration::from_millis(100);

/// Ordered record of task starts and finishes.
#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<String>>>);

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.borrow().iter().any(|e| e == entry)
    }

    /// Position of `entry` in the log; panics if it was never logged.
    pub fn index_of(&self, entry: &str) -> usize {
        self.0
            .borrow()
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("`{entry}` missing from {:?}", self.entries()))
    }

    pub fn before(&self, first: &str, second: &str) -> bool {
        self.index_of(first) < self.index_of(second)
    }
}

/// A promiser that logs its start, waits `delay`, logs its finish and
/// fulfils with its name.
pub fn timed(
    log: &Log,
    name: &'static str,
    delay: Duration,
) -> impl FnOnce() -> Promise<String, String> + 'static {
    let log = log.clone();

    move || {
        log.push(format!("{name} start"));

        Promise::spawn(async move {
            sleep(delay).await;
            log.push(format!("{name} finish"));
            Ok(name.to_string())
        })
    }
}

pub fn fast(log: &Log, name: &'static str) -> impl FnOnce() -> Promise<String, String> + 'static {
    timed(log, name, FAST)
}

pub fn slow(log: &Log, name: &'static str) -> impl FnOnce() -> Promise<String, String> + 'static {
    timed(log, name, SLOW)
}

/// A promiser that rejects with `"<name> reject"` after `delay`.
pub fn failing_after(
    log: &Log,
    name: &'static str,
    delay: Duration,
) -> impl FnOnce() -> Promise<String, String> + 'static {
    let log = log.clone();

    move || {
        log.push(format!("{name} start"));

        Promise::spawn(async move {
            sleep(delay).await;
            log.push(format!("{name} finish"));
            Err(format!("{name} reject"))
        })
    }
}

pub fn failing(log: &Log, name: &'static str) -> impl FnOnce() -> Promise<String, String> + 'static {
    failing_after(log, name, FAST)
}

/// Resolver form of [`timed`]: settles through the callbacks it is handed.
pub fn timed_resolver(
    log: &Log,
    name: &'static str,
    delay: Duration,
    fail: bool,
) -> impl FnOnce(Resolve<String, String>, Reject<String, String>) + 'static {
    let log = log.clone();

    move |resolve, reject| {
        log.push(format!("{name} start"));

        task::spawn(async move {
            sleep(delay).await;
            log.push(format!("{name} finish"));

            if fail {
                reject.call(format!("{name} reject"));
            } else {
                resolve.call(name.to_string());
            }
        });
    }
}

pub fn value(name: &str) -> forkline::Completion<String, String> {
    forkline::Completion::Value(name.to_string())
}
