mod common;

use common::{Log, failing, fast, slow};
use forkline::promise::{self, Outcome, Promise};
use forkline::{Error, RuntimeBuilder};

use std::cell::Cell;
use std::rc::Rc;

#[forkline::test]
async fn promise_executor_runs_synchronously() {
    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();

    let promise = Promise::<u32, String>::new(move |resolve, _reject| {
        flag.set(true);
        resolve.call(7);
    });

    assert!(ran.get(), "Executor should run before `new` returns");
    assert!(!promise.is_pending());
    assert_eq!(promise.await, Ok(7));
}

#[forkline::test]
async fn promise_reactions_never_run_synchronously() {
    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();

    let next = Promise::<u32, String>::resolved(1).map(move |n| {
        flag.set(true);
        n + 1
    });

    assert!(!ran.get(), "Reaction ran inside `map`");
    assert!(next.is_pending());
    assert_eq!(next.await, Ok(2));
    assert!(ran.get());
}

#[forkline::test]
async fn promise_first_settlement_wins() {
    let (promise, resolve, reject) = Promise::<u32, String>::deferred();

    resolve.clone().call(1);
    resolve.call(2);
    reject.call("too late".to_string());

    assert_eq!(promise.await, Ok(1));
}

#[forkline::test]
async fn promise_continuations() {
    let chained = Promise::<u32, String>::resolved(20)
        .and_then(|n| Promise::resolved(n + 1))
        .map(|n| n * 2);
    assert_eq!(chained.await, Ok(42));

    let skipped = Promise::<u32, String>::rejected("boom".to_string())
        .and_then(|n| Promise::resolved(n + 1))
        .map(|n| n * 2);
    assert_eq!(skipped.await, Err("boom".to_string()));

    let recovered = Promise::<u32, String>::rejected("boom".to_string())
        .or_else(|reason| Promise::resolved(reason.len() as u32));
    assert_eq!(recovered.await, Ok(4));

    let adopted = Promise::<u32, String>::resolved(1)
        .then(|_| Promise::<u32, String>::rejected("adopted".to_string()), Promise::rejected);
    assert_eq!(adopted.await, Err("adopted".to_string()));
}

#[forkline::test]
async fn promise_reactions_run_in_registration_order() {
    let log = Log::new();
    let (promise, resolve, _reject) = Promise::<u32, String>::deferred();

    let first = {
        let log = log.clone();
        promise.map(move |_| log.push("first".to_string()))
    };
    let second = {
        let log = log.clone();
        promise.map(move |_| log.push("second".to_string()))
    };

    resolve.call(0);

    assert_eq!(second.await, Ok(()));
    assert_eq!(first.await, Ok(()));
    assert_eq!(log.entries(), vec!["first", "second"]);
}

#[forkline::test]
async fn promise_spawn_settles_with_the_future_output() {
    let ok = Promise::<u32, String>::spawn(async { Ok(5) });
    let err = Promise::<u32, String>::spawn(async { Err("failed".to_string()) });

    assert_eq!(ok.await, Ok(5));
    assert_eq!(err.await, Err("failed".to_string()));
}

#[forkline::test]
async fn all_keeps_input_order() {
    let log = Log::new();

    let values = promise::all([slow(&log, "l1")(), fast(&log, "f1")()]).await;

    assert_eq!(values, Ok(vec!["l1".to_string(), "f1".to_string()]));
    assert!(log.before("f1 finish", "l1 finish"));
}

#[forkline::test]
async fn all_fails_fast() {
    let log = Log::new();

    let values = promise::all([slow(&log, "l1")(), failing(&log, "e1")()]).await;

    assert_eq!(values, Err("e1 reject".to_string()));
    assert!(!log.contains("l1 finish"));
}

#[forkline::test]
async fn all_of_nothing_is_empty() {
    let values = promise::all(Vec::<Promise<u32, String>>::new()).await;

    assert_eq!(values, Ok(Vec::new()));
}

#[forkline::test]
async fn any_takes_the_first_settlement() {
    let log = Log::new();

    let first = promise::any([slow(&log, "l1")(), fast(&log, "f1")()]).await;
    assert_eq!(first, Ok("f1".to_string()));

    let first = promise::any([slow(&log, "l2")(), failing(&log, "e1")()]).await;
    assert_eq!(first, Err("e1 reject".to_string()));
}

#[test]
fn any_of_nothing_never_settles() {
    let runtime = RuntimeBuilder::new().build();

    let result = runtime.block_on(promise::any(Vec::<Promise<u32, String>>::new()));

    assert_eq!(result, Err(Error::Stalled));
}

#[forkline::test]
async fn settle_reports_every_outcome_in_order() {
    let log = Log::new();

    let outcomes = promise::settle([failing(&log, "e1")(), fast(&log, "f1")()]).await;

    assert_eq!(
        outcomes,
        Ok(vec![
            Outcome::Rejected("e1 reject".to_string()),
            Outcome::Fulfilled("f1".to_string()),
        ])
    );

    let empty = promise::settle(Vec::<Promise<u32, String>>::new()).await;
    assert_eq!(empty, Ok(Vec::new()));
}

#[test]
fn outcome_accessors() {
    let fulfilled: Outcome<u32, String> = Ok(3).into();
    let rejected: Outcome<u32, String> = Outcome::Rejected("no".to_string());

    assert!(fulfilled.is_fulfilled());
    assert_eq!(fulfilled.value(), Some(&3));
    assert_eq!(fulfilled.reason(), None);

    assert!(rejected.is_rejected());
    assert_eq!(rejected.reason().map(String::as_str), Some("no"));
    assert_eq!(rejected.into_result(), Err("no".to_string()));
}
