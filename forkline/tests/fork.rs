mod common;

use common::{FAST, Log, SLOW, failing, failing_after, fast, slow, timed_resolver};
use forkline::time::sleep;
use forkline::{Activation, Error, Fork, Outcome, Promise};

use std::time::Duration;

#[forkline::test]
async fn fork_queues_tasks_until_the_anchor_settles() {
    let log = Log::new();
    let (anchor, resolve, _reject) = Promise::<(), String>::deferred();

    let mut fork = Fork::with_anchor(&anchor);
    fork.add(fast(&log, "f1")).add(fast(&log, "f2"));

    sleep(FAST).await;

    assert!(!fork.is_activated());
    assert_eq!(fork.pending_len(), 2);
    assert_eq!(fork.started_len(), 0);
    assert!(log.entries().is_empty(), "Tasks started before the anchor settled");

    resolve.call(());

    let values = fork.join().await;

    assert_eq!(values, Ok(vec!["f1".to_string(), "f2".to_string()]));
    assert!(fork.is_activated());
    assert_eq!(fork.pending_len(), 0);
    assert_eq!(fork.started_len(), 2);
    assert_eq!(&log.entries()[..2], ["f1 start", "f2 start"]);
}

#[forkline::test]
async fn fork_starts_late_tasks_on_add() {
    let log = Log::new();
    let mut fork = Fork::new();

    // One microtask turn activates a fork with a settled anchor.
    sleep(Duration::from_millis(1)).await;
    assert!(fork.is_activated());

    fork.add(fast(&log, "f1"));

    assert_eq!(log.entries(), vec!["f1 start"]);
    assert_eq!(fork.started_len(), 1);
    assert_eq!(fork.join().await, Ok(vec!["f1".to_string()]));
}

#[forkline::test]
async fn fork_join_of_nothing_is_empty() {
    let fork = Fork::<String, String>::new();

    assert_eq!(fork.join().await, Ok(Vec::new()));
    assert_eq!(fork.join_settle().await, Ok(Vec::new()));
}

#[forkline::test]
async fn fork_join_fails_fast() {
    let log = Log::new();
    let mut fork = Fork::new();

    fork.add(slow(&log, "l1")).add(failing(&log, "e1"));

    assert_eq!(fork.join().await, Err("e1 reject".to_string()));
    assert!(!log.contains("l1 finish"), "join should not wait for the slow task");
}

#[forkline::test]
async fn fork_join_rejects_with_the_earliest_rejection() {
    let log = Log::new();
    let mut fork = Fork::new();

    fork.add(failing_after(&log, "late", SLOW))
        .add(fast(&log, "f1"))
        .add(failing_after(&log, "early", FAST));

    assert_eq!(fork.join().await, Err("early reject".to_string()));
    assert!(log.before("late start", "early start"));
    assert!(!log.contains("late finish"));
}

#[forkline::test]
async fn fork_join_any_takes_the_fastest() {
    let log = Log::new();
    let mut fork = Fork::new();

    fork.add(slow(&log, "l1")).add(fast(&log, "f1"));

    assert_eq!(fork.join_any().await, Ok("f1".to_string()));
}

#[forkline::test]
async fn fork_join_any_forwards_a_first_rejection() {
    let log = Log::new();
    let mut fork = Fork::new();

    fork.add(slow(&log, "l1")).add(failing(&log, "e1"));

    assert_eq!(fork.join_any().await, Err("e1 reject".to_string()));
}

#[forkline::test]
async fn fork_join_settle_never_rejects() {
    let log = Log::new();
    let mut fork = Fork::new();

    fork.add_resolver(timed_resolver(&log, "r1", FAST, true))
        .add_resolver(timed_resolver(&log, "r2", FAST, false));

    assert_eq!(
        fork.join_settle().await,
        Ok(vec![
            Outcome::Rejected("r1 reject".to_string()),
            Outcome::Fulfilled("r2".to_string()),
        ])
    );
}

#[forkline::test]
async fn fork_joins_can_be_repeated() {
    let log = Log::new();
    let mut fork = Fork::new();

    fork.add(fast(&log, "f1"));

    let first = fork.join();
    let second = fork.join();

    assert_eq!(first.await, second.await);
    assert_eq!(log.entries(), vec!["f1 start", "f1 finish"]);
}

#[forkline::test]
async fn fork_forwards_the_anchor_rejection() {
    let log = Log::new();
    let anchor = Promise::<(), String>::rejected("anchor failed".to_string());

    let mut fork = Fork::with_anchor(&anchor);
    fork.add(fast(&log, "f1"));

    assert_eq!(fork.join().await, Err("anchor failed".to_string()));
    assert_eq!(fork.join_settle().await, Err("anchor failed".to_string()));
    assert!(fork.is_activated());
    assert!(log.contains("f1 start"));
}

#[forkline::test]
async fn fork_fulfilled_activation_drops_tasks() {
    let log = Log::new();
    let anchor = Promise::<(), String>::rejected("anchor failed".to_string());

    let mut fork = Fork::anchored(&anchor, Activation::Fulfilled);
    fork.add(fast(&log, "f1"));

    assert_eq!(fork.join_any().await, Err("anchor failed".to_string()));

    fork.add(fast(&log, "f2"));
    sleep(FAST).await;

    assert!(log.entries().is_empty());
    assert_eq!(fork.pending_len(), 0);
    assert_eq!(fork.started_len(), 0);
}

#[forkline::test]
async fn fork_try_with_anchor() {
    let typed = Promise::<String, String>::resolved("anchor".to_string());
    assert!(Fork::<String, String>::try_with_anchor(&typed).is_ok());

    let unit = Promise::<(), String>::resolved(());
    assert!(Fork::<String, String>::try_with_anchor(&unit).is_ok());

    let result = Fork::<String, String>::try_with_anchor(&42_u32);
    assert!(matches!(result, Err(Error::InvalidArgument { name: "anchor", .. })));
}

#[test]
fn fork_activation_from_str() {
    assert_eq!("settled".parse::<Activation>(), Ok(Activation::Settled));
    assert_eq!(" Fulfilled ".parse::<Activation>(), Ok(Activation::Fulfilled));
    assert_eq!(Activation::default(), Activation::Settled);
    assert!(matches!(
        "resolved".parse::<Activation>(),
        Err(Error::InvalidArgument { name: "activation", .. })
    ));
}
