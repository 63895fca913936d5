//! Example: A pipeline that fans out and back in
//!
//! Run with `RUST_LOG=forkline=trace` to see the chain's events.

use forkline::time::sleep;
use forkline::{Chain, Promise, RuntimeBuilder};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

fn step(name: &'static str, millis: u64, origin: Instant) -> impl FnOnce() -> Promise<String, String> + 'static {
    move || {
        println!("[{:>4}ms] {name} started", origin.elapsed().as_millis());

        Promise::spawn(async move {
            sleep(Duration::from_millis(millis)).await;
            println!("[{:>4}ms] {name} finished", origin.elapsed().as_millis());
            Ok(name.to_string())
        })
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("forkline=info")),
        )
        .init();

    let runtime = RuntimeBuilder::from_env()
        .unwrap_or_else(|err| panic!("bad runtime configuration: {err}"))
        .build();

    let origin = Instant::now();

    let result = runtime.block_on(async move {
        // `fetch` runs first, the three parses run side by side, `store`
        // waits for all of them.
        Chain::new()
            .append(step("fetch", 30, origin))
            .fork()
            .append(step("parse-a", 40, origin))
            .append(step("parse-b", 20, origin))
            .append(step("parse-c", 60, origin))
            .join()
            .append(step("store", 10, origin))
            .await
    });

    match result {
        Ok(Ok(completion)) => println!("pipeline completed: {completion:?}"),
        Ok(Err(reason)) => println!("pipeline failed: {reason}"),
        Err(err) => println!("runtime error: {err}"),
    }
}
