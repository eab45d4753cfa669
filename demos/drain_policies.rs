//! Example: Drain policies and deterministic dispatch
//!
//! This example shows how `MockExecutor` captures fire-and-forget work and
//! how the two drain policies handle a failing work item.

use std::sync::Arc;

use parking_lot::Mutex;
use testkit_executor::executor::{DrainPolicy, Executor, MockExecutor};

fn main() -> testkit_executor::Result<()> {
    println!("🧰 testkit-executor - Drain Policies\n");

    example_capture_and_drain()?;
    example_stop_on_first_failure()?;
    example_continue_on_failure();
    example_chained_work()?;

    println!("\n✅ All drain policy examples completed!");
    Ok(())
}

/// Queue work through the trait, then run it on demand
fn example_capture_and_drain() -> testkit_executor::Result<()> {
    println!("📌 Example 1: Capture and Drain");
    println!("   Work waits in the queue until the test drains it\n");

    let executor = MockExecutor::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let dispatcher: &dyn Executor = &executor;

    for marker in ["a", "b", "c"] {
        let log = Arc::clone(&log);
        dispatcher.execute(Box::new(move || log.lock().push(marker)));
    }
    println!("   Pending before drain: {}", executor.pending_count());

    let ran = executor.drain_all()?;
    println!("   Ran {ran} items in order: {:?}", *log.lock());
    println!("   Pending after drain: {}", executor.pending_count());
    println!();
    Ok(())
}

/// The default policy stops at the first failure
fn example_stop_on_first_failure() -> testkit_executor::Result<()> {
    println!("📌 Example 2: Stop on First Failure");
    println!("   Items behind a failure stay queued\n");

    let executor = MockExecutor::new();
    executor.execute_named("ok", || {});
    executor.execute_named("broken", || panic!("socket closed"));
    executor.execute_named("later", || {});

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    let outcome = executor.drain_all();
    std::panic::set_hook(previous_hook);

    if let Err(err) = outcome {
        println!("   Drain failed: {err}");
    }
    println!("   Still queued: {:?}", executor.pending());

    executor.drain_all()?;
    println!("   ✓ Second drain ran the rest, pending: {}", executor.pending_count());
    println!();
    Ok(())
}

/// Run everything and collect every failure
fn example_continue_on_failure() {
    println!("📌 Example 3: Continue on Failure");
    println!("   Every item runs; all failures are reported\n");

    let executor = MockExecutor::with_policy(DrainPolicy::ContinueOnFailure);
    executor.try_execute(|| Err::<(), _>("disk full"));
    executor.execute_named("fine", || {});
    executor.try_execute(|| Err::<(), _>("quota exceeded"));

    if let Err(err) = executor.drain_all() {
        for failure in err.work_failures() {
            println!("   ✗ {failure}");
        }
    }
    println!("   ✓ Executed {} items, pending: {}", executor.executed_count(), executor.pending_count());
    println!();
}

/// Work that schedules more work needs more than one drain
fn example_chained_work() -> testkit_executor::Result<()> {
    println!("📌 Example 4: Chained Work");
    println!("   run_until_idle follows work that schedules work\n");

    fn retry(executor: MockExecutor, attempt: u32) {
        println!("   Attempt {attempt}");
        if attempt < 3 {
            let next = executor.clone();
            executor.execute(Box::new(move || retry(next, attempt + 1)));
        }
    }

    let executor = MockExecutor::new();
    let first = executor.clone();
    executor.execute(Box::new(move || retry(first, 1)));

    let ran = executor.run_until_idle()?;
    println!("   ✓ {ran} items ran across drains");
    Ok(())
}
