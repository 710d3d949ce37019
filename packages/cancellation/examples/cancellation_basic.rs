//! Example demonstrating cancellation tokens and future races.

use cancellation::{CancellableResult, CancellationTokenSource};
use futures::executor::block_on;
use rendezvous::Deferred;

fn main() {
    println!("=== Cancellation Example ===");

    // The source owns the cancel capability; tokens only observe.
    println!("\n1. Observing the transition:");
    let source = CancellationTokenSource::new();
    let token = source.token();

    token.on_cancel(|| println!("observer: the operation was cancelled"));

    println!("cancelled yet? {}", token.is_cancelled());
    source.cancel_with_reason("user pressed ctrl-c");
    println!("cancelled now? {}, reason: {:?}", token.is_cancelled(), token.reason());

    // Racing a pending operation against a cancel signal.
    println!("\n2. Racing a pending future:");
    let source = CancellationTokenSource::new();
    let token = source.token();

    let operation = Deferred::<String>::new();
    let race = token.resolve_on_cancel(operation.wait());

    source.cancel();

    match block_on(race) {
        CancellableResult::Completed(output) => println!("completed: {output:?}"),
        CancellableResult::Cancelled => println!("cancelled before the operation settled"),
    }

    // The same race, surfacing cancellation as an error.
    println!("\n3. Cancellation as an error:");
    let source = CancellationTokenSource::new();
    let token = source.token();

    let operation = Deferred::<String>::new();
    let race = token.reject_on_cancel(operation.wait());

    operation.resolve("finished in time".to_string());

    match block_on(race) {
        Ok(output) => println!("ok: {output:?}"),
        Err(error) => println!("failed: {error}"),
    }
}
