//! Example demonstrating publish/subscribe dispatch and observable values.

use emitters::{EventEmitter, ObservableValue};

fn main() {
    println!("=== Emitters Example ===");

    // The emitter is the owner side; sources are the subscribe-only views.
    println!("\n1. Subscribe, dispatch, unsubscribe:");
    let emitter = EventEmitter::<String>::new();

    let subscription = emitter.subscribe(|message: &String| {
        println!("subscriber saw: {message}");
    });
    emitter.subscribe_once(|message: &String| {
        println!("once-subscriber saw: {message}");
    });

    emitter.dispatch(&"first".to_string());
    emitter.dispatch(&"second".to_string());

    subscription.dispose();
    emitter.dispatch(&"third (nobody listens)".to_string());

    // Observable values broadcast their changes through the same machinery.
    println!("\n2. Observable value:");
    let temperature = ObservableValue::new(20);

    temperature.on_change().subscribe(|change| {
        println!("temperature: {} -> {}", change.old_value, change.new_value);
    });

    temperature.set(21);
    temperature.set(21); // not a change, no notification
    temperature.set(19);

    // Waiting for the next dispatch as a future.
    println!("\n3. Awaiting the next event:");
    let emitter = EventEmitter::<u32>::new();
    let next = emitter.source().wait_next();

    emitter.dispatch(&42);

    let value = futures::executor::block_on(next);
    println!("awaited value: {value}");
}
