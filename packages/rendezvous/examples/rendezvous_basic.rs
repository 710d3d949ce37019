//! Example demonstrating deferreds, barriers and the rendezvous queue.

use futures::executor::block_on;
use rendezvous::{Barrier, Deferred, DeferredState, ProducerConsumer};

fn main() {
    println!("=== Rendezvous Example ===");

    // A deferred is a future whose settlement lives outside.
    println!("\n1. Deferred:");
    let deferred = Deferred::<String>::new();
    println!("state before: {:?}", deferred.state());

    let wait = deferred.wait();
    deferred.resolve("settled from outside".to_string());

    println!("state after: {:?}", deferred.state());
    println!("awaited: {:?}", block_on(wait));
    assert_eq!(deferred.state(), DeferredState::Resolved);

    // A barrier is the same thing wearing gate vocabulary.
    println!("\n2. Barrier:");
    let gate = Barrier::<u32>::new();
    let wait = gate.wait();
    gate.unlock(7);
    println!("unlocked with: {:?}", block_on(wait));

    // The queue pairs producers and consumers FIFO, either side first.
    println!("\n3. Producer/consumer rendezvous:");
    let queue = ProducerConsumer::<u32>::new();

    let early_consumer = queue.consume();
    queue.produce(1);
    queue.produce(2);

    println!("early consumer got: {:?}", block_on(early_consumer));
    println!("late consumer got: {:?}", block_on(queue.consume()));
}
