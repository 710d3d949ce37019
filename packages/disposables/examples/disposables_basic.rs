//! Example demonstrating explicit disposal with `Disposer` and `DisposableBag`.

use disposables::{DisposableBag, Disposer};

fn main() {
    println!("=== Disposables Example ===");

    // A lone disposer releases exactly once, no matter how often it is poked.
    println!("\n1. Idempotent release:");
    let connection = Disposer::new(|| println!("connection closed"));
    connection.dispose();
    connection.dispose();

    // A bag releases everything it tracks, in insertion order.
    println!("\n2. Grouped release:");
    let bag = DisposableBag::new();
    for name in ["listener", "buffer", "worker"] {
        bag.track(Disposer::new(move || println!("{name} released")));
    }
    println!("tracking {} resources", bag.len());
    bag.dispose();

    // Untracking hands the disposer back without releasing it.
    println!("\n3. Untracking:");
    let bag = DisposableBag::new();
    let id = bag.track(Disposer::new(|| println!("released by hand, not by the bag")));
    let kept = bag.untrack(id).expect("just tracked");
    bag.dispose();
    kept.dispose();
}
