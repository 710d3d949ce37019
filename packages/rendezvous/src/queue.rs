use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::deferred::Take;
use crate::{Deferred, Rejection};

/// An unbounded FIFO rendezvous queue matching producers and consumers in
/// arrival order.
///
/// Whichever side arrives first leaves a [`Deferred`] placeholder behind:
/// a value produced before any consumer waits is parked as a pre-settled
/// placeholder, and a consumer arriving before any value waits on a pending
/// one. The other side then always pops the *oldest* placeholder, so values
/// are delivered in strict FIFO order regardless of which side showed up
/// first.
///
/// At any instant at least one of the two internal queues is empty: an
/// unmatched produce and an unmatched consume never coexist.
///
/// # Example
///
/// ```rust
/// use rendezvous::ProducerConsumer;
///
/// let queue = ProducerConsumer::<u32>::new();
///
/// let first = queue.consume();
/// queue.produce(1);
/// queue.produce(2);
///
/// assert_eq!(futures::executor::block_on(first), Ok(1));
/// assert_eq!(futures::executor::block_on(queue.consume()), Ok(2));
/// ```
pub struct ProducerConsumer<T> {
    /// Values produced before any consumer arrived (each already settled).
    ready: RefCell<VecDeque<Deferred<T>>>,

    /// Consumers waiting before any value arrived (each still pending).
    waiting: RefCell<VecDeque<Deferred<T>>>,
}

impl<T> ProducerConsumer<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ready: RefCell::new(VecDeque::new()),
            waiting: RefCell::new(VecDeque::new()),
        }
    }

    /// Delivers a value to the oldest waiting consumer, or parks it for a
    /// future one.
    pub fn produce(&self, value: T) {
        self.next_unmatched().resolve(value);
    }

    /// Fails exactly one consume - the oldest waiting consumer, or the next
    /// future one if none waits.
    pub fn reject_single(&self, reason: impl Into<Rejection>) {
        self.next_unmatched().reject(reason);
    }

    /// Receives the oldest produced value, or waits for a future one.
    ///
    /// The returned future is already settled when a value was parked;
    /// otherwise it settles when a matching [`produce`][Self::produce] (or
    /// [`reject_single`][Self::reject_single]) arrives.
    #[must_use]
    pub fn consume(&self) -> Consume<T> {
        let deferred = {
            let mut ready = self.ready.borrow_mut();

            match ready.pop_front() {
                Some(deferred) => deferred,
                None => {
                    let deferred = Deferred::new();
                    self.waiting.borrow_mut().push_back(deferred.clone());
                    deferred
                }
            }
        };

        Consume {
            take: deferred.take(),
        }
    }

    /// The number of produced values no consumer has claimed yet.
    #[must_use]
    pub fn pending_values(&self) -> usize {
        self.ready.borrow().len()
    }

    /// The number of consumers waiting for a value.
    #[must_use]
    pub fn waiting_consumers(&self) -> usize {
        self.waiting.borrow().len()
    }

    /// Pops the oldest waiting consumer, or parks a fresh placeholder on the
    /// ready queue for a future consumer to claim.
    fn next_unmatched(&self) -> Deferred<T> {
        let mut waiting = self.waiting.borrow_mut();

        match waiting.pop_front() {
            Some(deferred) => deferred,
            None => {
                let deferred = Deferred::new();
                self.ready.borrow_mut().push_back(deferred.clone());
                deferred
            }
        }
    }
}

impl<T> Default for ProducerConsumer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for ProducerConsumer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerConsumer")
            .field("pending_values", &self.pending_values())
            .field("waiting_consumers", &self.waiting_consumers())
            .finish()
    }
}

/// Future returned by [`ProducerConsumer::consume`].
pub struct Consume<T> {
    take: Take<T>,
}

impl<T> Future for Consume<T> {
    type Output = Result<T, Rejection>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.take).poll(cx)
    }
}

impl<T> Debug for Consume<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consume").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use static_assertions::assert_not_impl_any;
    use testing::with_watchdog;

    use super::*;

    assert_not_impl_any!(ProducerConsumer<u32>: Send, Sync);

    #[test]
    fn produce_then_consume_yields_immediately() {
        with_watchdog(|| {
            let queue = ProducerConsumer::<u32>::new();

            queue.produce(1);
            assert_eq!(queue.pending_values(), 1);

            assert_eq!(block_on(queue.consume()), Ok(1));
            assert_eq!(queue.pending_values(), 0);
        });
    }

    #[test]
    fn consumers_are_served_in_fifo_order() {
        with_watchdog(|| {
            let queue = ProducerConsumer::<u32>::new();

            let first = queue.consume();
            let second = queue.consume();
            assert_eq!(queue.waiting_consumers(), 2);

            queue.produce(1);
            queue.produce(2);

            assert_eq!(block_on(first), Ok(1));
            assert_eq!(block_on(second), Ok(2));
        });
    }

    #[test]
    fn values_are_delivered_in_production_order() {
        with_watchdog(|| {
            let queue = ProducerConsumer::<u32>::new();

            queue.produce(1);
            queue.produce(2);
            queue.produce(3);

            assert_eq!(block_on(queue.consume()), Ok(1));
            assert_eq!(block_on(queue.consume()), Ok(2));
            assert_eq!(block_on(queue.consume()), Ok(3));
        });
    }

    #[test]
    fn one_queue_is_always_empty() {
        let queue = ProducerConsumer::<u32>::new();

        queue.produce(1);
        assert_eq!(queue.waiting_consumers(), 0);

        let _pending = queue.consume();
        let _waiting = queue.consume();
        assert_eq!(queue.pending_values(), 0);
        assert_eq!(queue.waiting_consumers(), 1);
    }

    #[test]
    fn reject_single_fails_the_oldest_waiting_consumer() {
        with_watchdog(|| {
            let queue = ProducerConsumer::<u32>::new();

            let first = queue.consume();
            let second = queue.consume();

            queue.reject_single("no more values");
            queue.produce(2);

            assert_eq!(block_on(first), Err(Rejection::new("no more values")));
            assert_eq!(block_on(second), Ok(2));
        });
    }

    #[test]
    fn reject_single_parks_a_failure_for_a_future_consumer() {
        with_watchdog(|| {
            let queue = ProducerConsumer::<u32>::new();

            queue.reject_single("poisoned");

            assert_eq!(
                block_on(queue.consume()),
                Err(Rejection::new("poisoned"))
            );
        });
    }

    #[test]
    fn values_move_without_clone() {
        with_watchdog(|| {
            // A type that is deliberately not Clone.
            #[derive(Debug, Eq, PartialEq)]
            struct Payload(u32);

            let queue = ProducerConsumer::<Payload>::new();

            queue.produce(Payload(1));

            assert_eq!(block_on(queue.consume()), Ok(Payload(1)));
        });
    }
}
