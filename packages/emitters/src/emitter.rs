use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use disposables::Disposer;

/// Handlers are shared between the live list and in-progress dispatch
/// snapshots, and need `&mut` to run, hence the `Rc<RefCell<..>>`.
type Handler<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Subscription<T>
where
    T: 'static,
{
    id: u64,
    handler: Handler<T>,
    is_once: bool,
}

struct SubscriberList<T>
where
    T: 'static,
{
    next_id: u64,
    entries: Vec<Subscription<T>>,
}

impl<T> SubscriberList<T>
where
    T: 'static,
{
    fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

/// Adds a subscription and returns the disposer that removes it again.
///
/// The disposer holds only a weak reference: it does not keep the subscriber
/// list alive, and disposing after the list is gone is a no-op.
fn register<T>(list: &Rc<RefCell<SubscriberList<T>>>, handler: Handler<T>, is_once: bool) -> Disposer
where
    T: 'static,
{
    let id = {
        let mut list = list.borrow_mut();

        let id = list.next_id;
        list.next_id = list.next_id.wrapping_add(1);

        list.entries.push(Subscription {
            id,
            handler,
            is_once,
        });

        id
    };

    let list = Rc::downgrade(list);

    Disposer::new(move || {
        if let Some(list) = list.upgrade() {
            let mut list = list.borrow_mut();

            if let Some(position) = list.entries.iter().position(|entry| entry.id == id) {
                list.entries.remove(position);
            }
        }
    })
}

/// The owner side of an event: subscriber collection plus the dispatch
/// capability.
///
/// Hand out [`source`][Self::source] views to code that should be able to
/// listen but never to emit.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use emitters::EventEmitter;
///
/// let emitter = EventEmitter::<u32>::new();
///
/// let total = Rc::new(Cell::new(0));
/// let total_in_handler = Rc::clone(&total);
/// emitter.subscribe(move |value: &u32| {
///     total_in_handler.set(total_in_handler.get() + value);
/// });
///
/// emitter.dispatch(&1);
/// emitter.dispatch(&2);
///
/// assert_eq!(total.get(), 3);
/// ```
pub struct EventEmitter<T>
where
    T: 'static,
{
    list: Rc<RefCell<SubscriberList<T>>>,
}

impl<T> EventEmitter<T>
where
    T: 'static,
{
    /// Creates an event with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            list: Rc::new(RefCell::new(SubscriberList::new())),
        }
    }

    /// Registers a handler invoked on every dispatch until unsubscribed.
    ///
    /// The returned disposer removes the subscription. Dropping it without
    /// disposing leaves the subscription alive for the emitter's lifetime.
    pub fn subscribe<F>(&self, handler: F) -> Disposer
    where
        F: FnMut(&T) + 'static,
    {
        register(&self.list, Rc::new(RefCell::new(handler)), false)
    }

    /// Registers a handler invoked on the first dispatch after subscription,
    /// then removed automatically.
    ///
    /// The removal happens immediately before the invocation, so the handler
    /// never fires twice even when dispatches nest.
    pub fn subscribe_once<F>(&self, handler: F) -> Disposer
    where
        F: FnMut(&T) + 'static,
    {
        register(&self.list, Rc::new(RefCell::new(handler)), true)
    }

    /// Invokes every currently subscribed handler exactly once, in
    /// subscription order.
    ///
    /// The subscriber collection is snapshotted when the call begins, so
    /// handlers may freely subscribe and unsubscribe - including themselves -
    /// while the dispatch runs; see the crate documentation for the exact
    /// guarantees.
    pub fn dispatch(&self, args: &T) {
        let snapshot: Vec<(u64, Handler<T>, bool)> = self
            .list
            .borrow()
            .entries
            .iter()
            .map(|entry| (entry.id, Rc::clone(&entry.handler), entry.is_once))
            .collect();

        for (id, handler, is_once) in snapshot {
            let fire = {
                let mut list = self.list.borrow_mut();

                match list.entries.iter().position(|entry| entry.id == id) {
                    Some(position) => {
                        // A once-subscription is removed immediately before
                        // its first (and only) invocation.
                        if is_once {
                            list.entries.remove(position);
                        }
                        true
                    }
                    // Unsubscribed earlier in this same pass.
                    None => false,
                }
            };

            if fire {
                (handler.borrow_mut())(args);
            }
        }
    }

    /// The number of current subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.list.borrow().entries.len()
    }

    /// Returns the subscribe-only view of this event.
    ///
    /// The view shares the subscriber collection but carries no dispatch
    /// capability; it may outlive the emitter, after which its subscribers
    /// simply never fire.
    #[must_use]
    pub fn source(&self) -> EventSource<T> {
        EventSource {
            list: Rc::clone(&self.list),
        }
    }
}

impl<T> Default for EventEmitter<T>
where
    T: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for EventEmitter<T>
where
    T: 'static,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// The subscribe-only view of an [`EventEmitter`].
///
/// Obtained from [`EventEmitter::source`]; clones address the same
/// subscriber collection.
pub struct EventSource<T>
where
    T: 'static,
{
    list: Rc<RefCell<SubscriberList<T>>>,
}

impl<T> EventSource<T>
where
    T: 'static,
{
    /// Registers a handler invoked on every dispatch until unsubscribed.
    ///
    /// See [`EventEmitter::subscribe`].
    pub fn subscribe<F>(&self, handler: F) -> Disposer
    where
        F: FnMut(&T) + 'static,
    {
        register(&self.list, Rc::new(RefCell::new(handler)), false)
    }

    /// Registers a handler invoked on the first dispatch after subscription,
    /// then removed automatically.
    ///
    /// See [`EventEmitter::subscribe_once`].
    pub fn subscribe_once<F>(&self, handler: F) -> Disposer
    where
        F: FnMut(&T) + 'static,
    {
        register(&self.list, Rc::new(RefCell::new(handler)), true)
    }

    /// Returns a future that resolves with a clone of the next dispatched
    /// payload.
    ///
    /// Dropping the future before it resolves removes the underlying
    /// subscription, so an abandoned wait does not leak a handler.
    #[must_use]
    pub fn wait_next(&self) -> WaitNext<T>
    where
        T: Clone,
    {
        let slot = Rc::new(RefCell::new(WaitSlot {
            value: None,
            waker: None,
        }));

        let slot_in_handler = Rc::clone(&slot);
        let subscription = self.subscribe_once(move |args: &T| {
            let mut slot = slot_in_handler.borrow_mut();
            slot.value = Some(args.clone());

            if let Some(waker) = slot.waker.take() {
                waker.wake();
            }
        });

        WaitNext { slot, subscription }
    }
}

impl<T> Clone for EventSource<T>
where
    T: 'static,
{
    fn clone(&self) -> Self {
        Self {
            list: Rc::clone(&self.list),
        }
    }
}

impl<T> Debug for EventSource<T>
where
    T: 'static,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource")
            .field("subscriber_count", &self.list.borrow().entries.len())
            .finish()
    }
}

pub(crate) struct WaitSlot<T> {
    pub(crate) value: Option<T>,
    pub(crate) waker: Option<Waker>,
}

/// Future returned by [`EventSource::wait_next`].
pub struct WaitNext<T>
where
    T: 'static,
{
    slot: Rc<RefCell<WaitSlot<T>>>,
    subscription: Disposer,
}

impl<T> Future for WaitNext<T>
where
    T: Clone + 'static,
{
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.borrow_mut();

        match slot.value.take() {
            Some(value) => Poll::Ready(value),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl<T> Drop for WaitNext<T>
where
    T: 'static,
{
    fn drop(&mut self) {
        self.subscription.dispose();
    }
}

impl<T> Debug for WaitNext<T>
where
    T: 'static,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitNext")
            .field("is_ready", &self.slot.borrow().value.is_some())
            .finish()
    }
}
