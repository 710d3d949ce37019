use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use disposables::Disposer;

use crate::emitter::WaitSlot;
use crate::{EventEmitter, EventSource};

/// The payload of an [`ObservableValue`] change notification.
#[derive(Clone, Debug, PartialEq)]
pub struct Change<T> {
    /// The value after the change.
    pub new_value: T,

    /// The value before the change.
    pub old_value: T,
}

/// A value container that broadcasts changes through an [`EventEmitter`].
///
/// Setting an equal value is not a change and emits nothing.
///
/// # Example
///
/// ```rust
/// use emitters::ObservableValue;
///
/// let value = ObservableValue::new(1);
///
/// value.on_change().subscribe(|change| {
///     println!("{} -> {}", change.old_value, change.new_value);
/// });
///
/// value.set(2); // prints "1 -> 2"
/// value.set(2); // no change, nothing printed
/// ```
pub struct ObservableValue<T>
where
    T: 'static,
{
    value: RefCell<T>,
    changed: EventEmitter<Change<T>>,
}

impl<T> ObservableValue<T>
where
    T: 'static,
{
    /// Creates a container holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            value: RefCell::new(initial),
            changed: EventEmitter::new(),
        }
    }

    /// Returns a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    /// Calls `f` with a reference to the current value.
    ///
    /// For reading without requiring `T: Clone`.
    pub fn inspect<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Replaces the current value, notifying subscribers if it changed.
    ///
    /// Equality is decided by `PartialEq`; setting an equal value emits no
    /// notification.
    pub fn set(&self, new_value: T)
    where
        T: Clone + PartialEq,
    {
        {
            let current = self.value.borrow();

            if *current == new_value {
                return;
            }
        }

        let old_value = self.value.replace(new_value.clone());

        // Dispatched after the borrow is released so handlers can read the
        // container.
        self.changed.dispatch(&Change {
            new_value,
            old_value,
        });
    }

    /// Returns the subscribe-only view of the change event.
    #[must_use]
    pub fn on_change(&self) -> EventSource<Change<T>> {
        self.changed.source()
    }
}

impl<T> ObservableValue<Option<T>>
where
    T: Clone + 'static,
{
    /// Returns a future that resolves with the contained value as soon as it
    /// is `Some` - immediately if it already is, otherwise on the first
    /// change that makes it so.
    ///
    /// Dropping the future removes any underlying subscription.
    #[must_use]
    pub fn wait_for_value(&self) -> WaitForValue<T> {
        let slot = Rc::new(RefCell::new(WaitSlot {
            value: None,
            waker: None,
        }));

        if let Some(value) = self.value.borrow().clone() {
            slot.borrow_mut().value = Some(value);

            return WaitForValue {
                slot,
                subscription: Disposer::empty(),
            };
        }

        // Persistent subscription: the value may flip Some -> None -> Some
        // before anyone polls. Only the first change to Some completes the
        // wait.
        let slot_in_handler = Rc::clone(&slot);
        let subscription = self.changed.source().subscribe(move |change| {
            if let Some(value) = &change.new_value {
                let mut slot = slot_in_handler.borrow_mut();

                if slot.value.is_none() {
                    slot.value = Some(value.clone());

                    if let Some(waker) = slot.waker.take() {
                        waker.wake();
                    }
                }
            }
        });

        WaitForValue { slot, subscription }
    }
}

impl<T> Default for ObservableValue<T>
where
    T: Default + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Debug for ObservableValue<T>
where
    T: Debug + 'static,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableValue")
            .field("value", &self.value.borrow())
            .finish()
    }
}

/// Future returned by [`ObservableValue::wait_for_value`].
pub struct WaitForValue<T>
where
    T: 'static,
{
    slot: Rc<RefCell<WaitSlot<T>>>,
    subscription: Disposer,
}

impl<T> Future for WaitForValue<T>
where
    T: Clone + 'static,
{
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let value = {
            let mut slot = self.slot.borrow_mut();

            match slot.value.take() {
                Some(value) => Some(value),
                None => {
                    slot.waker = Some(cx.waker().clone());
                    None
                }
            }
        };

        match value {
            Some(value) => {
                // The wait is over; the change subscription has done its job.
                self.subscription.dispose();
                Poll::Ready(value)
            }
            None => Poll::Pending,
        }
    }
}

impl<T> Drop for WaitForValue<T>
where
    T: 'static,
{
    fn drop(&mut self) {
        self.subscription.dispose();
    }
}

impl<T> Debug for WaitForValue<T>
where
    T: 'static,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitForValue")
            .field("is_ready", &self.slot.borrow().value.is_some())
            .finish()
    }
}
