use std::{cell::RefCell, rc::Rc};

use slabmap::SlabMap;

use crate::Subscription;


/// A list of observers notified synchronously with a shared argument.
///
/// Handlers are detached when the [`Subscription`] returned from [`subscribe`](Self::subscribe) is dropped.
/// Dropping the `Event` itself makes every outstanding `Subscription` inert.
pub struct Event<A: ?Sized + 'static>(Rc<RefCell<SlabMap<Rc<dyn Fn(&A)>>>>);

impl<A: ?Sized + 'static> Event<A> {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(SlabMap::new())))
    }

    /// Registers `f` to be called on every [`emit`](Self::emit).
    pub fn subscribe(&self, f: impl Fn(&A) + 'static) -> Subscription {
        let key = self.0.borrow_mut().insert(Rc::new(f));
        Subscription::from_weak_fn(Rc::downgrade(&self.0), move |handlers| {
            handlers.borrow_mut().remove(key);
        })
    }

    /// Calls every registered handler.
    ///
    /// Handlers may subscribe or unsubscribe while being called.
    /// Changes take effect from the next `emit`.
    pub fn emit(&self, args: &A) {
        let handlers: Vec<Rc<dyn Fn(&A)>> = self.0.borrow().values().cloned().collect();
        for h in handlers {
            h(args);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.borrow().len()
    }
}

/// The clone shares the handler list with the original.
impl<A: ?Sized + 'static> Clone for Event<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
impl<A: ?Sized + 'static> Default for Event<A> {
    fn default() -> Self {
        Self::new()
    }
}
impl<A: ?Sized + 'static> std::fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
