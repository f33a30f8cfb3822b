//! Transition completion callbacks.
//!
//! A caller passes an `Rc<dyn ScrimCallback>` to `transition_to`. The controller wraps it
//! in a [`CallbackHandle`] that remembers whether a terminal notification has already
//! been delivered. Finished and cancelled are both terminal and each handle delivers
//! exactly one of them. Animations started during a transition capture a clone of the
//! handle, so completions that arrive after the transition was superseded are dropped
//! instead of reaching the caller a second time.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Progress notifications for a requested transition. Every method defaults to a no-op.
pub trait ScrimCallback {
    /// The deferred update for the transition is about to run.
    fn on_start(&self) {}

    /// The display is covered and it is safe to change its power mode.
    fn on_display_blanked(&self) {}

    /// Every animation of the transition settled.
    fn on_finished(&self) {}

    /// Another transition replaced this one before it settled.
    fn on_cancelled(&self) {}
}

/// Returns true if both values point to the same callback object.
pub fn same_callback(a: &Rc<dyn ScrimCallback>, b: &Rc<dyn ScrimCallback>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

struct Registration {
    callback: Rc<dyn ScrimCallback>,
    terminated: Cell<bool>,
}

/// One registration of a callback with the controller.
///
/// Clones share the terminal flag. Identity is per registration: registering the same
/// callback twice produces two distinct handles.
#[derive(Clone)]
pub struct CallbackHandle {
    inner: Rc<Registration>,
}

impl CallbackHandle {
    pub fn new(callback: Rc<dyn ScrimCallback>) -> Self {
        Self {
            inner: Rc::new(Registration {
                callback,
                terminated: Cell::new(false),
            }),
        }
    }

    /// Returns true if `other` is a clone of this registration.
    pub fn is_same_registration(&self, other: &CallbackHandle) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns true if this registration wraps `callback`.
    pub fn wraps(&self, callback: &Rc<dyn ScrimCallback>) -> bool {
        same_callback(&self.inner.callback, callback)
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.get()
    }

    pub fn start(&self) {
        if !self.is_terminated() {
            self.inner.callback.on_start();
        }
    }

    pub fn display_blanked(&self) {
        if !self.is_terminated() {
            self.inner.callback.on_display_blanked();
        }
    }

    /// Deliver `on_finished` unless a terminal notification was already delivered.
    ///
    /// Returns whether the notification was delivered.
    pub fn finish(&self) -> bool {
        if self.inner.terminated.replace(true) {
            return false;
        }
        self.inner.callback.on_finished();
        true
    }

    /// Deliver `on_cancelled` unless a terminal notification was already delivered.
    ///
    /// Returns whether the notification was delivered.
    pub fn cancel(&self) -> bool {
        if self.inner.terminated.replace(true) {
            return false;
        }
        self.inner.callback.on_cancelled();
        true
    }
}

impl fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHandle")
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<&'static str>>,
    }

    impl ScrimCallback for Recorder {
        fn on_start(&self) {
            self.events.borrow_mut().push("start");
        }

        fn on_finished(&self) {
            self.events.borrow_mut().push("finished");
        }

        fn on_cancelled(&self) {
            self.events.borrow_mut().push("cancelled");
        }
    }

    #[test]
    fn test_terminal_notification_is_delivered_once() {
        let recorder = Rc::new(Recorder::default());
        let handle = CallbackHandle::new(recorder.clone());
        let captured = handle.clone();

        assert!(handle.cancel());
        assert!(!captured.finish());
        assert!(!handle.cancel());

        assert_eq!(*recorder.events.borrow(), vec!["cancelled"]);
    }

    #[test]
    fn test_start_is_dropped_after_termination() {
        let recorder = Rc::new(Recorder::default());
        let handle = CallbackHandle::new(recorder.clone());

        handle.start();
        assert!(handle.finish());
        handle.start();

        assert_eq!(*recorder.events.borrow(), vec!["start", "finished"]);
    }

    #[test]
    fn test_registration_identity() {
        let recorder: Rc<dyn ScrimCallback> = Rc::new(Recorder::default());
        let first = CallbackHandle::new(recorder.clone());
        let second = CallbackHandle::new(recorder.clone());

        assert!(first.is_same_registration(&first.clone()));
        assert!(!first.is_same_registration(&second));
        assert!(first.wraps(&recorder));
        assert!(second.wraps(&recorder));
    }
}
