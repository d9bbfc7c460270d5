//! The dispatch loop and the `wait_for` dependency resolver.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, debug_span, trace, warn};

use crate::config::{DispatcherConfig, IterationPolicy};
use crate::disposer::Disposer;
use crate::error::DispatchError;
use crate::registry::{Handler, Registry};
use crate::tracker::{InvocationTracker, Progress};
use crate::types::{DispatchToken, Payload};

/// Single-threaded action dispatcher.
///
/// Cloning is cheap and every clone drives the same registry. The type is
/// neither `Send` nor `Sync`: one dispatcher lives on one thread, and at most
/// one pass is active on it at a time.
///
/// Handlers that need to call back into the dispatcher (usually for
/// [`wait_for`](Self::wait_for)) should capture a [`WeakDispatcher`]. A
/// strong clone captured by a handler keeps the registry alive through
/// itself.
pub struct Dispatcher<V = serde_json::Value> {
    inner: Rc<Inner<V>>,
}

/// Non-owning handle to a [`Dispatcher`].
pub struct WeakDispatcher<V = serde_json::Value> {
    inner: Weak<Inner<V>>,
}

pub(crate) struct Inner<V> {
    config: DispatcherConfig,
    registry: RefCell<Registry<V>>,
    tracker: RefCell<InvocationTracker>,
    payload: RefCell<Option<Rc<Payload<V>>>>,
    dispatching: Cell<bool>,
}

impl<V> Clone for Dispatcher<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V> Clone for WeakDispatcher<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<V: 'static> Default for Dispatcher<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: 'static> Dispatcher<V> {
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                config,
                registry: RefCell::new(Registry::new()),
                tracker: RefCell::new(InvocationTracker::new()),
                payload: RefCell::new(None),
                dispatching: Cell::new(false),
            }),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.inner.config
    }

    pub fn downgrade(&self) -> WeakDispatcher<V> {
        WeakDispatcher {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Register a store handler. It will be called with every dispatched
    /// payload. The returned [`Disposer`] removes it again and carries the
    /// token other handlers pass to [`wait_for`](Self::wait_for).
    pub fn register<F>(&self, handler: F) -> Disposer<V>
    where
        F: Fn(&Payload<V>) -> anyhow::Result<()> + 'static,
    {
        let handler: Handler<V> = Rc::new(handler);
        let token = self.inner.registry.borrow_mut().register(handler);
        debug!(dispatcher = %self.inner.config.name, %token, "Handler registered");
        Disposer::new(token, Rc::downgrade(&self.inner))
    }

    /// Remove a registration. Fails with `UnknownToken` if `token` is not
    /// currently registered.
    pub fn unregister(&self, token: impl Into<DispatchToken>) -> Result<(), DispatchError> {
        self.inner.unregister(token.into())
    }

    pub fn is_registered(&self, token: impl Into<DispatchToken>) -> bool {
        self.inner.registry.borrow().contains(token.into())
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.borrow().is_empty()
    }

    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatching.get()
    }

    /// Run one pass: hand `{action_type, value}` to every registered handler
    /// exactly once, in registration order, except where `wait_for` pulls a
    /// handler forward.
    ///
    /// Rejected with `AlreadyDispatching` if a pass is already running.
    /// The first handler failure aborts the pass and is returned as is.
    pub fn dispatch(&self, action_type: impl Into<String>, value: V) -> Result<(), DispatchError> {
        if self.inner.dispatching.get() {
            warn!(dispatcher = %self.inner.config.name, "Rejected dispatch while dispatching");
            return Err(DispatchError::AlreadyDispatching);
        }

        let payload = Payload::new(action_type, value);
        let span = debug_span!(
            "dispatch",
            dispatcher = %self.inner.config.name,
            action_type = %payload.action_type
        );
        let _entered = span.enter();

        let snapshot = self.inner.start_pass(payload);
        let _pass = PassGuard { inner: &self.inner };
        debug!(handlers = snapshot.len(), "Dispatch started");

        match self.inner.config.iteration {
            IterationPolicy::Snapshot => {
                for token in snapshot {
                    self.inner.invoke_in_order(token)?;
                }
            }
            IterationPolicy::Live => {
                let mut cursor = self.inner.registry.borrow().first();
                while let Some(token) = cursor {
                    self.inner.invoke_in_order(token)?;
                    cursor = self.inner.registry.borrow().next_after(token);
                }
            }
        }

        debug!("Dispatch finished");
        Ok(())
    }

    /// Run the given handlers now, before the calling handler continues.
    ///
    /// Only valid from inside a handler during a pass. Tokens already
    /// handled this pass are skipped; a token still on the call stack is a
    /// `CircularDependency`; a token that is not registered is an
    /// `UnknownToken`. Waiting is recursive: a handler pulled forward here
    /// may itself wait for others.
    pub fn wait_for<I>(&self, tokens: I) -> Result<(), DispatchError>
    where
        I: IntoIterator,
        I::Item: Into<DispatchToken>,
    {
        self.inner.wait_for(tokens.into_iter().map(Into::into))
    }
}

impl<V: 'static> WeakDispatcher<V> {
    /// `None` once every [`Dispatcher`] clone has been dropped.
    pub fn upgrade(&self) -> Option<Dispatcher<V>> {
        self.inner.upgrade().map(|inner| Dispatcher { inner })
    }
}

impl<V> Inner<V> {
    pub(crate) fn unregister(&self, token: DispatchToken) -> Result<(), DispatchError> {
        self.registry.borrow_mut().unregister(token)?;
        debug!(dispatcher = %self.config.name, %token, "Handler unregistered");
        Ok(())
    }

    /// Reset the tracker, store the payload and raise the active flag.
    /// Returns the registration order at this instant.
    fn start_pass(&self, payload: Payload<V>) -> Vec<DispatchToken> {
        self.tracker.borrow_mut().reset();
        *self.payload.borrow_mut() = Some(Rc::new(payload));
        self.dispatching.set(true);
        self.registry.borrow().tokens()
    }

    /// Main-loop step: run `token` unless `wait_for` already did, or it was
    /// removed since the pass started.
    fn invoke_in_order(&self, token: DispatchToken) -> Result<(), DispatchError> {
        if self.tracker.borrow().is_pending(token) {
            trace!(%token, "Already invoked this pass");
            return Ok(());
        }
        if !self.registry.borrow().contains(token) {
            trace!(%token, "Unregistered mid-pass, skipping");
            return Ok(());
        }
        self.invoke(token)
    }

    /// Mark pending, call the handler, mark handled. Callers check that the
    /// token has not already run.
    fn invoke(&self, token: DispatchToken) -> Result<(), DispatchError> {
        let handler = self
            .registry
            .borrow()
            .get(token)
            .ok_or(DispatchError::UnknownToken(token))?;
        let payload = self
            .payload
            .borrow()
            .clone()
            .ok_or(DispatchError::NotDispatching)?;

        self.tracker.borrow_mut().mark_pending(token);
        trace!(%token, "Invoking handler");
        handler(&*payload).map_err(DispatchError::from_handler)?;
        self.tracker.borrow_mut().mark_handled(token);
        Ok(())
    }

    fn wait_for(&self, tokens: impl Iterator<Item = DispatchToken>) -> Result<(), DispatchError> {
        if !self.dispatching.get() {
            warn!(dispatcher = %self.config.name, "wait_for called outside a dispatch");
            return Err(DispatchError::NotDispatching);
        }

        for token in tokens {
            let progress = self.tracker.borrow().progress(token);
            match progress {
                Progress::Pending => {
                    warn!(%token, "Circular dependency in wait_for");
                    return Err(DispatchError::CircularDependency(token));
                }
                Progress::Handled => continue,
                Progress::Idle => {
                    if !self.registry.borrow().contains(token) {
                        return Err(DispatchError::UnknownToken(token));
                    }
                    trace!(%token, "Forced by wait_for");
                    self.invoke(token)?;
                }
            }
        }

        Ok(())
    }
}

/// Lowers the active flag and drops the payload on every exit from
/// `dispatch`, including errors and panics.
struct PassGuard<'a, V> {
    inner: &'a Inner<V>,
}

impl<V> Drop for PassGuard<'_, V> {
    fn drop(&mut self) {
        self.inner.dispatching.set(false);
        self.inner.payload.borrow_mut().take();
    }
}
