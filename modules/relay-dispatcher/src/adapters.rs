//! Event-shaped registration.
//!
//! Thin wrappers that register one ordinary handler and reshape the payload
//! into `(action_type, value)` for the callback. Ordering, tokens and
//! disposal behave exactly as for [`Dispatcher::register`].

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::dispatcher::Dispatcher;
use crate::disposer::Disposer;

/// Callback invoked with the action type and the dispatched value.
pub type EventCallback<V> = Rc<dyn Fn(&str, &V) -> anyhow::Result<()>>;

/// Event name → callback lookup for [`Dispatcher::register_routes`].
pub struct EventRoutes<V = serde_json::Value> {
    routes: HashMap<String, EventCallback<V>>,
}

impl<V> Default for EventRoutes<V> {
    fn default() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }
}

impl<V> EventRoutes<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `event` to `callback`. A later route for the same event
    /// replaces the earlier one.
    pub fn on<F>(mut self, event: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&str, &V) -> anyhow::Result<()> + 'static,
    {
        self.routes.insert(event.into(), Rc::new(callback));
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn get(&self, event: &str) -> Option<&EventCallback<V>> {
        self.routes.get(event)
    }
}

impl<V, S: Into<String>> FromIterator<(S, EventCallback<V>)> for EventRoutes<V> {
    fn from_iter<I: IntoIterator<Item = (S, EventCallback<V>)>>(iter: I) -> Self {
        Self {
            routes: iter
                .into_iter()
                .map(|(event, callback)| (event.into(), callback))
                .collect(),
        }
    }
}

impl<V> fmt::Debug for EventRoutes<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut events: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        events.sort_unstable();
        f.debug_struct("EventRoutes").field("events", &events).finish()
    }
}

impl<V: 'static> Dispatcher<V> {
    /// Register `callback` for one action type only. Other actions pass
    /// through the handler untouched.
    pub fn register_callback<F>(&self, action_type: impl Into<String>, callback: F) -> Disposer<V>
    where
        F: Fn(&str, &V) -> anyhow::Result<()> + 'static,
    {
        let action_type = action_type.into();
        self.register(move |payload| {
            if payload.is(&action_type) {
                callback(payload.action_type.as_str(), &payload.value)
            } else {
                Ok(())
            }
        })
    }

    /// Register a single handler that routes each action to the callback
    /// named after its action type, if any.
    pub fn register_routes(&self, routes: EventRoutes<V>) -> Disposer<V> {
        self.register(move |payload| match routes.get(&payload.action_type) {
            Some(callback) => callback(payload.action_type.as_str(), &payload.value),
            None => Ok(()),
        })
    }
}
