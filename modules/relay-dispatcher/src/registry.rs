//! Registry: token to handler mapping.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::rc::Rc;

use crate::error::DispatchError;
use crate::types::{DispatchToken, Payload};

/// A registered store callback.
pub type Handler<V> = Rc<dyn Fn(&Payload<V>) -> anyhow::Result<()>>;

/// Owns every handler, keyed by the token it was registered under.
///
/// Tokens increase monotonically, so key order is registration order.
pub(crate) struct Registry<V> {
    handlers: BTreeMap<DispatchToken, Handler<V>>,
}

impl<V> Default for Registry<V> {
    fn default() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }
}

impl<V> Registry<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handler` under a fresh token. The same handler may be
    /// registered any number of times.
    pub fn register(&mut self, handler: Handler<V>) -> DispatchToken {
        let token = DispatchToken::next();
        self.handlers.insert(token, handler);
        token
    }

    pub fn unregister(&mut self, token: DispatchToken) -> Result<(), DispatchError> {
        self.handlers
            .remove(&token)
            .map(|_| ())
            .ok_or(DispatchError::UnknownToken(token))
    }

    /// Clone out the handler so it can run without the registry borrowed.
    pub fn get(&self, token: DispatchToken) -> Option<Handler<V>> {
        self.handlers.get(&token).cloned()
    }

    pub fn contains(&self, token: DispatchToken) -> bool {
        self.handlers.contains_key(&token)
    }

    /// All tokens in registration order.
    pub fn tokens(&self) -> Vec<DispatchToken> {
        self.handlers.keys().copied().collect()
    }

    pub fn first(&self) -> Option<DispatchToken> {
        self.handlers.keys().next().copied()
    }

    /// The next registered token after `token`, whether or not `token` is
    /// itself still registered.
    pub fn next_after(&self, token: DispatchToken) -> Option<DispatchToken> {
        self.handlers
            .range((Bound::Excluded(token), Bound::Unbounded))
            .next()
            .map(|(token, _)| *token)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
