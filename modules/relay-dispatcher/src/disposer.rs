use std::fmt;
use std::rc::Weak;

use crate::dispatcher::Inner;
use crate::error::DispatchError;
use crate::types::DispatchToken;

/// Removal capability returned by registration.
///
/// Holds the assigned token plus a weak link back to the dispatcher, so
/// keeping a disposer around never keeps the dispatcher alive. Pass it (or
/// its [`token`](Self::token)) to `wait_for` to depend on the handler.
pub struct Disposer<V = serde_json::Value> {
    token: DispatchToken,
    dispatcher: Weak<Inner<V>>,
}

impl<V> Disposer<V> {
    pub(crate) fn new(token: DispatchToken, dispatcher: Weak<Inner<V>>) -> Self {
        Self { token, dispatcher }
    }

    pub fn token(&self) -> DispatchToken {
        self.token
    }

    /// Unregister the handler. A second call, or a call after the
    /// dispatcher is gone, fails with `UnknownToken`.
    pub fn dispose(&self) -> Result<(), DispatchError> {
        match self.dispatcher.upgrade() {
            Some(inner) => inner.unregister(self.token),
            None => Err(DispatchError::UnknownToken(self.token)),
        }
    }
}

impl<V> Clone for Disposer<V> {
    fn clone(&self) -> Self {
        Self {
            token: self.token,
            dispatcher: Weak::clone(&self.dispatcher),
        }
    }
}

impl<V> fmt::Debug for Disposer<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer").field("token", &self.token).finish()
    }
}

impl<V> From<&Disposer<V>> for DispatchToken {
    fn from(disposer: &Disposer<V>) -> Self {
        disposer.token
    }
}

impl<V> From<Disposer<V>> for DispatchToken {
    fn from(disposer: Disposer<V>) -> Self {
        disposer.token
    }
}

#[cfg(test)]
mod tests {
    use crate::{DispatchError, DispatchToken, Dispatcher};

    #[test]
    fn dispose_removes_registration_once() {
        let dispatcher: Dispatcher = Dispatcher::new();
        let disposer = dispatcher.register(|_| Ok(()));
        let token = disposer.token();

        disposer.dispose().unwrap();
        assert!(!dispatcher.is_registered(token));

        let err = disposer.dispose().unwrap_err();
        assert!(matches!(err, DispatchError::UnknownToken(t) if t == token));
    }

    #[test]
    fn dispose_after_dispatcher_dropped_fails() {
        let dispatcher: Dispatcher = Dispatcher::new();
        let disposer = dispatcher.register(|_| Ok(()));
        drop(dispatcher);

        assert!(matches!(
            disposer.dispose(),
            Err(DispatchError::UnknownToken(_))
        ));
    }

    #[test]
    fn disposer_converts_to_its_token() {
        let dispatcher: Dispatcher = Dispatcher::new();
        let disposer = dispatcher.register(|_| Ok(()));

        assert_eq!(DispatchToken::from(&disposer), disposer.token());
        assert_eq!(format!("{disposer:?}"), format!("Disposer {{ token: {:?} }}", disposer.token()));
    }
}
