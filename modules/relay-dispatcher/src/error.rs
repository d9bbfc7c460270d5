use thiserror::Error;

use crate::types::DispatchToken;

/// Everything a dispatcher operation can fail with.
///
/// None of these are transient; retrying the same call cannot succeed.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("cannot dispatch in the middle of a dispatch")]
    AlreadyDispatching,

    #[error("wait_for must be invoked while dispatching")]
    NotDispatching,

    #[error("{0} does not map to a registered callback")]
    UnknownToken(DispatchToken),

    #[error("circular dependency detected while waiting for {0}")]
    CircularDependency(DispatchToken),

    /// A handler failed with an error of its own. Carried unchanged.
    #[error(transparent)]
    Handler(anyhow::Error),
}

impl DispatchError {
    /// True for the two misuse-of-state errors (dispatch while dispatching,
    /// wait_for outside a pass).
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::AlreadyDispatching | Self::NotDispatching)
    }

    /// Recover a dispatcher error that travelled up through a handler's
    /// `anyhow::Result` with a bare `?`, or wrap a genuine handler failure.
    ///
    /// Only the outermost error is checked: once a handler has attached
    /// context, the error is the handler's own and is kept whole.
    pub(crate) fn from_handler(err: anyhow::Error) -> Self {
        let bare = err
            .chain()
            .next()
            .is_some_and(|outermost| outermost.is::<DispatchError>());
        if !bare {
            return Self::Handler(err);
        }
        match err.downcast::<DispatchError>() {
            Ok(dispatch_err) => dispatch_err,
            Err(err) => Self::Handler(err),
        }
    }
}

/// Returned when parsing an [`IterationPolicy`](crate::IterationPolicy) name fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown iteration policy `{0}` (expected `snapshot` or `live`)")]
pub struct UnknownIterationPolicy(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn circular() -> DispatchError {
        DispatchError::CircularDependency(DispatchToken::next())
    }

    #[test]
    fn bare_dispatch_error_is_recovered() {
        let err = DispatchError::from_handler(anyhow::Error::new(circular()));
        assert!(matches!(err, DispatchError::CircularDependency(_)));
    }

    #[test]
    fn dispatch_error_with_context_stays_a_handler_error() {
        let wrapped = Err::<(), _>(circular())
            .context("stock store gave up")
            .unwrap_err();

        let err = DispatchError::from_handler(wrapped);

        assert!(matches!(err, DispatchError::Handler(_)));
        assert_eq!(err.to_string(), "stock store gave up");
    }

    #[test]
    fn foreign_error_becomes_handler_error() {
        let err = DispatchError::from_handler(anyhow::anyhow!("disk full"));
        assert!(matches!(err, DispatchError::Handler(_)));
        assert_eq!(err.to_string(), "disk full");
    }
}
