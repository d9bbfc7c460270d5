//! Synchronous action dispatcher with explicit store ordering.
//!
//! Every state-mutation event ("action") flows through one [`Dispatcher`],
//! which fans it out to all registered handlers ("stores") in registration
//! order. A handler that depends on other stores calls
//! [`Dispatcher::wait_for`] during the pass to run them first; cycles are
//! detected and reported instead of recursing forever.
//!
//! The engine is single-threaded and never defers work: a pass runs to
//! completion inside `dispatch`, and starting a second pass from inside a
//! handler is rejected. A handler that never returns blocks the dispatcher
//! for good; there is no timeout or cancellation.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use relay_dispatcher::{Dispatcher, Payload};
//! use serde_json::json;
//!
//! let dispatcher: Dispatcher = Dispatcher::new();
//! let log = Rc::new(RefCell::new(Vec::new()));
//!
//! let seen = log.clone();
//! let prices = dispatcher.register(move |payload: &Payload| {
//!     seen.borrow_mut().push(format!("prices:{}", payload.action_type));
//!     Ok(())
//! });
//!
//! let weak = dispatcher.downgrade();
//! let prices_token = prices.token();
//! let seen = log.clone();
//! dispatcher.register(move |_payload: &Payload| {
//!     if let Some(dispatcher) = weak.upgrade() {
//!         dispatcher.wait_for([prices_token])?;
//!     }
//!     seen.borrow_mut().push("cart".to_string());
//!     Ok(())
//! });
//!
//! dispatcher.dispatch("price_changed", json!({ "sku": "A1" })).unwrap();
//! assert_eq!(*log.borrow(), vec!["prices:price_changed", "cart"]);
//! ```

pub mod adapters;
pub mod config;
pub mod dispatcher;
pub mod disposer;
pub mod error;
mod registry;
mod tracker;
pub mod types;

pub use adapters::EventRoutes;
pub use config::{DispatcherConfig, IterationPolicy};
pub use dispatcher::{Dispatcher, WeakDispatcher};
pub use disposer::Disposer;
pub use error::{DispatchError, UnknownIterationPolicy};
pub use registry::Handler;
pub use types::{DispatchToken, Payload};
