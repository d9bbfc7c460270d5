//! Event-shaped registration: `register_callback` and `register_routes`.

use std::cell::RefCell;
use std::rc::Rc;

use relay_dispatcher::{DispatchError, Dispatcher, EventRoutes, Payload};
use serde_json::{json, Value};

type Calls = Rc<RefCell<Vec<(String, Value)>>>;

fn new_calls() -> Calls {
    Rc::new(RefCell::new(Vec::new()))
}

fn recording(calls: &Calls) -> impl Fn(&str, &Value) -> anyhow::Result<()> + 'static {
    let calls = calls.clone();
    move |action_type: &str, value: &Value| {
        calls
            .borrow_mut()
            .push((action_type.to_string(), value.clone()));
        Ok(())
    }
}

// =========================================================================
// register_callback
// =========================================================================

#[test]
fn callback_fires_only_for_its_action_type() {
    let dispatcher: Dispatcher = Dispatcher::new();
    let calls = new_calls();
    dispatcher.register_callback("FOO", recording(&calls));

    dispatcher.dispatch("FOO", json!(42)).unwrap();
    dispatcher.dispatch("BAR", json!(1)).unwrap();

    assert_eq!(*calls.borrow(), vec![("FOO".to_string(), json!(42))]);
}

#[test]
fn callback_disposer_unregisters_it() {
    let dispatcher: Dispatcher = Dispatcher::new();
    let calls = new_calls();
    let disposer = dispatcher.register_callback("FOO", recording(&calls));

    disposer.dispose().unwrap();
    dispatcher.dispatch("FOO", json!(1)).unwrap();

    assert!(calls.borrow().is_empty());
    assert!(matches!(
        disposer.dispose(),
        Err(DispatchError::UnknownToken(_))
    ));
}

#[test]
fn callback_token_works_with_wait_for() {
    let dispatcher: Dispatcher = Dispatcher::new();
    let order = Rc::new(RefCell::new(Vec::new()));
    let dependency: Rc<RefCell<Option<relay_dispatcher::DispatchToken>>> =
        Rc::new(RefCell::new(None));

    let weak = dispatcher.downgrade();
    let sink = order.clone();
    let dep = dependency.clone();
    dispatcher.register(move |_: &Payload| {
        if let (Some(dispatcher), Some(token)) = (weak.upgrade(), *dep.borrow()) {
            dispatcher.wait_for([token])?;
        }
        sink.borrow_mut().push("store");
        Ok(())
    });

    let sink = order.clone();
    let totals = dispatcher.register_callback("FOO", move |_, _| {
        sink.borrow_mut().push("totals");
        Ok(())
    });
    *dependency.borrow_mut() = Some(totals.token());

    dispatcher.dispatch("FOO", json!(null)).unwrap();

    assert_eq!(*order.borrow(), vec!["totals", "store"]);
}

#[test]
fn callback_error_propagates() {
    let dispatcher: Dispatcher = Dispatcher::new();
    dispatcher.register_callback("FOO", |_, _| Err(anyhow::anyhow!("rejected")));

    dispatcher.dispatch("BAR", json!(1)).unwrap();
    let err = dispatcher.dispatch("FOO", json!(1)).unwrap_err();
    assert_eq!(err.to_string(), "rejected");
}

// =========================================================================
// register_routes
// =========================================================================

#[test]
fn routes_dispatch_to_matching_callback_only() {
    let dispatcher: Dispatcher = Dispatcher::new();
    let added = new_calls();
    let removed = new_calls();
    dispatcher.register_routes(
        EventRoutes::new()
            .on("cart:add", recording(&added))
            .on("cart:remove", recording(&removed)),
    );

    dispatcher.dispatch("cart:add", json!({"sku": "A1"})).unwrap();
    dispatcher.dispatch("cart:checkout", json!({})).unwrap();
    dispatcher.dispatch("cart:remove", json!({"sku": "A1"})).unwrap();

    assert_eq!(
        *added.borrow(),
        vec![("cart:add".to_string(), json!({"sku": "A1"}))]
    );
    assert_eq!(
        *removed.borrow(),
        vec![("cart:remove".to_string(), json!({"sku": "A1"}))]
    );
}

#[test]
fn routes_register_as_a_single_handler() {
    let dispatcher: Dispatcher = Dispatcher::new();
    let calls = new_calls();
    let disposer = dispatcher.register_routes(
        EventRoutes::new()
            .on("a", recording(&calls))
            .on("b", recording(&calls)),
    );

    assert_eq!(dispatcher.len(), 1);
    disposer.dispose().unwrap();
    assert!(dispatcher.is_empty());
}

#[test]
fn empty_routes_ignore_everything() {
    let dispatcher: Dispatcher = Dispatcher::new();
    let routes: EventRoutes = EventRoutes::new();
    assert!(routes.is_empty());
    dispatcher.register_routes(routes);

    dispatcher.dispatch("anything", json!(1)).unwrap();
}
