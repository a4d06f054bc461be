use crate::bridge_tests::helpers::{connect_surface, start_test_bridge};

use host_core::protocol::{InterceptedLink, LinkValue};

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn link(method: &str) -> InterceptedLink {
    InterceptedLink {
        method: method.to_string(),
        payload: BTreeMap::new(),
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(150)).await;
}

/// **VALUE**: Verifies two subscribers each see every event exactly once,
/// in the order the events were raised.
///
/// **WHY THIS MATTERS**: This is the §8 event-delivery property verbatim.
/// The subscriber registry fans one arrival out to all current observers;
/// duplication or reordering would corrupt every consumer of deep links.
#[tokio::test]
async fn given_two_subscribers_when_events_raised_then_each_sees_all_in_order() {
    let bridge = start_test_bridge().await;
    let surface = connect_surface(&bridge).await;

    let first_seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let second_seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&first_seen);
    let _first = surface.subscribe_intercepted_link(move |link| {
        sink.lock().expect("poisoned").push(link.method);
    });
    let sink = Arc::clone(&second_seen);
    let _second = surface.subscribe_intercepted_link(move |link| {
        sink.lock().expect("poisoned").push(link.method);
    });

    bridge.handle.publish_intercepted_link(link("auth/callback"));
    bridge.handle.publish_intercepted_link(link("library/open"));
    settle().await;

    let expected = vec!["auth/callback".to_string(), "library/open".to_string()];
    assert_eq!(*first_seen.lock().expect("poisoned"), expected);
    assert_eq!(*second_seen.lock().expect("poisoned"), expected);
}

/// **VALUE**: Verifies the event payload survives the wire intact.
#[tokio::test]
async fn given_payload_carrying_link_when_published_then_subscriber_receives_it_unchanged() {
    let bridge = start_test_bridge().await;
    let surface = connect_surface(&bridge).await;

    let received: Arc<Mutex<Vec<InterceptedLink>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let _subscription = surface.subscribe_intercepted_link(move |link| {
        sink.lock().expect("poisoned").push(link);
    });

    let mut payload = BTreeMap::new();
    payload.insert("code".to_string(), LinkValue::Text("abc".to_string()));
    payload.insert("fresh".to_string(), LinkValue::Bool(true));
    payload.insert("attempt".to_string(), LinkValue::Integer(2));
    let sent = InterceptedLink {
        method: "auth/callback".to_string(),
        payload,
    };
    bridge.handle.publish_intercepted_link(sent.clone());
    settle().await;

    assert_eq!(*received.lock().expect("poisoned"), vec![sent]);
}

/// **VALUE**: Verifies unsubscribing stops delivery for that observer only,
/// and that unsubscribing twice is a no-op.
///
/// **WHY THIS MATTERS**: §9 requires deterministic removal semantics from
/// the observer registry; removal must never fail and must never take other
/// observers down with it.
#[tokio::test]
async fn given_unsubscribed_observer_when_event_raised_then_only_others_see_it() {
    let bridge = start_test_bridge().await;
    let surface = connect_surface(&bridge).await;

    let leaving_seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let staying_seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&leaving_seen);
    let leaving = surface.subscribe_intercepted_link(move |link| {
        sink.lock().expect("poisoned").push(link.method);
    });
    let sink = Arc::clone(&staying_seen);
    let _staying = surface.subscribe_intercepted_link(move |link| {
        sink.lock().expect("poisoned").push(link.method);
    });

    bridge.handle.publish_intercepted_link(link("before"));
    settle().await;

    leaving.unsubscribe();
    leaving.unsubscribe();

    bridge.handle.publish_intercepted_link(link("after"));
    settle().await;

    assert_eq!(*leaving_seen.lock().expect("poisoned"), vec!["before"]);
    assert_eq!(*staying_seen.lock().expect("poisoned"), vec!["before", "after"]);
}

/// **VALUE**: Verifies a panicking subscriber does not prevent delivery to
/// the remaining subscribers.
///
/// **WHY THIS MATTERS**: §7: event-channel delivery failures must be
/// contained per observer. One broken feature module must not starve every
/// other module of deep links.
#[tokio::test]
async fn given_panicking_subscriber_when_event_raised_then_others_still_delivered() {
    let bridge = start_test_bridge().await;
    let surface = connect_surface(&bridge).await;

    let _panicking = surface.subscribe_intercepted_link(|_| {
        panic!("this subscriber is broken");
    });
    let surviving_seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&surviving_seen);
    let _surviving = surface.subscribe_intercepted_link(move |link| {
        sink.lock().expect("poisoned").push(link.method);
    });

    bridge.handle.publish_intercepted_link(link("auth/callback"));
    settle().await;

    assert_eq!(
        *surviving_seen.lock().expect("poisoned"),
        vec!["auth/callback"]
    );
}
