use crate::bridge_tests::helpers::{
    TEST_TOKEN, connect_raw, connect_surface, receive_text, send_text, start_test_bridge,
};

use host_core::error::bridge::BridgeError;
use host_core::protocol::ThemeSource;

/// **VALUE**: Verifies a request/response channel works end to end over a
/// real WebSocket connection.
///
/// **WHY THIS MATTERS**: `GetAppProperties` is the simplest channel; if it
/// cannot cross the boundary, nothing can. This exercises encode, dispatch,
/// the privileged handler, and correlation on the way back.
///
/// **BUG THIS CATCHES**: Would catch a frame-shape drift between server and
/// surface, or responses that stop carrying the request's correlation id.
#[tokio::test]
async fn given_running_bridge_when_get_app_properties_then_host_facts_returned() {
    let bridge = start_test_bridge().await;
    let surface = connect_surface(&bridge).await;

    let properties = surface
        .app_properties()
        .await
        .expect("the call should succeed");

    assert_eq!(properties.name, "rivulet");
    assert_eq!(properties.version, "1.0.0");
    assert_eq!(properties.app_protocol, "rivulet");
    assert_eq!(properties.platform, std::env::consts::OS);
}

/// **VALUE**: Verifies `SetThemeSource` applies the OS hint and persists
/// the choice, observable through a bridge-independent store read.
///
/// **WHY THIS MATTERS**: This is the §8 theme property: for every supported
/// value, the store must afterwards answer with exactly that value.
#[tokio::test]
async fn given_each_theme_value_when_set_over_bridge_then_store_reads_it_back() {
    let bridge = start_test_bridge().await;
    let surface = connect_surface(&bridge).await;

    for value in [ThemeSource::Light, ThemeSource::Dark, ThemeSource::System] {
        surface
            .set_theme_source(value)
            .await
            .expect("the call should succeed");
        assert_eq!(bridge.context.store.theme().await, value);
    }

    let hints = bridge.host.theme_hints.lock().expect("poisoned");
    assert_eq!(
        *hints,
        vec![ThemeSource::Light, ThemeSource::Dark, ThemeSource::System]
    );
}

/// **VALUE**: Verifies `ClearSessionStorage` reaches the host integration.
#[tokio::test]
async fn given_clear_session_storage_when_called_then_host_wipes_session_data() {
    let bridge = start_test_bridge().await;
    let surface = connect_surface(&bridge).await;

    surface
        .clear_session_storage()
        .await
        .expect("the call should succeed");

    assert_eq!(*bridge.host.session_clears.lock().expect("poisoned"), 1);
}

/// **VALUE**: Verifies a well-formed URL is handed to the host browser
/// launcher and a malformed one is rejected before the host is asked.
///
/// **WHY THIS MATTERS**: §4.1 scopes validation to well-formedness; the
/// rejection must happen on the privileged side as a contract violation
/// with a human-readable message, and must have no side effect.
#[tokio::test]
async fn given_open_url_when_malformed_then_rejected_before_any_side_effect() {
    let bridge = start_test_bridge().await;
    let surface = connect_surface(&bridge).await;

    surface
        .open_url_in_browser("https://streams.example.com/live")
        .await
        .expect("a well-formed url should succeed");

    let result = surface.open_url_in_browser("not a url at all").await;
    match result {
        Err(BridgeError::Rejected { message, .. }) => {
            assert!(
                message.contains("malformed"),
                "the message should say what went wrong, got {message:?}"
            );
        }
        other => panic!("expected a rejected call, got {other:?}"),
    }

    let opened = bridge.host.opened_urls.lock().expect("poisoned");
    assert_eq!(
        *opened,
        vec!["https://streams.example.com/live".to_string()],
        "the malformed url must never reach the host"
    );
}

/// **VALUE**: Verifies an updater contract violation crosses the boundary
/// as a rejected call carrying the human-readable reason.
///
/// **WHY THIS MATTERS**: §7's propagation policy: privileged-side failures
/// surface to the presentation caller, never silently dropped. `install`
/// from `NotChecked` is the §8 example.
#[tokio::test]
async fn given_nothing_downloaded_when_install_over_bridge_then_rejected_with_reason() {
    let bridge = start_test_bridge().await;
    let surface = connect_surface(&bridge).await;

    let result = surface.install_update().await;
    match result {
        Err(BridgeError::Rejected { message, .. }) => {
            assert!(
                message.contains("install") && message.contains("NotChecked"),
                "the message should name the operation and state, got {message:?}"
            );
        }
        other => panic!("expected a rejected call, got {other:?}"),
    }
}

/// **VALUE**: Verifies concurrent in-flight calls each receive their own
/// answer.
///
/// **WHY THIS MATTERS**: §5's ordering guarantee is per-caller pairing by
/// correlation id. Interleaved traffic on one connection must never hand a
/// caller someone else's reply.
#[tokio::test]
async fn given_concurrent_calls_when_answered_then_each_caller_gets_its_own_reply() {
    let bridge = start_test_bridge().await;
    let surface = connect_surface(&bridge).await;

    let (properties, cleared, install) = tokio::join!(
        surface.app_properties(),
        surface.clear_session_storage(),
        surface.install_update(),
    );

    assert_eq!(properties.expect("app properties").name, "rivulet");
    cleared.expect("clear session storage");
    assert!(
        matches!(install, Err(BridgeError::Rejected { .. })),
        "install must fail on its own call, not leak into the others"
    );
}

/// **VALUE**: Verifies a wrong token is refused with a `Welcome` denial.
///
/// **WHY THIS MATTERS**: The token is the only thing keeping other local
/// processes off the privileged surface; a server that grants on mismatch
/// has no boundary at all.
#[tokio::test]
async fn given_wrong_token_when_connecting_then_handshake_refused() {
    let bridge = start_test_bridge().await;

    let result = host_core::bridge::BridgeSurface::connect(bridge.handle.port(), "wrong-token").await;
    assert!(
        matches!(result, Err(BridgeError::HandshakeRefused { .. })),
        "a wrong token must be refused, got {result:?}"
    );
}

/// **VALUE**: Verifies a request sent before the handshake closes the
/// connection without serving it.
///
/// **WHY THIS MATTERS**: Fail-closed: an unauthenticated peer gets no
/// privileged work done and no information back.
#[tokio::test]
async fn given_request_before_hello_when_sent_then_connection_closes_unserved() {
    let bridge = start_test_bridge().await;
    let mut socket = connect_raw(bridge.handle.port()).await;

    let request = format!(
        r#"{{"kind":"request","body":{{"id":"{}","call":{{"channel":"GetAppProperties"}}}}}}"#,
        uuid::Uuid::new_v4()
    );
    send_text(&mut socket, &request).await;

    assert_eq!(
        receive_text(&mut socket).await,
        None,
        "the server must close without answering"
    );
}

/// **VALUE**: Verifies a second `Hello` after a granted handshake closes
/// the connection.
///
/// **WHY THIS MATTERS**: One handshake per connection is part of the
/// contract; repeating it is a contract violation, not a refresh.
#[tokio::test]
async fn given_repeated_hello_when_sent_then_connection_closes() {
    let bridge = start_test_bridge().await;
    let mut socket = connect_raw(bridge.handle.port()).await;

    let hello = format!(r#"{{"kind":"hello","body":{{"token":"{TEST_TOKEN}"}}}}"#);
    send_text(&mut socket, &hello).await;
    let welcome = receive_text(&mut socket).await.expect("a welcome frame");
    assert!(welcome.contains("\"granted\":true"));

    send_text(&mut socket, &hello).await;
    assert_eq!(
        receive_text(&mut socket).await,
        None,
        "a repeated handshake must close the connection"
    );
}

/// **VALUE**: Verifies an undecodable frame with a recoverable correlation
/// id answers that id with an `err` outcome instead of hanging the caller.
#[tokio::test]
async fn given_undecodable_call_when_id_is_recoverable_then_err_response_carries_it() {
    let bridge = start_test_bridge().await;
    let mut socket = connect_raw(bridge.handle.port()).await;

    let hello = format!(r#"{{"kind":"hello","body":{{"token":"{TEST_TOKEN}"}}}}"#);
    send_text(&mut socket, &hello).await;
    receive_text(&mut socket).await.expect("a welcome frame");

    let id = uuid::Uuid::new_v4();
    let broken = format!(
        r#"{{"kind":"request","body":{{"id":"{id}","call":{{"channel":"NoSuchChannel"}}}}}}"#
    );
    send_text(&mut socket, &broken).await;

    let reply = receive_text(&mut socket).await.expect("an err response");
    assert!(reply.contains(&id.to_string()), "the reply must carry the id");
    assert!(reply.contains("undecodable"), "got {reply:?}");
}
