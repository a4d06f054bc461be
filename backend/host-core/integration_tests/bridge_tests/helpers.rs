//! Test helpers for bridge integration tests.
//!
//! Assemble a real [`HostContext`] over a temp-dir store and a recording
//! host double, start a real bridge server on an ephemeral port, and
//! connect either the typed surface or a raw WebSocket client for the
//! handshake tests.

use host_core::bridge::{
    BridgeServerHandle, BridgeSurface, HostIntegration, RecordingHost, start_bridge_server,
};
use host_core::context::HostContext;
use host_core::environment::Environment;
use host_core::protocol::AppProperties;
use host_core::store::ConfigStore;
use host_core::updater::Updater;

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use url::Url;

pub const TEST_TOKEN: &str = "test-token-12345";
pub const TEST_VERSION: &str = "1.0.0";

/// Feed URL nothing listens on. Bridge tests that never drive the updater
/// to a successful check do not need a live feed.
pub const DEAD_FEED: &str = "http://127.0.0.1:9/";

pub type RawSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One running bridge server plus everything behind it.
pub struct TestBridge {
    pub handle: BridgeServerHandle,
    pub context: Arc<HostContext>,
    pub host: Arc<RecordingHost>,
    /// Held so the store directory outlives the test body.
    pub data_dir: TempDir,
}

pub fn test_environment(feed_url: &str) -> Environment {
    Environment {
        oauth_client_id: "rivulet-test".to_string(),
        oauth_redirect_url: Url::parse("rivulet://oauth/callback").expect("redirect url"),
        app_protocol: "rivulet".to_string(),
        update_feed_url: Url::parse(feed_url).expect("feed url"),
        dev_server_url: None,
    }
}

/// Build a context over a fresh store and a recording host.
pub async fn test_context(
    feed_url: &str,
    data_dir: &TempDir,
) -> (Arc<HostContext>, Arc<RecordingHost>) {
    let environment = test_environment(feed_url);
    let store = ConfigStore::open(data_dir.path(), "rivulet").await;
    let host = Arc::new(RecordingHost::new());
    let updater = Updater::new(
        environment.update_feed_url.clone(),
        TEST_VERSION,
        data_dir.path().join("updates"),
        Arc::clone(&host) as Arc<dyn HostIntegration>,
    )
    .expect("updater should build");
    let properties = AppProperties::current(TEST_VERSION, &environment.app_protocol);
    let context = Arc::new(HostContext::new(
        environment,
        properties,
        store,
        updater,
        Arc::clone(&host) as Arc<dyn HostIntegration>,
    ));
    (context, host)
}

/// Start a bridge server on an ephemeral port with the test token.
pub async fn start_test_bridge() -> TestBridge {
    let data_dir = tempfile::tempdir().expect("temp dir should be creatable");
    let (context, host) = test_context(DEAD_FEED, &data_dir).await;
    let handle = start_bridge_server(0, Some(TEST_TOKEN.to_string()), Arc::clone(&context))
        .await
        .expect("bridge server should start");
    TestBridge {
        handle,
        context,
        host,
        data_dir,
    }
}

/// Connect and authenticate the typed surface against a test bridge.
///
/// The server subscribes a connection to the event stream just after
/// granting the handshake; the short sleep keeps an immediately published
/// event from racing that subscription.
pub async fn connect_surface(bridge: &TestBridge) -> BridgeSurface {
    let surface = BridgeSurface::connect(bridge.handle.port(), bridge.handle.token())
        .await
        .expect("the surface should connect and authenticate");
    tokio::time::sleep(Duration::from_millis(50)).await;
    surface
}

/// Raw WebSocket client for tests that exercise the handshake itself.
pub async fn connect_raw(port: u16) -> RawSocket {
    let (socket, _) = connect_async(format!("ws://127.0.0.1:{port}"))
        .await
        .expect("raw connection should open");
    socket
}

pub async fn send_text(socket: &mut RawSocket, frame: &str) {
    socket
        .send(Message::Text(frame.to_string().into()))
        .await
        .expect("sending a raw frame should work");
}

/// Next text frame, or `None` once the server closed the connection.
pub async fn receive_text(socket: &mut RawSocket) -> Option<String> {
    loop {
        match socket.next().await? {
            Ok(Message::Text(text)) => return Some(text.to_string()),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}
