//! Privileged-side bridge server.
//!
//! Listens on localhost, authenticates each presentation connection with
//! the per-launch token, then serves the channel contract: decode a
//! [`PresentationFrame`], run the privileged handler against the
//! [`HostContext`], answer with a correlated [`HostFrame::Response`].
//! Events published through the [`BridgeServerHandle`] are fanned out to
//! every authenticated connection by a per-connection forwarder.
//!
//! Frames are JSON text messages. After the handshake, an undecodable frame
//! answers with an `err` outcome when the correlation id can be recovered
//! from the raw JSON; otherwise it is dropped with a warning. Failures all
//! close the connection (fail-closed).

use crate::bridge::handle::BridgeServerHandle;
use crate::context::HostContext;
use crate::error::CoreError;
use crate::error::bridge::BridgeError;
use crate::protocol::{
    BridgeResponse, ChannelCall, ChannelReturn, HostFrame, PresentationFrame, ThemeSource,
};

use common::ErrorLocation;

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use url::Url;
use uuid::Uuid;

/// Events buffered per connection before a slow one starts losing them.
const EVENT_QUEUE_DEPTH: usize = 64;

type FrameSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Start the bridge server on `127.0.0.1:<port>` (0 picks a free port).
///
/// When `auth_token` is `None` a fresh v4 UUID token is generated. The
/// returned handle carries the bound port and the token; hand that pair to
/// the presentation loader.
///
/// # Errors
///
/// [`BridgeError::Bind`] when the port cannot be bound.
pub async fn start_bridge_server(
    port: u16,
    auth_token: Option<String>,
    context: Arc<HostContext>,
) -> Result<BridgeServerHandle, BridgeError> {
    let token = auth_token.unwrap_or_else(|| Uuid::new_v4().to_string());

    let address = format!("{}:{port}", crate::BRIDGE_HOSTNAME);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| BridgeError::Bind {
            address: address.clone(),
            source,
            location: ErrorLocation::capture(),
        })?;
    let local_address = listener.local_addr().map_err(|source| BridgeError::Bind {
        address,
        source,
        location: ErrorLocation::capture(),
    })?;

    info!("Bridge server listening on {local_address}");
    debug!("Bridge auth token: {token}");

    let (events_tx, _) = broadcast::channel(EVENT_QUEUE_DEPTH);

    let accept_token = token.clone();
    let accept_events = events_tx.clone();
    tokio::spawn(async move {
        while let Ok((stream, peer)) = listener.accept().await {
            info!("Presentation client connecting from {peer}");
            let token = accept_token.clone();
            let context = Arc::clone(&context);
            let events = accept_events.clone();
            tokio::spawn(async move {
                if let Err(error) = handle_connection(stream, peer, token, context, events).await {
                    warn!("Bridge connection from {peer} ended with an error: {error}");
                }
            });
        }
    });

    Ok(BridgeServerHandle::new(local_address.port(), token, events_tx))
}

/// Serve one presentation connection: loopback check, WebSocket upgrade,
/// `Hello` handshake, then the request/event loop.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    token: String,
    context: Arc<HostContext>,
    events: broadcast::Sender<crate::protocol::BridgeEvent>,
) -> Result<(), BridgeError> {
    if !peer.ip().is_loopback() {
        // Silent rejection; a non-loopback peer learns nothing.
        warn!("Rejected non-loopback connection from {peer}");
        return Ok(());
    }

    let ws_stream = accept_async(stream)
        .await
        .map_err(|reason| BridgeError::Handshake {
            message: format!("WebSocket upgrade failed: {reason}"),
            location: ErrorLocation::capture(),
        })?;
    let (mut write, mut read) = ws_stream.split();

    if !await_hello(&mut write, &mut read, peer, &token).await? {
        return Ok(());
    }

    // Authenticated from here on. Subscribe now: event channels promise
    // delivery from the moment of subscription, not before.
    let mut events = events.subscribe();

    loop {
        tokio::select! {
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match decode_frame(text.as_str()) {
                        Ok(PresentationFrame::Request(request)) => {
                            let id = request.id;
                            let channel = request.call.channel();
                            let response = match dispatch_call(&context, request.call).await {
                                Ok(value) => BridgeResponse::ok(id, value),
                                Err(error) => {
                                    warn!("Bridge request {id} on {channel} failed: {error}");
                                    BridgeResponse::err(id, error.to_string())
                                }
                            };
                            send_frame(&mut write, &HostFrame::Response(response)).await?;
                        }
                        Ok(PresentationFrame::Hello { .. }) => {
                            // One handshake per connection.
                            warn!("Client {peer} repeated the handshake, closing the connection");
                            return Ok(());
                        }
                        Err(reason) => {
                            warn!("Undecodable frame from {peer}: {reason}");
                            if let Some(id) = recover_request_id(text.as_str()) {
                                let response = BridgeResponse::err(
                                    id,
                                    format!("undecodable call: {reason}"),
                                );
                                send_frame(&mut write, &HostFrame::Response(response)).await?;
                            }
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {
                    warn!("Client {peer} sent a non-text frame, ignoring it");
                }
                Some(Err(reason)) => {
                    return Err(BridgeError::Read {
                        message: format!("reading from {peer} failed: {reason}"),
                        location: ErrorLocation::capture(),
                    });
                }
            },
            event = events.recv() => match event {
                Ok(event) => send_frame(&mut write, &HostFrame::Event(event)).await?,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Connection {peer} lagged, {missed} event(s) were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    info!("Presentation client {peer} disconnected");
    Ok(())
}

/// Run the handshake. `Ok(true)` means the connection is authenticated;
/// `Ok(false)` means it was refused and must be closed without serving.
async fn await_hello(
    write: &mut FrameSink,
    read: &mut (impl StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin),
    peer: SocketAddr,
    token: &str,
) -> Result<bool, BridgeError> {
    let first = match read.next().await {
        Some(Ok(Message::Text(text))) => text,
        Some(Ok(_)) => {
            warn!("Client {peer} sent a non-text first frame");
            return Ok(false);
        }
        Some(Err(reason)) => {
            return Err(BridgeError::Read {
                message: format!("reading the first frame from {peer} failed: {reason}"),
                location: ErrorLocation::capture(),
            });
        }
        None => {
            warn!("Client {peer} disconnected before the handshake");
            return Ok(false);
        }
    };

    match decode_frame(first.as_str()) {
        Ok(PresentationFrame::Hello { token: presented }) => {
            if presented == token {
                info!("Client {peer} authenticated");
                let welcome = HostFrame::Welcome {
                    granted: true,
                    message: None,
                };
                send_frame(write, &welcome).await?;
                Ok(true)
            } else {
                warn!("Client {peer} presented an invalid bridge token");
                let welcome = HostFrame::Welcome {
                    granted: false,
                    message: Some("invalid bridge token".to_string()),
                };
                send_frame(write, &welcome).await?;
                Ok(false)
            }
        }
        Ok(_) => {
            // Fail closed, and silently: no Welcome for a client that
            // skipped the handshake.
            warn!("Client {peer} sent a request before the handshake");
            Ok(false)
        }
        Err(reason) => {
            warn!("Client {peer} sent an undecodable first frame: {reason}");
            Ok(false)
        }
    }
}

/// Route one decoded call to its privileged handler.
async fn dispatch_call(
    context: &HostContext,
    call: ChannelCall,
) -> Result<ChannelReturn, CoreError> {
    match call {
        ChannelCall::GetAppProperties => handle_get_app_properties(context),
        ChannelCall::SetThemeSource { value } => handle_set_theme_source(context, value).await,
        ChannelCall::ClearSessionStorage => handle_clear_session_storage(context),
        ChannelCall::CheckForUpdates => handle_check_for_updates(context).await,
        ChannelCall::DownloadUpdate => handle_download_update(context).await,
        ChannelCall::InstallUpdate => handle_install_update(context),
        ChannelCall::OpenUrlInBrowser { url } => handle_open_url_in_browser(context, &url),
    }
}

fn handle_get_app_properties(context: &HostContext) -> Result<ChannelReturn, CoreError> {
    info!("Handling GetAppProperties request");
    Ok(ChannelReturn::GetAppProperties(context.properties.clone()))
}

async fn handle_set_theme_source(
    context: &HostContext,
    value: ThemeSource,
) -> Result<ChannelReturn, CoreError> {
    info!("Handling SetThemeSource request: {value}");
    context
        .host
        .set_theme_hint(value)
        .map_err(|reason| host_error(reason))?;
    context.store.set_theme(Some(value)).await?;
    Ok(ChannelReturn::SetThemeSource)
}

fn handle_clear_session_storage(context: &HostContext) -> Result<ChannelReturn, CoreError> {
    info!("Handling ClearSessionStorage request");
    context
        .host
        .clear_session_storage()
        .map_err(|reason| host_error(reason))?;
    Ok(ChannelReturn::ClearSessionStorage)
}

async fn handle_check_for_updates(context: &HostContext) -> Result<ChannelReturn, CoreError> {
    info!("Handling CheckForUpdates request");
    let offered = context.updater.check().await?;
    Ok(ChannelReturn::CheckForUpdates(offered))
}

async fn handle_download_update(context: &HostContext) -> Result<ChannelReturn, CoreError> {
    info!("Handling DownloadUpdate request");
    let staged = context.updater.download().await?;
    let paths = staged
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    Ok(ChannelReturn::DownloadUpdate(paths))
}

fn handle_install_update(context: &HostContext) -> Result<ChannelReturn, CoreError> {
    info!("Handling InstallUpdate request");
    context.updater.install()?;
    Ok(ChannelReturn::InstallUpdate)
}

fn handle_open_url_in_browser(
    context: &HostContext,
    url: &str,
) -> Result<ChannelReturn, CoreError> {
    info!("Handling OpenUrlInBrowser request: {url}");
    let parsed = Url::parse(url).map_err(|reason| BridgeError::ContractViolation {
        message: format!("OpenUrlInBrowser got a malformed url {url:?}: {reason}"),
        location: ErrorLocation::capture(),
    })?;
    context
        .host
        .open_in_browser(parsed.as_str())
        .map_err(|reason| host_error(reason))?;
    Ok(ChannelReturn::OpenUrlInBrowser)
}

#[track_caller]
fn host_error(reason: std::io::Error) -> CoreError {
    CoreError::Host {
        message: reason.to_string(),
        location: ErrorLocation::capture(),
    }
}

fn decode_frame(raw: &str) -> Result<PresentationFrame, BridgeError> {
    serde_json::from_str(raw).map_err(|reason| BridgeError::Decode {
        message: reason.to_string(),
        location: ErrorLocation::capture(),
    })
}

async fn send_frame(write: &mut FrameSink, frame: &HostFrame) -> Result<(), BridgeError> {
    let encoded = serde_json::to_string(frame).map_err(|reason| BridgeError::Encode {
        message: reason.to_string(),
        location: ErrorLocation::capture(),
    })?;
    write
        .send(Message::Text(encoded.into()))
        .await
        .map_err(|reason| BridgeError::Send {
            message: reason.to_string(),
            location: ErrorLocation::capture(),
        })
}

/// Best-effort correlation id from a frame that failed typed decode, so the
/// caller's waiter can still be failed instead of left hanging.
fn recover_request_id(raw: &str) -> Option<Uuid> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let id = value.get("body")?.get("id")?.as_str()?;
    Uuid::parse_str(id).ok()
}
