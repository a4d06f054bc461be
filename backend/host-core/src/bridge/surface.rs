//! Presentation-side bridge surface.
//!
//! [`BridgeSurface::connect`] dials the host, runs the token handshake and
//! spawns a reader task that routes every incoming frame: responses wake the
//! waiter registered under their correlation id, events fan out to the
//! subscriber registry. The typed wrappers are the whole client API; each
//! one sends a [`ChannelCall`], suspends on a oneshot until the paired
//! response arrives and checks that the reply came back on the channel it
//! was asked on.

use crate::error::bridge::BridgeError;
use crate::protocol::{
    AppProperties, BridgeEvent, BridgeRequest, ChannelCall, ChannelReturn, HostFrame,
    InterceptedLink, PresentationFrame, ResponseOutcome, ThemeSource, UpdateInfo,
};

use common::ErrorLocation;

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
type FrameSink = SplitSink<Socket, Message>;
type PendingCalls = Arc<Mutex<HashMap<Uuid, oneshot::Sender<ResponseOutcome>>>>;
type LinkHandler = Arc<dyn Fn(InterceptedLink) + Send + Sync>;
type LinkSubscribers = Arc<Mutex<HashMap<u64, LinkHandler>>>;

/// Connected client half of the bridge. Cheap to clone; clones share the
/// connection, the pending-call table and the subscriber registry.
#[derive(Clone)]
pub struct BridgeSurface {
    write: Arc<tokio::sync::Mutex<FrameSink>>,
    pending: PendingCalls,
    subscribers: LinkSubscribers,
    next_subscriber_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for BridgeSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeSurface").finish_non_exhaustive()
    }
}

impl BridgeSurface {
    /// Connect to the host bridge at `127.0.0.1:<port>` and authenticate
    /// with `token`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Connect`] when the socket cannot be reached,
    /// [`BridgeError::HandshakeRefused`] when the host rejects the token.
    pub async fn connect(port: u16, token: &str) -> Result<Self, BridgeError> {
        let url = format!("{}:{port}", crate::BRIDGE_BASE_URL);
        let (socket, _) =
            connect_async(url.as_str())
                .await
                .map_err(|reason| BridgeError::Connect {
                    message: format!("{url}: {reason}"),
                    location: ErrorLocation::capture(),
                })?;
        let (mut write, mut read) = socket.split();

        let hello = PresentationFrame::Hello {
            token: token.to_string(),
        };
        send_frame(&mut write, &hello).await?;
        await_welcome(&mut read).await?;
        debug!("Bridge surface authenticated on port {port}");

        let pending: PendingCalls = Arc::new(Mutex::new(HashMap::new()));
        let subscribers: LinkSubscribers = Arc::new(Mutex::new(HashMap::new()));
        tokio::spawn(run_reader(read, Arc::clone(&pending), Arc::clone(&subscribers)));

        Ok(Self {
            write: Arc::new(tokio::sync::Mutex::new(write)),
            pending,
            subscribers,
            next_subscriber_id: Arc::new(AtomicU64::new(0)),
        })
    }

    // ==== TYPED CHANNEL WRAPPERS ====

    pub async fn app_properties(&self) -> Result<AppProperties, BridgeError> {
        match self.call(ChannelCall::GetAppProperties).await? {
            ChannelReturn::GetAppProperties(properties) => Ok(properties),
            other => Err(reply_mismatch("GetAppProperties", &other)),
        }
    }

    pub async fn set_theme_source(&self, value: ThemeSource) -> Result<(), BridgeError> {
        match self.call(ChannelCall::SetThemeSource { value }).await? {
            ChannelReturn::SetThemeSource => Ok(()),
            other => Err(reply_mismatch("SetThemeSource", &other)),
        }
    }

    pub async fn clear_session_storage(&self) -> Result<(), BridgeError> {
        match self.call(ChannelCall::ClearSessionStorage).await? {
            ChannelReturn::ClearSessionStorage => Ok(()),
            other => Err(reply_mismatch("ClearSessionStorage", &other)),
        }
    }

    /// Ask the host to consult the release feed. `None` means the running
    /// version is current.
    pub async fn check_for_updates(&self) -> Result<Option<UpdateInfo>, BridgeError> {
        match self.call(ChannelCall::CheckForUpdates).await? {
            ChannelReturn::CheckForUpdates(offered) => Ok(offered),
            other => Err(reply_mismatch("CheckForUpdates", &other)),
        }
    }

    /// Download the offered update. Resolves with the staged artifact paths
    /// once every artifact is on disk and verified.
    pub async fn download_update(&self) -> Result<Vec<String>, BridgeError> {
        match self.call(ChannelCall::DownloadUpdate).await? {
            ChannelReturn::DownloadUpdate(paths) => Ok(paths),
            other => Err(reply_mismatch("DownloadUpdate", &other)),
        }
    }

    /// Hand the staged update to the installer. Against a production host
    /// this never resolves; the process exits underneath the call.
    pub async fn install_update(&self) -> Result<(), BridgeError> {
        match self.call(ChannelCall::InstallUpdate).await? {
            ChannelReturn::InstallUpdate => Ok(()),
            other => Err(reply_mismatch("InstallUpdate", &other)),
        }
    }

    pub async fn open_url_in_browser(&self, url: &str) -> Result<(), BridgeError> {
        let call = ChannelCall::OpenUrlInBrowser {
            url: url.to_string(),
        };
        match self.call(call).await? {
            ChannelReturn::OpenUrlInBrowser => Ok(()),
            other => Err(reply_mismatch("OpenUrlInBrowser", &other)),
        }
    }

    // ==== EVENT SUBSCRIPTION ====

    /// Register `handler` for every `InterceptedLink` event from now on.
    /// Handlers run on the reader task in event arrival order.
    ///
    /// The registration outlives the returned [`Subscription`] handle;
    /// only [`Subscription::unsubscribe`] removes it.
    pub fn subscribe_intercepted_link(
        &self,
        handler: impl Fn(InterceptedLink) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .expect("subscriber registry poisoned")
            .insert(id, Arc::new(handler));
        Subscription {
            id,
            registry: Arc::clone(&self.subscribers),
        }
    }

    // ==== PLUMBING ====

    /// Send one call and suspend until its correlated response arrives.
    async fn call(&self, call: ChannelCall) -> Result<ChannelReturn, BridgeError> {
        let request = BridgeRequest::new(call);
        let id = request.id;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending call table poisoned")
            .insert(id, reply_tx);

        let frame = PresentationFrame::Request(request);
        let sent = {
            let mut write = self.write.lock().await;
            send_frame(&mut write, &frame).await
        };
        if let Err(reason) = sent {
            self.pending
                .lock()
                .expect("pending call table poisoned")
                .remove(&id);
            return Err(reason);
        }

        let outcome = reply_rx.await.map_err(|_| BridgeError::ConnectionClosed {
            location: ErrorLocation::capture(),
        })?;
        match outcome {
            ResponseOutcome::Ok { value } => Ok(value),
            ResponseOutcome::Err { message } => Err(BridgeError::Rejected {
                message,
                location: ErrorLocation::capture(),
            }),
        }
    }
}

/// Handle for one registered `InterceptedLink` observer.
pub struct Subscription {
    id: u64,
    registry: LinkSubscribers,
}

impl Subscription {
    /// Remove the observer. Calling this more than once is a no-op.
    pub fn unsubscribe(&self) {
        self.registry
            .lock()
            .expect("subscriber registry poisoned")
            .remove(&self.id);
    }
}

/// Route incoming frames until the connection ends, then fail every
/// still-pending call so no caller hangs on a dead socket.
async fn run_reader(mut read: SplitStream<Socket>, pending: PendingCalls, subscribers: LinkSubscribers) {
    while let Some(incoming) = read.next().await {
        match incoming {
            Ok(Message::Text(text)) => match serde_json::from_str::<HostFrame>(text.as_str()) {
                Ok(HostFrame::Response(response)) => {
                    let waiter = pending
                        .lock()
                        .expect("pending call table poisoned")
                        .remove(&response.id);
                    match waiter {
                        Some(waiter) => {
                            let _ = waiter.send(response.outcome);
                        }
                        None => warn!("Response {} matches no pending call", response.id),
                    }
                }
                Ok(HostFrame::Event(BridgeEvent::InterceptedLink(link))) => {
                    dispatch_link(&subscribers, link);
                }
                Ok(HostFrame::Welcome { .. }) => {
                    warn!("Host repeated the welcome frame, ignoring it");
                }
                Err(reason) => warn!("Undecodable frame from the host: {reason}"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => warn!("Host sent a non-text frame, ignoring it"),
            Err(reason) => {
                warn!("Bridge connection failed: {reason}");
                break;
            }
        }
    }

    // Dropping the waiters resolves every in-flight call with
    // `ConnectionClosed`.
    pending
        .lock()
        .expect("pending call table poisoned")
        .clear();
    debug!("Bridge surface reader stopped");
}

/// Deliver one event to every subscriber registered at arrival time. The
/// registry lock is released before handlers run, so a handler may
/// subscribe or unsubscribe without deadlocking.
fn dispatch_link(subscribers: &LinkSubscribers, link: InterceptedLink) {
    let handlers: Vec<LinkHandler> = subscribers
        .lock()
        .expect("subscriber registry poisoned")
        .values()
        .cloned()
        .collect();
    for handler in handlers {
        let delivery = catch_unwind(AssertUnwindSafe(|| handler(link.clone())));
        if delivery.is_err() {
            warn!("A deep link subscriber panicked, later subscribers still ran");
        }
    }
}

async fn await_welcome(read: &mut SplitStream<Socket>) -> Result<(), BridgeError> {
    let first = match read.next().await {
        Some(Ok(Message::Text(text))) => text,
        Some(Ok(_)) => {
            return Err(BridgeError::ContractViolation {
                message: "the host answered the handshake with a non-text frame".to_string(),
                location: ErrorLocation::capture(),
            });
        }
        Some(Err(reason)) => {
            return Err(BridgeError::Read {
                message: format!("reading the welcome frame failed: {reason}"),
                location: ErrorLocation::capture(),
            });
        }
        None => {
            return Err(BridgeError::ConnectionClosed {
                location: ErrorLocation::capture(),
            });
        }
    };

    match serde_json::from_str::<HostFrame>(first.as_str()) {
        Ok(HostFrame::Welcome { granted: true, .. }) => Ok(()),
        Ok(HostFrame::Welcome { granted: false, message }) => {
            Err(BridgeError::HandshakeRefused {
                message: message
                    .unwrap_or_else(|| "the host refused the connection".to_string()),
                location: ErrorLocation::capture(),
            })
        }
        Ok(_) => Err(BridgeError::ContractViolation {
            message: "the host answered the handshake with a non-welcome frame".to_string(),
            location: ErrorLocation::capture(),
        }),
        Err(reason) => Err(BridgeError::Decode {
            message: format!("welcome frame: {reason}"),
            location: ErrorLocation::capture(),
        }),
    }
}

fn reply_mismatch(expected: &str, got: &ChannelReturn) -> BridgeError {
    BridgeError::ContractViolation {
        message: format!(
            "expected a {expected} reply, the host answered on {channel}",
            channel = got.channel()
        ),
        location: ErrorLocation::capture(),
    }
}

async fn send_frame(write: &mut FrameSink, frame: &PresentationFrame) -> Result<(), BridgeError> {
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
