use crate::protocol::{BridgeEvent, InterceptedLink};

use log::debug;
use tokio::sync::broadcast;

/// Handle to a running bridge server.
///
/// Carries the bound port and the per-launch auth token (the pair the shell
/// hands the presentation loader) and is the host side's way of publishing
/// events. Dropping the handle does not stop the server; it runs until the
/// process exits.
#[derive(Clone)]
pub struct BridgeServerHandle {
    port: u16,
    token: String,
    events: broadcast::Sender<BridgeEvent>,
}

impl BridgeServerHandle {
    pub(crate) fn new(port: u16, token: String, events: broadcast::Sender<BridgeEvent>) -> Self {
        Self {
            port,
            token,
            events,
        }
    }

    /// The port actually bound, resolved even when the server was started
    /// on port 0.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The token a connection's `Hello` must present.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Fan an event out to every authenticated connection.
    ///
    /// Each connection sees events in publish order. With no connection
    /// listening the event is dropped; event channels promise delivery to
    /// current subscribers only.
    pub fn publish(&self, event: BridgeEvent) {
        match self.events.send(event) {
            Ok(connections) => debug!("Bridge event delivered to {connections} connection(s)"),
            Err(_) => debug!("Bridge event dropped, no connection is listening"),
        }
    }

    /// Publish an intercepted deep link to the presentation side.
    pub fn publish_intercepted_link(&self, link: InterceptedLink) {
        self.publish(BridgeEvent::InterceptedLink(link));
    }
}
