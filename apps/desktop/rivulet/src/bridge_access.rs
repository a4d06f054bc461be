use host_core::bridge::BridgeServerHandle;

/// The port/token pair the shell hands the presentation loader so it can
/// connect to the bridge. Process-lifetime constant.
#[derive(Clone)]
pub struct BridgeAccess {
    port: u16,
    auth_token: String,
}

impl BridgeAccess {
    pub fn new(port: u16, auth_token: String) -> Self {
        Self { port, auth_token }
    }

    pub fn from_handle(handle: &BridgeServerHandle) -> Self {
        Self::new(handle.port(), handle.token().to_string())
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }
}
