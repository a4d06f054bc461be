// Unit tests for the bridge access handoff

use crate::bridge_access::BridgeAccess;

/// **VALUE**: Verifies the handoff pair exposes exactly what was put in.
///
/// **WHY THIS MATTERS**: The presentation loader gets nothing but this
/// pair; a port or token that mutates on the way through would strand the
/// webview outside the bridge.
#[test]
fn given_access_pair_when_read_then_port_and_token_unchanged() {
    let access = BridgeAccess::new(18530, "per-launch-token".to_string());

    assert_eq!(access.port(), 18530);
    assert_eq!(access.auth_token(), "per-launch-token");

    let cloned = access.clone();
    assert_eq!(cloned.port(), 18530);
    assert_eq!(cloned.auth_token(), "per-launch-token");
}
