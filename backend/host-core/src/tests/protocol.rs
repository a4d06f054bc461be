// Unit tests for the protocol module
// Tests the channel contract: the closed name set and the wire frame shapes

use crate::protocol::{
    AppProperties, BridgeRequest, BridgeResponse, ChannelCall, ChannelName, ChannelReturn,
    HostFrame, PresentationFrame, ResponseOutcome, ThemeSource,
};

use uuid::Uuid;

/// **VALUE**: Verifies every channel's wire spelling resolves back to the
/// same channel.
///
/// **WHY THIS MATTERS**: The wire spelling is the contract both process
/// images agree on. A spelling that does not round-trip means one side
/// emits names the other cannot route.
///
/// **BUG THIS CATCHES**: Would catch a renamed variant whose `as_str` arm
/// was not updated, or a new channel missing from `ALL`.
#[test]
fn given_every_channel_when_spelling_round_trips_then_same_channel() {
    for channel in ChannelName::ALL {
        assert_eq!(
            ChannelName::from_name(channel.as_str()),
            Some(channel),
            "wire spelling of {channel} must resolve back to itself"
        );
    }
}

/// **VALUE**: Verifies a name outside the closed set resolves to nothing.
///
/// **WHY THIS MATTERS**: The channel set is closed by design; a free-form
/// name must fail at the boundary, never reach a handler.
#[test]
fn given_unknown_name_when_resolved_then_none() {
    assert_eq!(ChannelName::from_name("RebootHost"), None);
    assert_eq!(ChannelName::from_name(""), None);
    // Spellings are case-sensitive.
    assert_eq!(ChannelName::from_name("getappproperties"), None);
}

/// **VALUE**: Verifies exactly one channel is an event channel.
///
/// **WHY THIS MATTERS**: Event channels carry no correlation id; routing a
/// request channel through the event path would orphan its caller.
#[test]
fn given_all_channels_when_classified_then_only_intercepted_link_is_event() {
    let events: Vec<ChannelName> = ChannelName::ALL
        .into_iter()
        .filter(ChannelName::is_event)
        .collect();
    assert_eq!(events, vec![ChannelName::InterceptedLink]);
}

/// **VALUE**: Verifies every call and return payload reports the channel its
/// wire tag claims.
///
/// **BUG THIS CATCHES**: Would catch a `channel()` arm pointing a payload at
/// the wrong channel, which would make the surface reject valid replies.
#[test]
fn given_call_and_return_payloads_when_asked_for_channel_then_pairing_matches() {
    let calls = [
        ChannelCall::GetAppProperties,
        ChannelCall::SetThemeSource {
            value: ThemeSource::Dark,
        },
        ChannelCall::ClearSessionStorage,
        ChannelCall::CheckForUpdates,
        ChannelCall::DownloadUpdate,
        ChannelCall::InstallUpdate,
        ChannelCall::OpenUrlInBrowser {
            url: "https://example.com".to_string(),
        },
    ];
    let expected = [
        ChannelName::GetAppProperties,
        ChannelName::SetThemeSource,
        ChannelName::ClearSessionStorage,
        ChannelName::CheckForUpdates,
        ChannelName::DownloadUpdate,
        ChannelName::InstallUpdate,
        ChannelName::OpenUrlInBrowser,
    ];
    for (call, channel) in calls.iter().zip(expected) {
        assert_eq!(call.channel(), channel);
    }

    let returns = [
        ChannelReturn::SetThemeSource,
        ChannelReturn::CheckForUpdates(None),
        ChannelReturn::DownloadUpdate(vec!["a".to_string()]),
    ];
    let expected = [
        ChannelName::SetThemeSource,
        ChannelName::CheckForUpdates,
        ChannelName::DownloadUpdate,
    ];
    for (value, channel) in returns.iter().zip(expected) {
        assert_eq!(value.channel(), channel);
    }
}

/// **VALUE**: Verifies a request frame round-trips through JSON with its
/// correlation id intact.
///
/// **WHY THIS MATTERS**: Responses are paired to callers exclusively by the
/// correlation id. An id that does not survive serialization silently
/// orphans every call.
#[test]
fn given_request_frame_when_serialized_then_round_trips_with_same_id() {
    let request = BridgeRequest::new(ChannelCall::SetThemeSource {
        value: ThemeSource::Light,
    });
    let id = request.id;
    let frame = PresentationFrame::Request(request);

    let encoded = serde_json::to_string(&frame).expect("frame should serialize");
    let decoded: PresentationFrame =
        serde_json::from_str(&encoded).expect("frame should deserialize");

    match decoded {
        PresentationFrame::Request(request) => {
            assert_eq!(request.id, id);
            assert_eq!(
                request.call,
                ChannelCall::SetThemeSource {
                    value: ThemeSource::Light
                }
            );
        }
        other => panic!("expected a request frame, got {other:?}"),
    }
}

/// **VALUE**: Verifies the handshake frame carries its wire tag in
/// snake_case with the token in the body.
///
/// **WHY THIS MATTERS**: The JS shim in the webview builds this frame by
/// hand; its exact JSON spelling is part of the external contract.
#[test]
fn given_hello_frame_when_serialized_then_wire_shape_is_stable() {
    let frame = PresentationFrame::Hello {
        token: "secret".to_string(),
    };
    let encoded = serde_json::to_value(&frame).expect("frame should serialize");
    assert_eq!(encoded["kind"], "hello");
    assert_eq!(encoded["body"]["token"], "secret");
}

/// **VALUE**: Verifies a theme value outside `{system, light, dark}` fails
/// deserialization.
///
/// **WHY THIS MATTERS**: §4.1 requires malformed theme values to be rejected
/// before any persistence occurs. Failing at decode means the handler, and
/// with it the store, is never reached.
#[test]
fn given_malformed_theme_value_when_decoded_then_rejected() {
    let raw = r#"{"channel":"SetThemeSource","args":{"value":"solarized"}}"#;
    let decoded = serde_json::from_str::<ChannelCall>(raw);
    assert!(decoded.is_err(), "a theme outside the enum must not decode");

    for valid in ["system", "light", "dark"] {
        let raw = format!(r#"{{"channel":"SetThemeSource","args":{{"value":"{valid}"}}}}"#);
        assert!(serde_json::from_str::<ChannelCall>(&raw).is_ok());
    }
}

/// **VALUE**: Verifies a call on a channel outside the closed set fails
/// deserialization.
#[test]
fn given_unknown_channel_in_call_when_decoded_then_rejected() {
    let raw = r#"{"channel":"FormatDisk","args":{}}"#;
    assert!(serde_json::from_str::<ChannelCall>(raw).is_err());
}

/// **VALUE**: Verifies both response outcomes round-trip, error messages
/// included.
///
/// **WHY THIS MATTERS**: Privileged-side failures cross the boundary only as
/// the `err` outcome's message. Losing it would silently drop failures,
/// which §7 forbids.
#[test]
fn given_response_outcomes_when_serialized_then_round_trip() {
    let id = Uuid::new_v4();

    let ok = BridgeResponse::ok(
        id,
        ChannelReturn::GetAppProperties(AppProperties::new(
            "rivulet", "1.2.3", "linux", "x86_64", "rivulet",
        )),
    );
    let encoded = serde_json::to_string(&HostFrame::Response(ok.clone())).expect("serialize");
    let decoded: HostFrame = serde_json::from_str(&encoded).expect("deserialize");
    assert_eq!(decoded, HostFrame::Response(ok));

    let err = BridgeResponse::err(id, "the updater is mid-download");
    let encoded = serde_json::to_string(&HostFrame::Response(err)).expect("serialize");
    let decoded: HostFrame = serde_json::from_str(&encoded).expect("deserialize");
    match decoded {
        HostFrame::Response(response) => {
            assert_eq!(response.id, id);
            assert_eq!(
                response.outcome,
                ResponseOutcome::Err {
                    message: "the updater is mid-download".to_string()
                }
            );
        }
        other => panic!("expected a response frame, got {other:?}"),
    }
}
