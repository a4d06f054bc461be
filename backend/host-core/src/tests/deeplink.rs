// Unit tests for deep-link parsing
// Tests method extraction, payload coercion, and scheme enforcement

use crate::deeplink::parse_intercepted_link;
use crate::error::link::LinkError;
use crate::protocol::LinkValue;

const PROTOCOL: &str = "rivulet";

/// **VALUE**: Verifies the canonical OAuth callback shape parses into
/// method and payload.
#[test]
fn given_auth_callback_url_when_parsed_then_method_and_payload_extracted() {
    let link = parse_intercepted_link("rivulet://auth/callback?code=abc123&fresh=true", PROTOCOL)
        .expect("the link should parse");

    assert_eq!(link.method, "auth/callback");
    assert_eq!(
        link.payload.get("code"),
        Some(&LinkValue::Text("abc123".to_string()))
    );
    assert_eq!(link.payload.get("fresh"), Some(&LinkValue::Bool(true)));
}

/// **VALUE**: Verifies every documented primitive coercion: booleans,
/// integers, floats, null for valueless keys, text for the rest.
///
/// **WHY THIS MATTERS**: The payload mapping is `string -> primitive|null`
/// by contract; presentation code switches on these JSON types.
#[test]
fn given_query_values_when_coerced_then_json_primitives() {
    let link = parse_intercepted_link(
        "rivulet://open?flag=false&count=42&ratio=2.5&empty=&name=twitch&mixed=4two",
        PROTOCOL,
    )
    .expect("the link should parse");

    assert_eq!(link.payload.get("flag"), Some(&LinkValue::Bool(false)));
    assert_eq!(link.payload.get("count"), Some(&LinkValue::Integer(42)));
    assert_eq!(link.payload.get("ratio"), Some(&LinkValue::Float(2.5)));
    assert_eq!(link.payload.get("empty"), Some(&LinkValue::Null));
    assert_eq!(
        link.payload.get("name"),
        Some(&LinkValue::Text("twitch".to_string()))
    );
    assert_eq!(
        link.payload.get("mixed"),
        Some(&LinkValue::Text("4two".to_string())),
        "a value that only starts numeric stays text"
    );
}

/// **VALUE**: Verifies a URL on a foreign scheme is rejected with a
/// descriptive error, never published.
///
/// **WHY THIS MATTERS**: The OS can hand over URLs for schemes the shell
/// never registered (misconfiguration, another app's protocol). Publishing
/// them would let arbitrary external input into the event channel.
#[test]
fn given_foreign_scheme_when_parsed_then_rejected_with_both_schemes_named() {
    let result = parse_intercepted_link("https://auth/callback", PROTOCOL);
    match result {
        Err(LinkError::ForeignScheme {
            scheme, expected, ..
        }) => {
            assert_eq!(scheme, "https");
            assert_eq!(expected, "rivulet");
        }
        other => panic!("expected a foreign-scheme error, got {other:?}"),
    }
}

/// **VALUE**: Verifies scheme matching is case-insensitive, as URL schemes
/// are.
#[test]
fn given_uppercased_scheme_when_parsed_then_accepted() {
    let link = parse_intercepted_link("RIVULET://settings", PROTOCOL)
        .expect("scheme comparison must ignore case");
    assert_eq!(link.method, "settings");
}

/// **VALUE**: Verifies a URL that is not a URL at all surfaces a malformed
/// error.
#[test]
fn given_unparseable_input_when_parsed_then_malformed_error() {
    assert!(matches!(
        parse_intercepted_link("not a url", PROTOCOL),
        Err(LinkError::Malformed { .. })
    ));
}

/// **VALUE**: Verifies a link with no method path is rejected rather than
/// published with an empty method.
#[test]
fn given_no_method_path_when_parsed_then_missing_method_error() {
    assert!(matches!(
        parse_intercepted_link("rivulet://", PROTOCOL),
        Err(LinkError::MissingMethod { .. })
    ));
}

/// **VALUE**: Verifies a bare method with no query parses to an empty
/// payload, and that deeper paths glue host and path back together.
#[test]
fn given_method_variants_when_parsed_then_paths_normalize() {
    let bare = parse_intercepted_link("rivulet://settings", PROTOCOL).expect("bare method");
    assert_eq!(bare.method, "settings");
    assert!(bare.payload.is_empty());

    let deep = parse_intercepted_link("rivulet://library/import/favorites", PROTOCOL)
        .expect("deep method");
    assert_eq!(deep.method, "library/import/favorites");
}
