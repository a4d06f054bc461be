//! Custom-protocol deep-link parsing.
//!
//! The OS hands the running instance raw URLs on its registered scheme
//! (`rivulet://auth/callback?code=…`). This module turns them into the
//! [`InterceptedLink`] payload the bridge publishes: the path becomes the
//! method, query parameters coerce to JSON primitives. A URL on a foreign
//! scheme is an error here and never reaches the event channel.

use crate::error::link::LinkError;
use crate::protocol::{InterceptedLink, LinkValue};

use common::ErrorLocation;

use std::collections::BTreeMap;

use url::Url;

/// Parse one OS-delivered URL against the shell's registered protocol.
///
/// `rivulet://auth/callback?code=abc&fresh=true` parses to method
/// `auth/callback` with payload `{code: "abc", fresh: true}`.
pub fn parse_intercepted_link(
    raw: &str,
    expected_protocol: &str,
) -> Result<InterceptedLink, LinkError> {
    let url = Url::parse(raw).map_err(|reason| LinkError::Malformed {
        url: raw.to_string(),
        reason: reason.to_string(),
        location: ErrorLocation::capture(),
    })?;

    let scheme = url.scheme();
    if !scheme.eq_ignore_ascii_case(expected_protocol) {
        return Err(LinkError::ForeignScheme {
            url: raw.to_string(),
            scheme: scheme.to_string(),
            expected: expected_protocol.to_string(),
            location: ErrorLocation::capture(),
        });
    }

    let method = method_of(&url);
    if method.is_empty() {
        return Err(LinkError::MissingMethod {
            url: raw.to_string(),
            location: ErrorLocation::capture(),
        });
    }

    let mut payload = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        payload.insert(key.into_owned(), coerce(&value));
    }

    Ok(InterceptedLink { method, payload })
}

/// The method path of a custom-scheme URL.
///
/// The URL parser files the first path segment of `scheme://a/b` under the
/// host, so the method is host and path glued back together.
fn method_of(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    let path = url.path().trim_matches('/');
    match (host.is_empty(), path.is_empty()) {
        (false, false) => format!("{host}/{path}"),
        (false, true) => host.to_string(),
        (true, _) => path.to_string(),
    }
}

/// Coerce one query value to its JSON primitive.
///
/// A key with no value (or an empty one) coerces to null. Non-finite floats
/// stay text; JSON has no spelling for them.
fn coerce(value: &str) -> LinkValue {
    if value.is_empty() {
        return LinkValue::Null;
    }
    match value {
        "true" => return LinkValue::Bool(true),
        "false" => return LinkValue::Bool(false),
        _ => {}
    }
    if let Ok(integer) = value.parse::<i64>() {
        return LinkValue::Integer(integer);
    }
    if let Ok(float) = value.parse::<f64>() {
        if float.is_finite() {
            return LinkValue::Float(float);
        }
    }
    LinkValue::Text(value.to_string())
}
