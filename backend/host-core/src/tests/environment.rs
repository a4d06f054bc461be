// Unit tests for environment loading
// These mutate process environment variables, so they run serialized

use crate::environment::{
    APP_PROTOCOL_VAR, DEV_SERVER_URL_VAR, Environment, OAUTH_CLIENT_ID_VAR,
    OAUTH_REDIRECT_URL_VAR, UPDATE_FEED_URL_VAR,
};
use crate::error::environment::EnvironmentError;

use std::env;

use serial_test::serial;

const ALL_VARS: [&str; 5] = [
    OAUTH_CLIENT_ID_VAR,
    OAUTH_REDIRECT_URL_VAR,
    APP_PROTOCOL_VAR,
    UPDATE_FEED_URL_VAR,
    DEV_SERVER_URL_VAR,
];

fn clear_all_vars() {
    for var in ALL_VARS {
        // SAFETY: the serial attribute keeps environment mutation single
        // threaded across this module.
        unsafe { env::remove_var(var) };
    }
}

fn set_var(var: &str, value: &str) {
    // SAFETY: see clear_all_vars.
    unsafe { env::set_var(var, value) };
}

/// **VALUE**: Verifies a bare process loads the compiled-in defaults.
///
/// **WHY THIS MATTERS**: §6 requires the environment to be read once with
/// every field defaulted; a shell launched with no configuration at all
/// must still point at production endpoints.
#[test]
#[serial]
fn given_no_variables_when_loaded_then_compiled_in_defaults() {
    clear_all_vars();

    let environment = Environment::load().expect("defaults should load");
    assert_eq!(environment.oauth_client_id, "rivulet-desktop");
    assert_eq!(
        environment.oauth_redirect_url.as_str(),
        "rivulet://oauth/callback"
    );
    assert_eq!(environment.app_protocol, "rivulet");
    assert_eq!(
        environment.update_feed_url.as_str(),
        "https://updates.rivulet.app/stable"
    );
    assert_eq!(environment.dev_server_url, None);
}

/// **VALUE**: Verifies each `RIVULET_*` variable overrides its field.
#[test]
#[serial]
fn given_override_variables_when_loaded_then_fields_follow_them() {
    clear_all_vars();
    set_var(OAUTH_CLIENT_ID_VAR, "staging-client");
    set_var(UPDATE_FEED_URL_VAR, "https://updates.example.com/canary");
    set_var(DEV_SERVER_URL_VAR, "http://localhost:5173/");

    let environment = Environment::load().expect("overrides should load");
    assert_eq!(environment.oauth_client_id, "staging-client");
    assert_eq!(
        environment.update_feed_url.as_str(),
        "https://updates.example.com/canary"
    );
    assert_eq!(
        environment.dev_server_url.as_ref().map(|url| url.as_str()),
        Some("http://localhost:5173/")
    );

    clear_all_vars();
}

/// **VALUE**: Verifies an unparseable URL variable fails loading with the
/// variable named.
///
/// **WHY THIS MATTERS**: A misconfigured feed URL must fail at startup
/// where it is fixable, not later as a confusing update error.
#[test]
#[serial]
fn given_invalid_url_variable_when_loaded_then_error_names_the_variable() {
    clear_all_vars();
    set_var(UPDATE_FEED_URL_VAR, "not a url");

    let result = Environment::load();
    match result {
        Err(EnvironmentError::InvalidUrl { variable, .. }) => {
            assert_eq!(variable, UPDATE_FEED_URL_VAR);
        }
        other => panic!("expected an invalid-url error, got {other:?}"),
    }

    clear_all_vars();
}

/// **VALUE**: Verifies protocol identifiers are validated as URL schemes
/// and normalized to lowercase.
#[test]
#[serial]
fn given_protocol_variable_when_loaded_then_validated_and_lowercased() {
    clear_all_vars();

    set_var(APP_PROTOCOL_VAR, "Rivulet-Dev");
    let environment = Environment::load().expect("a valid scheme should load");
    assert_eq!(environment.app_protocol, "rivulet-dev");

    set_var(APP_PROTOCOL_VAR, "9stream");
    assert!(matches!(
        Environment::load(),
        Err(EnvironmentError::InvalidProtocol { .. })
    ));

    set_var(APP_PROTOCOL_VAR, "riv ulet");
    assert!(matches!(
        Environment::load(),
        Err(EnvironmentError::InvalidProtocol { .. })
    ));

    clear_all_vars();
}

/// **VALUE**: Verifies a variable that is set but blank is treated as
/// absent.
///
/// **BUG THIS CATCHES**: Would catch `FOO=` in a `.env` file wiping a
/// default with an empty string instead of falling back.
#[test]
#[serial]
fn given_blank_variable_when_loaded_then_default_wins() {
    clear_all_vars();
    set_var(OAUTH_CLIENT_ID_VAR, "   ");

    let environment = Environment::load().expect("a blank variable should not fail the load");
    assert_eq!(environment.oauth_client_id, "rivulet-desktop");

    clear_all_vars();
}
