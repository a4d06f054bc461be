// Unit tests for the shell error type

use crate::error::ShellError;

/// **VALUE**: Verifies the display form carries the message and the
/// construction site.
///
/// **WHY THIS MATTERS**: Startup failures are printed once to stderr and
/// the log; the message is all a bug report will contain, so it must say
/// what failed and where.
#[test]
fn given_shell_error_when_displayed_then_message_and_location_present() {
    let error = ShellError::shell("the data directory is missing");
    let rendered = error.to_string();

    assert!(rendered.contains("the data directory is missing"));
    assert!(
        rendered.contains("error.rs"),
        "the location should point at the construction site, got {rendered:?}"
    );
}

/// **VALUE**: Verifies core failures flatten into the Core variant with
/// their display form preserved.
#[test]
fn given_core_failure_when_wrapped_then_reason_survives() {
    let error = ShellError::core("Update Feed Status Error: feed answered 503");
    let rendered = error.to_string();

    assert!(rendered.starts_with("Core Error:"));
    assert!(rendered.contains("503"));
}
