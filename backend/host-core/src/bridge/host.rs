use crate::protocol::ThemeSource;

use std::io;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Mutex;

use log::info;

/// The OS facilities the privileged channel handlers consume.
///
/// Kept narrow and synchronous so the bridge can be driven against a
/// recording double; the production implementation is [`NativeHost`].
pub trait HostIntegration: Send + Sync {
    /// Apply the OS-level theme hint for the shell's windows.
    fn set_theme_hint(&self, theme: ThemeSource) -> io::Result<()>;

    /// Wipe the presentation side's persisted session data.
    fn clear_session_storage(&self) -> io::Result<()>;

    /// Open `url` in the user's default external browser.
    fn open_in_browser(&self, url: &str) -> io::Result<()>;

    /// Hand staged update artifacts to the platform installer.
    ///
    /// In production this does not return: the process is replaced by the
    /// restarted application. Test doubles record the call and return.
    fn apply_update(&self, artifacts: &[PathBuf]) -> io::Result<()>;
}

/// Production [`HostIntegration`] backed by the desktop OS.
pub struct NativeHost {
    data_dir: PathBuf,
    theme_hint: Mutex<ThemeSource>,
}

impl NativeHost {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            theme_hint: Mutex::new(ThemeSource::default()),
        }
    }

    /// The hint most recently applied through the bridge. The window layer
    /// reads this when it rebuilds chrome.
    pub fn theme_hint(&self) -> ThemeSource {
        *self.theme_hint.lock().expect("theme hint poisoned")
    }

    fn session_dir(&self) -> PathBuf {
        self.data_dir.join("session")
    }
}

impl HostIntegration for NativeHost {
    fn set_theme_hint(&self, theme: ThemeSource) -> io::Result<()> {
        *self.theme_hint.lock().expect("theme hint poisoned") = theme;
        info!("Theme hint set to {theme}");
        Ok(())
    }

    fn clear_session_storage(&self) -> io::Result<()> {
        let session_dir = self.session_dir();
        match std::fs::remove_dir_all(&session_dir) {
            Ok(()) => {
                info!("Session storage cleared at {}", session_dir.display());
                Ok(())
            }
            Err(reason) if reason.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(reason) => Err(reason),
        }
    }

    fn open_in_browser(&self, url: &str) -> io::Result<()> {
        launch_detached(url)
    }

    fn apply_update(&self, artifacts: &[PathBuf]) -> io::Result<()> {
        let installer = artifacts.first().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "no staged artifacts to install")
        })?;
        info!("Handing {} to the platform installer", installer.display());
        launch_detached(&installer.to_string_lossy())?;
        // The installer owns the rest of the update; this process makes way
        // for the restarted one.
        std::process::exit(0);
    }
}

/// Open `target` (URL or file path) with the platform's default handler,
/// without waiting on the spawned process.
fn launch_detached(target: &str) -> io::Result<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", "", target]);
        command
    } else if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(target);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(target);
        command
    };
    command.spawn().map(|_| ())
}

/// Recording [`HostIntegration`] double: every call is written down and
/// succeeds, and `apply_update` returns instead of restarting. Used by the
/// updater and bridge tests; harmless to ship.
pub struct RecordingHost {
    pub theme_hints: Mutex<Vec<ThemeSource>>,
    pub session_clears: Mutex<u32>,
    pub opened_urls: Mutex<Vec<String>>,
    pub applied_updates: Mutex<Vec<Vec<PathBuf>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            theme_hints: Mutex::new(Vec::new()),
            session_clears: Mutex::new(0),
            opened_urls: Mutex::new(Vec::new()),
            applied_updates: Mutex::new(Vec::new()),
        }
    }
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostIntegration for RecordingHost {
    fn set_theme_hint(&self, theme: ThemeSource) -> io::Result<()> {
        self.theme_hints.lock().expect("poisoned").push(theme);
        Ok(())
    }

    fn clear_session_storage(&self) -> io::Result<()> {
        *self.session_clears.lock().expect("poisoned") += 1;
        Ok(())
    }

    fn open_in_browser(&self, url: &str) -> io::Result<()> {
        self.opened_urls
            .lock()
            .expect("poisoned")
            .push(url.to_string());
        Ok(())
    }

    fn apply_update(&self, artifacts: &[PathBuf]) -> io::Result<()> {
        self.applied_updates
            .lock()
            .expect("poisoned")
            .push(artifacts.to_vec());
        Ok(())
    }
}
