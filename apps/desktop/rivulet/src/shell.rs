//! Shell bootstrap.
//!
//! Assembles the process-wide [`HostContext`] (store, updater, host
//! integration), starts the bridge server, and registers the canonical
//! feature modules. Everything is built here once and shared by reference;
//! nothing in the process is a global.

use crate::bridge_access::BridgeAccess;
use crate::error::ShellError;

use host_core::bridge::{BridgeServerHandle, HostIntegration, NativeHost, start_bridge_server};
use host_core::context::HostContext;
use host_core::deeplink::parse_intercepted_link;
use host_core::environment::Environment;
use host_core::modstate::{LibraryState, ModuleState, ModuleStates, SidebarState, ThemeState};
use host_core::protocol::AppProperties;
use host_core::store::ConfigStore;
use host_core::updater::Updater;

use std::path::Path;
use std::sync::Arc;

use log::{info, warn};
use uuid::Uuid;

/// Name of the persisted store file (without extension).
const STORE_NAME: &str = "rivulet";

/// The canonical feature modules shipped with the shell, each holding its
/// live slice of the store. Policies are fixed in `host-core::modstate`.
pub struct FeatureModules {
    pub sidebar: ModuleState<SidebarState>,
    pub theme: ModuleState<ThemeState>,
    pub library: ModuleState<LibraryState>,
}

/// A fully wired shell: the context behind the bridge, the running bridge
/// server, and the access pair for the presentation loader.
pub struct Shell {
    pub context: Arc<HostContext>,
    pub bridge: BridgeServerHandle,
    pub access: BridgeAccess,
    pub modules: FeatureModules,
}

/// Build the context, start the bridge on `bridge_port`, and register the
/// feature modules.
pub async fn bootstrap(data_dir: &Path, bridge_port: u16) -> Result<Shell, ShellError> {
    let environment = Environment::load().map_err(ShellError::core)?;

    let store = ConfigStore::open(data_dir, STORE_NAME).await;
    info!("Config store at {}", store.path().display());

    let host: Arc<dyn HostIntegration> = Arc::new(NativeHost::new(data_dir));
    let properties = AppProperties::current(env!("CARGO_PKG_VERSION"), &environment.app_protocol);
    let updater = Updater::new(
        environment.update_feed_url.clone(),
        env!("CARGO_PKG_VERSION"),
        data_dir.join("updates"),
        Arc::clone(&host),
    )
    .map_err(ShellError::core)?;

    let context = Arc::new(HostContext::new(
        environment,
        properties,
        store,
        updater,
        host,
    ));

    let auth_token = Uuid::new_v4().to_string();
    let bridge = start_bridge_server(bridge_port, Some(auth_token), Arc::clone(&context))
        .await
        .map_err(ShellError::core)?;
    let access = BridgeAccess::from_handle(&bridge);

    let modules = register_feature_modules(&context).await?;

    Ok(Shell {
        context,
        bridge,
        access,
        modules,
    })
}

async fn register_feature_modules(context: &HostContext) -> Result<FeatureModules, ShellError> {
    let states = ModuleStates::new(context.store.clone());
    Ok(FeatureModules {
        sidebar: states.sidebar().await.map_err(ShellError::core)?,
        theme: states.theme().await.map_err(ShellError::core)?,
        library: states.library().await.map_err(ShellError::core)?,
    })
}

/// Publish custom-protocol URLs handed over on the command line.
///
/// The OS delivers a registered deep link to an already-running instance by
/// launching the binary again with the URL in argv. Arguments that are not
/// URLs are ignored quietly; URLs on a foreign scheme are logged and
/// dropped, never published.
pub fn publish_argv_links(shell: &Shell, arguments: impl Iterator<Item = String>) {
    for argument in arguments.filter(|argument| argument.contains("://")) {
        match parse_intercepted_link(&argument, &shell.context.environment.app_protocol) {
            Ok(link) => {
                info!("Publishing intercepted link: {}", link.method);
                shell.bridge.publish_intercepted_link(link);
            }
            Err(reason) => warn!("Ignoring argv url {argument:?}: {reason}"),
        }
    }
}
