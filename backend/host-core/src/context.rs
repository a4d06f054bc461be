//! Process-wide wiring for the privileged side.

use crate::bridge::HostIntegration;
use crate::environment::Environment;
use crate::protocol::AppProperties;
use crate::store::ConfigStore;
use crate::updater::Updater;

use std::sync::Arc;

/// Everything the bridge handlers work against, assembled once at startup
/// and shared by reference afterwards.
///
/// Ownership is single-writer throughout: store mutations go through
/// `store`, update status through `updater`, OS effects through `host`.
/// Nothing here is a global; tests assemble their own contexts.
pub struct HostContext {
    pub environment: Environment,
    pub properties: AppProperties,
    pub store: ConfigStore,
    pub updater: Updater,
    pub host: Arc<dyn HostIntegration>,
}

impl HostContext {
    pub fn new(
        environment: Environment,
        properties: AppProperties,
        store: ConfigStore,
        updater: Updater,
        host: Arc<dyn HostIntegration>,
    ) -> Self {
        Self {
            environment,
            properties,
            store,
            updater,
            host,
        }
    }
}
