//! Logs every resource kind announced on the discovery channel.

use crate::discovery::{DiscoveryChannel, DiscoverySubscription};
use crate::error::AttachError;
use crate::models::{validate_namespace, NamespaceScope};
use crate::registry::RegistryBuilder;
use crate::runtime::{Manager, Shutdown};
use tracing::{debug, info};

pub const NAME: &str = "kind-log";

pub fn register(registry: &mut RegistryBuilder) {
    registry.register_named(NAME, add_to_manager);
}

/// Subscribes at attach time so kinds announced before the manager runs
/// are not lost.
fn add_to_manager(
    manager: &Manager,
    discovery: &DiscoveryChannel,
    scope: &NamespaceScope,
) -> Result<(), AttachError> {
    if let Some(ns) = scope.namespace() {
        validate_namespace(ns).map_err(|reason| AttachError::InvalidScope {
            scope: ns.to_string(),
            reason,
        })?;
    }

    let subscription = discovery.subscribe();
    let scope = scope.clone();
    manager.add_worker(NAME, move |shutdown| async move {
        let seen = watch(subscription, scope, shutdown).await;
        debug!("Stopped after {} resource kinds", seen);
        Ok(())
    })?;
    Ok(())
}

/// Log kinds until shutdown or until the channel closes. Returns how many
/// kinds were seen.
async fn watch(
    mut subscription: DiscoverySubscription,
    scope: NamespaceScope,
    mut shutdown: Shutdown,
) -> usize {
    debug!("Watching discovery channel for namespace scope {}", scope);
    let mut seen = 0;

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            next = subscription.next() => {
                let Some(kind) = next else {
                    debug!("Discovery channel closed");
                    break;
                };
                seen += 1;
                info!("Discovered resource kind {} (scope: {})", kind, scope);
            }
        }
    }

    seen
}
