//! Attaches every registered controller to the manager.
//!
//! Entries run one after another in registration order. The first failure
//! stops the pass and is returned unchanged. Workers that earlier entries
//! already added to the manager stay there: a failed attach leaves the
//! manager partially populated, and the caller is expected to treat that
//! as fatal and never run it.

use super::Registry;
use crate::discovery::DiscoveryChannel;
use crate::error::AttachError;
use crate::models::NamespaceScope;
use crate::runtime::Manager;
use tracing::{debug, info, warn};

/// Invoke every entry of `registry` with the same manager, channel and scope.
///
/// Calling this twice attaches every entry again from the start.
pub fn attach(
    registry: &Registry,
    manager: &Manager,
    discovery: &DiscoveryChannel,
    scope: &NamespaceScope,
) -> Result<(), AttachError> {
    info!(
        "Attaching {} controllers (namespace scope: {})",
        registry.len(),
        scope
    );

    for (index, entry) in registry.snapshot().iter().enumerate() {
        debug!(index, controller = entry.name(), "attaching controller");

        if let Err(e) = entry.add_to_manager(manager, discovery, scope) {
            warn!(
                index,
                controller = entry.name(),
                skipped = registry.len() - index - 1,
                "controller failed to attach: {}",
                e
            );
            return Err(e);
        }
    }

    debug!("All controllers attached");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryBuilder;
    use anyhow::anyhow;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// One recorded invocation: label plus the addresses and scope it saw.
    type Call = (String, usize, usize, NamespaceScope);

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl Recorder {
        fn entry(
            &self,
            label: &str,
            fail: bool,
        ) -> impl Fn(&Manager, &DiscoveryChannel, &NamespaceScope) -> Result<(), AttachError> {
            let calls = self.calls.clone();
            let label = label.to_string();
            move |manager: &Manager, discovery: &DiscoveryChannel, scope: &NamespaceScope| {
                calls.lock().push((
                    label.clone(),
                    manager as *const Manager as usize,
                    discovery as *const DiscoveryChannel as usize,
                    scope.clone(),
                ));
                if fail {
                    Err(AttachError::WatchSetup {
                        kind: "apps/v1/Deployment".to_string(),
                        reason: format!("{} failed", label),
                    })
                } else {
                    Ok(())
                }
            }
        }

        fn labels(&self) -> Vec<String> {
            self.calls.lock().iter().map(|c| c.0.clone()).collect()
        }
    }

    fn build(recorder: &Recorder, layout: &[(&str, bool)]) -> Registry {
        let mut builder = RegistryBuilder::new();
        for (label, fail) in layout {
            builder.register_named(*label, recorder.entry(label, *fail));
        }
        builder.freeze()
    }

    #[test]
    fn test_all_succeed_in_order() {
        let recorder = Recorder::default();
        let registry = build(&recorder, &[("ok1", false), ("ok2", false), ("ok3", false)]);
        let manager = Manager::new();
        let discovery = DiscoveryChannel::default();
        let scope = NamespaceScope::from("observability");

        attach(&registry, &manager, &discovery, &scope).unwrap();

        assert_eq!(recorder.labels(), vec!["ok1", "ok2", "ok3"]);

        let manager_addr = &manager as *const Manager as usize;
        let discovery_addr = &discovery as *const DiscoveryChannel as usize;
        for (_, m, d, s) in recorder.calls.lock().iter() {
            assert_eq!(*m, manager_addr);
            assert_eq!(*d, discovery_addr);
            assert_eq!(*s, scope);
        }
    }

    #[test]
    fn test_stops_at_first_failure() {
        let recorder = Recorder::default();
        let registry = build(&recorder, &[("ok1", false), ("fail2", true), ("ok3", false)]);

        let err = attach(
            &registry,
            &Manager::new(),
            &DiscoveryChannel::default(),
            &NamespaceScope::ALL,
        )
        .unwrap_err();

        match err {
            AttachError::WatchSetup { reason, .. } => assert_eq!(reason, "fail2 failed"),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(recorder.labels(), vec!["ok1", "fail2"]);
    }

    #[test]
    fn test_empty_registry_attaches_nothing() {
        let registry = RegistryBuilder::new().freeze();
        let manager = Manager::new();

        attach(
            &registry,
            &manager,
            &DiscoveryChannel::default(),
            &NamespaceScope::ALL,
        )
        .unwrap();

        assert!(manager.worker_names().is_empty());
    }

    #[test]
    fn test_single_failing_entry() {
        let recorder = Recorder::default();
        let registry = build(&recorder, &[("fail1", true)]);
        let manager = Manager::new();

        let err = attach(
            &registry,
            &manager,
            &DiscoveryChannel::default(),
            &NamespaceScope::ALL,
        )
        .unwrap_err();

        assert!(err.to_string().contains("fail1 failed"));
        assert_eq!(recorder.labels(), vec!["fail1"]);
        assert!(manager.worker_names().is_empty());
    }

    #[test]
    fn test_failure_leaves_earlier_workers_attached() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_named(
                "watcher",
                |m: &Manager, _: &DiscoveryChannel, _: &NamespaceScope| -> Result<(), AttachError> {
                    m.add_worker("watcher", |_| async { Ok(()) })?;
                    Ok(())
                },
            )
            .register_named(
                "broken",
                |_: &Manager, _: &DiscoveryChannel, _: &NamespaceScope| -> Result<(), AttachError> {
                    Err(AttachError::Other(anyhow!("cluster unreachable")))
                },
            );
        let registry = builder.freeze();
        let manager = Manager::new();

        let err = attach(
            &registry,
            &manager,
            &DiscoveryChannel::default(),
            &NamespaceScope::ALL,
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "cluster unreachable");
        assert_eq!(manager.worker_names(), vec!["watcher"]);
    }

    #[test]
    fn test_second_attach_reinvokes_everything() {
        let recorder = Recorder::default();
        let registry = build(&recorder, &[("a", false), ("b", false)]);
        let manager = Manager::new();
        let discovery = DiscoveryChannel::default();

        attach(&registry, &manager, &discovery, &NamespaceScope::ALL).unwrap();
        attach(&registry, &manager, &discovery, &NamespaceScope::ALL).unwrap();

        assert_eq!(recorder.labels(), vec!["a", "b", "a", "b"]);
    }

    #[test]
    fn test_failing_position_sweep() {
        for n in 1..=5 {
            for k in 1..=n {
                let recorder = Recorder::default();
                let labels: Vec<String> = (1..=n).map(|i| format!("e{}", i)).collect();
                let layout: Vec<(&str, bool)> = labels
                    .iter()
                    .enumerate()
                    .map(|(i, l)| (l.as_str(), i + 1 == k))
                    .collect();
                let registry = build(&recorder, &layout);

                let result = attach(
                    &registry,
                    &Manager::new(),
                    &DiscoveryChannel::default(),
                    &NamespaceScope::ALL,
                );

                assert!(result.is_err());
                assert_eq!(recorder.labels(), labels[..k].to_vec());
            }
        }
    }
}
