//! Ordered registry of controller attachments.
//!
//! Registration happens in two phases. During the build phase every
//! control-loop module appends its attachment to a [`RegistryBuilder`].
//! [`RegistryBuilder::freeze`] then turns it into an immutable [`Registry`]
//! that the aggregator walks. A frozen registry has no way to append, so
//! nothing can be registered once attachment has begun.

pub mod aggregator;

pub use aggregator::attach;

use crate::discovery::DiscoveryChannel;
use crate::error::AttachError;
use crate::models::NamespaceScope;
use crate::runtime::Manager;
use std::fmt;

/// Wires one control loop into the shared manager.
pub trait AddToManager: Send + Sync {
    /// Attach to `manager`. Workers added here start when the manager runs.
    fn add_to_manager(
        &self,
        manager: &Manager,
        discovery: &DiscoveryChannel,
        scope: &NamespaceScope,
    ) -> Result<(), AttachError>;
}

impl<F> AddToManager for F
where
    F: Fn(&Manager, &DiscoveryChannel, &NamespaceScope) -> Result<(), AttachError> + Send + Sync,
{
    fn add_to_manager(
        &self,
        manager: &Manager,
        discovery: &DiscoveryChannel,
        scope: &NamespaceScope,
    ) -> Result<(), AttachError> {
        self(manager, discovery, scope)
    }
}

/// A registered attachment and the label it is logged under.
pub struct RegistrationEntry {
    name: String,
    entry: Box<dyn AddToManager>,
}

impl RegistrationEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_to_manager(
        &self,
        manager: &Manager,
        discovery: &DiscoveryChannel,
        scope: &NamespaceScope,
    ) -> Result<(), AttachError> {
        self.entry.add_to_manager(manager, discovery, scope)
    }
}

impl fmt::Debug for RegistrationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Build-phase registry. Entries keep the order they were registered in.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<RegistrationEntry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attachment labelled `controller-<index>`.
    ///
    /// The entry is not invoked. Duplicates are accepted and will attach twice.
    pub fn register(&mut self, entry: impl AddToManager + 'static) -> &mut Self {
        let name = format!("controller-{}", self.entries.len());
        self.register_named(name, entry)
    }

    /// Append an attachment under an explicit label.
    pub fn register_named(
        &mut self,
        name: impl Into<String>,
        entry: impl AddToManager + 'static,
    ) -> &mut Self {
        self.entries.push(RegistrationEntry {
            name: name.into(),
            entry: Box::new(entry),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// End the build phase.
    pub fn freeze(self) -> Registry {
        Registry {
            entries: self.entries,
        }
    }
}

/// Frozen registry read by the aggregator.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<RegistrationEntry>,
}

impl Registry {
    /// The registered entries in registration order.
    pub fn snapshot(&self) -> &[RegistrationEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
