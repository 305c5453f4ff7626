//! controller-attach - ordered attachment of control loops to a shared runtime.
//!
//! Control-loop modules register an attachment with a [`RegistryBuilder`].
//! Once every module has registered, the builder is frozen and
//! [`registry::attach`] wires the controllers, in registration order, into
//! one [`Manager`] with a shared [`DiscoveryChannel`] and
//! [`NamespaceScope`]. The first failing controller aborts the pass.

pub mod cli;
pub mod config;
pub mod controllers;
pub mod discovery;
pub mod error;
pub mod models;
pub mod registry;
pub mod runtime;

pub use discovery::{DiscoveryChannel, DiscoverySubscription};
pub use error::{AttachError, ManagerError};
pub use models::{NamespaceScope, ResourceKind};
pub use registry::{attach, AddToManager, Registry, RegistryBuilder};
pub use runtime::Manager;
