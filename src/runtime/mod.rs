//! Runtime the controllers attach to.

pub mod manager;

pub use manager::{Manager, Shutdown, Worker};
