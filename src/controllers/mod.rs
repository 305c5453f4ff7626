//! Control loops linked into the binary.
//!
//! Each module exposes `register(&mut RegistryBuilder)`. The order of the
//! calls in [`register_all`] is the order the controllers attach in.

pub mod kind_log;

use crate::registry::RegistryBuilder;

/// Register every controller this binary ships with.
pub fn register_all(registry: &mut RegistryBuilder) {
    kind_log::register(registry);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all() {
        let mut builder = RegistryBuilder::new();
        register_all(&mut builder);

        let registry = builder.freeze();
        assert_eq!(registry.names(), vec![kind_log::NAME]);
    }
}
