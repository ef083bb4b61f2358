//! Hand-declared resource kinds registered by default

mod cluster_issuer;
mod route_option;

pub use cluster_issuer::cluster_issuer;
pub use route_option::route_option;

use crate::resource::ResourceSchema;

/// Every built-in kind, in registration order
pub fn builtin() -> Vec<ResourceSchema> {
    vec![route_option(), cluster_issuer()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompiledSchema;

    #[test]
    fn test_builtin_kinds_are_well_formed() {
        for schema in builtin() {
            let kind = schema.kind.clone();
            schema
                .check()
                .unwrap_or_else(|e| panic!("{kind} has defects: {e}"));
        }
    }

    #[test]
    fn test_builtin_compilation_is_deterministic() {
        for schema in builtin() {
            let first = CompiledSchema::compile(schema.clone()).unwrap();
            let second = CompiledSchema::compile(schema).unwrap();
            assert_eq!(first, second);
        }
    }
}
