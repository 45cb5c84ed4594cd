//! Name scope used by both compiler passes.
//!
//! A scope maps parameter names to the schema of the value they stand for.
//! Extension copies the map rather than mutating it, so a parameter
//! introduced inside one lambda body is invisible to sibling branches —
//! standard lexical scoping with no save/restore bookkeeping.

use crate::schema::SchemaNode;
use std::collections::HashMap;

/// Reserved name under which the data source itself is bound, so that
/// `DataSourceReference` nodes and relationship fields reachable from the
/// root can be resolved without re-deriving the whole tree.
pub const DATA_SOURCE_NAME: &str = "$dataSource";

#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: HashMap<String, SchemaNode>,
}

impl Scope {
    pub fn new() -> Scope {
        Scope::default()
    }

    /// A scope whose reserved self-reference is bound to `schema`
    /// (conventionally a `Collection` over the root entity).
    pub fn with_data_source(schema: SchemaNode) -> Scope {
        Scope::new().extended(DATA_SOURCE_NAME, schema)
    }

    /// A new scope with `name` bound to `schema`; `self` is unchanged.
    pub fn extended(&self, name: &str, schema: SchemaNode) -> Scope {
        let mut bindings = self.bindings.clone();
        bindings.insert(name.to_string(), schema);
        Scope { bindings }
    }

    pub fn lookup(&self, name: &str) -> Option<&SchemaNode> {
        self.bindings.get(name)
    }

    pub fn data_source(&self) -> Option<&SchemaNode> {
        self.lookup(DATA_SOURCE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_does_not_leak_into_siblings() {
        let root = Scope::with_data_source(SchemaNode::collection(SchemaNode::integer()));
        let left = root.extended("a", SchemaNode::integer());
        let right = root.extended("b", SchemaNode::text(None));

        assert!(left.lookup("a").is_some());
        assert!(left.lookup("b").is_none());
        assert!(right.lookup("b").is_some());
        assert!(right.lookup("a").is_none());
        assert!(root.lookup("a").is_none());
        assert!(left.data_source().is_some());
    }

    #[test]
    fn test_inner_binding_shadows_outer() {
        let outer = Scope::new().extended("e", SchemaNode::integer());
        let inner = outer.extended("e", SchemaNode::text(None));
        assert_eq!(inner.lookup("e"), Some(&SchemaNode::text(None)));
        assert_eq!(outer.lookup("e"), Some(&SchemaNode::integer()));
    }
}
