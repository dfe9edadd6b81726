//! Node type registry for creating nodes by type identifier.
//!
//! The registry provides a central catalog of available node types,
//! enabling graph descriptions to instantiate nodes by their type name.
//! Several names may map to the same implementation (aliases); only the
//! debug name baked into the created instance differs.

use std::collections::HashMap;
use std::sync::OnceLock;

use uuid::Uuid;

use super::identifier::Identifier;
use super::node_processor::{NodeCategory, NodeInstance, NodeProcessor};

/// Factory function type for creating node processors.
///
/// Returns a boxed trait object for type erasure.
pub type NodeFactory = fn() -> Box<dyn NodeProcessor>;

/// Static information about a registered node type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeTypeInfo {
    /// Hash of `name`, the key used for lookup.
    pub id: Identifier,
    /// Friendly type name, also the debug name of created instances.
    pub name: &'static str,
    /// The category this node belongs to.
    pub category: NodeCategory,
    /// True if this name was registered as an alias of another type.
    pub is_alias: bool,
}

#[derive(Clone, Copy)]
struct RegistryEntry {
    info: NodeTypeInfo,
    factory: NodeFactory,
}

/// Central registry of available node types.
///
/// # Example
///
/// ```ignore
/// let mut registry = NodeRegistry::new();
/// registry.register::<Add<f32>>("Add (Float)", NodeCategory::Math);
/// registry.register_alias::<Add<f32>>("Add (Audio)", NodeCategory::Math);
///
/// // Later, create instances by type id
/// if let Some(node) = registry.create(Identifier::new("Add (Audio)"), Uuid::new_v4()) {
///     assert_eq!(node.name(), "Add (Audio)");
/// }
/// ```
pub struct NodeRegistry {
    /// Map of type id to factory function.
    factories: HashMap<Identifier, RegistryEntry>,
    /// Cached type information in registration order, for listing.
    infos: Vec<NodeTypeInfo>,
}

impl NodeRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            infos: Vec::new(),
        }
    }

    /// Creates a registry holding every built-in node type.
    pub fn with_builtin_nodes() -> Self {
        let mut registry = Self::new();
        crate::nodes::register_builtin_nodes(&mut registry);
        registry
    }

    /// Returns the process-wide registry of built-in nodes.
    ///
    /// Built exactly once on first access and read-only afterwards, so
    /// concurrent lookups need no locking.
    pub fn global() -> &'static NodeRegistry {
        static GLOBAL: OnceLock<NodeRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let registry = Self::with_builtin_nodes();
            tracing::debug!("node registry initialised with {} types", registry.len());
            registry
        })
    }

    /// Registers a node type under a friendly name.
    ///
    /// # Panics
    ///
    /// Panics if the name is already registered. Registration happens
    /// once at startup, so a duplicate is a programming error.
    pub fn register<N: NodeProcessor + Default>(&mut self, name: &'static str, category: NodeCategory) {
        self.insert(name, category, false, create_node::<N>);
    }

    /// Registers an additional name for a node type.
    ///
    /// # Panics
    ///
    /// Panics if the name is already registered.
    pub fn register_alias<N: NodeProcessor + Default>(
        &mut self,
        alias: &'static str,
        category: NodeCategory,
    ) {
        self.insert(alias, category, true, create_node::<N>);
    }

    fn insert(
        &mut self,
        name: &'static str,
        category: NodeCategory,
        is_alias: bool,
        factory: NodeFactory,
    ) {
        let id = Identifier::new(name);
        if self.factories.contains_key(&id) {
            panic!("Node type '{}' is already registered", name);
        }

        let info = NodeTypeInfo {
            id,
            name,
            category,
            is_alias,
        };
        self.factories.insert(id, RegistryEntry { info, factory });
        self.infos.push(info);
    }

    /// Creates a new node of the given type.
    ///
    /// Returns `None` and logs an error if the type is not registered.
    /// Graph assets may reference stale or renamed types, so this never
    /// panics.
    pub fn create(&self, type_id: Identifier, instance_id: Uuid) -> Option<NodeInstance> {
        match self.factories.get(&type_id) {
            Some(entry) => Some(NodeInstance::new(
                instance_id,
                entry.info.name,
                (entry.factory)(),
            )),
            None => {
                tracing::error!("Node with type ID {} is not in the registry", type_id);
                None
            }
        }
    }

    /// Creates a new node from a type name known only at runtime.
    pub fn create_by_name(&self, name: &str, instance_id: Uuid) -> Option<NodeInstance> {
        let type_id = Identifier::from_value(super::identifier::fnv1a(name.as_bytes()));
        if !self.contains(type_id) {
            tracing::error!("Node with type ID {} is not in the registry", name);
            return None;
        }
        self.create(type_id, instance_id)
    }

    /// Returns all registered node types, aliases included.
    pub fn list_nodes(&self) -> &[NodeTypeInfo] {
        &self.infos
    }

    /// Returns information about a registered type.
    pub fn info(&self, type_id: Identifier) -> Option<&NodeTypeInfo> {
        self.factories.get(&type_id).map(|entry| &entry.info)
    }

    /// Returns the number of registered names.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if no node types are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Checks if a node type with the given id is registered.
    pub fn contains(&self, type_id: Identifier) -> bool {
        self.factories.contains_key(&type_id)
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Node creation through the process-wide registry.
pub struct Factory;

impl Factory {
    /// Creates a built-in node, see [`NodeRegistry::create`].
    pub fn create(type_id: Identifier, instance_id: Uuid) -> Option<NodeInstance> {
        NodeRegistry::global().create(type_id, instance_id)
    }

    /// Checks if a built-in node type exists.
    pub fn contains(type_id: Identifier) -> bool {
        NodeRegistry::global().contains(type_id)
    }
}

fn create_node<N: NodeProcessor + Default>() -> Box<dyn NodeProcessor> {
    Box::new(N::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{EndpointDefinition, NodeIo, ProcessContext, Value, ValueType};

    /// A simple test node doubling its input.
    struct TestDoubler {
        endpoints: Vec<EndpointDefinition>,
    }

    impl Default for TestDoubler {
        fn default() -> Self {
            Self {
                endpoints: vec![
                    EndpointDefinition::input("In", ValueType::Float),
                    EndpointDefinition::output("Out", ValueType::Float),
                ],
            }
        }
    }

    impl NodeProcessor for TestDoubler {
        fn endpoints(&self) -> &[EndpointDefinition] {
            &self.endpoints
        }

        fn process(&mut self, io: &mut NodeIo, _context: &ProcessContext) {
            let value = io.input_f32(0) * 2.0;
            io.set_output(0, value);
        }
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = NodeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = NodeRegistry::new();
        registry.register::<TestDoubler>("Doubler", NodeCategory::Math);

        let node = registry
            .create(Identifier::new("Doubler"), Uuid::new_v4())
            .unwrap();
        assert_eq!(node.name(), "Doubler");
        assert!(registry.contains(Identifier::new("Doubler")));
    }

    #[test]
    fn test_create_unknown_returns_none() {
        let registry = NodeRegistry::new();
        assert!(registry.create(Identifier::new("Nope"), Uuid::new_v4()).is_none());
        assert!(registry.create(Identifier::from_value(7), Uuid::new_v4()).is_none());
        assert!(registry.create_by_name("Nope", Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_alias_changes_only_debug_name() {
        let mut registry = NodeRegistry::new();
        registry.register::<TestDoubler>("Doubler", NodeCategory::Math);
        registry.register_alias::<TestDoubler>("Twice", NodeCategory::Math);

        let ctx = ProcessContext::default();
        let mut outputs = Vec::new();
        for name in ["Doubler", "Twice"] {
            let mut node = registry.create_by_name(name, Uuid::new_v4()).unwrap();
            assert_eq!(node.name(), name);
            node.set_input_value(Identifier::new("In"), Value::Float(4.0));
            node.tick(&ctx);
            outputs.push(node.output_value(Identifier::new("Out")).cloned());
        }
        assert_eq!(outputs[0], outputs[1]);
        assert!(registry.info(Identifier::new("Twice")).unwrap().is_alias);
    }

    #[test]
    fn test_instance_id_is_preserved() {
        let mut registry = NodeRegistry::new();
        registry.register::<TestDoubler>("Doubler", NodeCategory::Math);
        let id = Uuid::new_v4();
        let node = registry.create(Identifier::new("Doubler"), id).unwrap();
        assert_eq!(node.id(), id);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_registration_panics() {
        let mut registry = NodeRegistry::new();
        registry.register::<TestDoubler>("Doubler", NodeCategory::Math);
        registry.register::<TestDoubler>("Doubler", NodeCategory::Math);
    }

    #[test]
    fn test_list_nodes_in_registration_order() {
        let mut registry = NodeRegistry::new();
        registry.register::<TestDoubler>("B", NodeCategory::Math);
        registry.register_alias::<TestDoubler>("A", NodeCategory::Math);
        let names: Vec<_> = registry.list_nodes().iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_global_registry_is_shared() {
        let a = NodeRegistry::global() as *const NodeRegistry;
        let b = NodeRegistry::global() as *const NodeRegistry;
        assert_eq!(a, b);
        assert!(Factory::contains(Identifier::new("Add (Float)")));
        assert!(!Factory::contains(Identifier::new("Not A Node")));
    }
}
