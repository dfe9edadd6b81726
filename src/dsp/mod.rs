//! DSP module
//!
//! Core node abstractions: identifiers, values, endpoints, the
//! NodeProcessor trait and the node type registry.

pub mod context;
pub mod endpoint;
pub mod fast_random;
pub mod identifier;
pub mod node_processor;
pub mod parameter;
pub mod registry;
pub mod smoothed_value;
pub mod value;

pub use context::ProcessContext;
pub use endpoint::{
    EndpointDefinition, EndpointDirection, EndpointKind, EventFlag, InputEvent, OutputEvent,
    ValueEndpoint,
};
pub use fast_random::{FastRandom, TIME_SEED};
pub use identifier::{fnv1a, Identifier};
pub use node_processor::{EndpointLocation, NodeCategory, NodeInstance, NodeIo, NodeProcessor};
pub use parameter::AtomicParam;
pub use registry::{Factory, NodeFactory, NodeRegistry, NodeTypeInfo};
pub use smoothed_value::SmoothedValue;
pub use value::{Value, ValueType};
