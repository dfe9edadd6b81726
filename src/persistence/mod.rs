//! Persistence module
//!
//! Graph description save/load using serde and JSON.

pub mod description;

pub use description::{
    ConnectionDescription, DescriptionError, EndpointAddress, GraphDescription, GraphInput,
    NodeDescription, ParameterValue, DESCRIPTION_VERSION,
};
