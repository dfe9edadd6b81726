//! Sound Graph Library
//!
//! A real-time sound graph engine: typed node endpoints, a registry of
//! built-in node types, a dependency-ordered graph evaluator and a cpal
//! voice to play it.

pub mod config;
pub mod dsp;
pub mod engine;
pub mod nodes;
pub mod persistence;

pub use config::GraphConfig;
pub use dsp::{Identifier, NodeRegistry, Value};
pub use engine::{GraphError, SoundGraph};
pub use persistence::GraphDescription;
