//! Boundary node standing for the graph's own inputs or outputs.
//!
//! A graph owns two of these. Graph inputs are the value and event outputs
//! of the input boundary, graph outputs the inputs of the output boundary.
//! Endpoints are added at runtime as the graph declares them, so the
//! processor itself declares none and does nothing when processed.

use crate::dsp::{EndpointDefinition, NodeIo, NodeProcessor, ProcessContext};

#[derive(Debug, Default)]
pub struct GraphBoundary;

impl NodeProcessor for GraphBoundary {
    fn endpoints(&self) -> &[EndpointDefinition] {
        &[]
    }

    fn process(&mut self, _io: &mut NodeIo, _context: &ProcessContext) {}
}
