//! Connection validation for the sound graph.
//!
//! Connections are checked when they are added, so a graph that reaches
//! `prepare()` only contains well-typed edges. Acyclicity is checked by
//! `prepare()` itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dsp::{EndpointDirection, EndpointKind, Identifier, ValueType};

/// Whether a connection carries a value stream or a trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Value,
    Event,
}

impl ConnectionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionKind::Value => "value",
            ConnectionKind::Event => "event",
        }
    }
}

/// Errors raised while building or preparing a graph.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("no node with id {0} in the graph")]
    UnknownNode(Uuid),

    #[error("a node with id {0} is already in the graph")]
    DuplicateNode(Uuid),

    #[error("node '{node}' has no {} endpoint '{endpoint}'", .direction.name())]
    UnknownEndpoint {
        node: String,
        endpoint: Identifier,
        direction: EndpointDirection,
    },

    #[error("the graph has no endpoint '{0}'")]
    UnknownGraphEndpoint(Identifier),

    #[error("the graph already declares endpoint '{0}'")]
    DuplicateGraphEndpoint(Identifier),

    #[error("cannot make a {} connection from '{from}' to '{to}'", .kind.name())]
    KindMismatch {
        kind: ConnectionKind,
        from: Identifier,
        to: Identifier,
    },

    #[error("cannot connect {} to {}", .from.name(), .to.name())]
    IncompatibleTypes { from: ValueType, to: ValueType },

    #[error("input '{endpoint}' of node '{node}' is already connected")]
    InputAlreadyConnected { node: String, endpoint: Identifier },

    #[error("connection already exists")]
    DuplicateConnection,

    #[error("value connections form a cycle through {nodes:?}")]
    CycleDetected { nodes: Vec<String> },

    #[error("the graph has not been prepared")]
    NotPrepared,
}

/// Checks that both endpoints suit a connection of the given kind.
///
/// # Rules
///
/// - Event connections join an output event to an input event.
/// - Value connections join value endpoints whose types satisfy
///   [`ValueType::can_connect_to`]: identical types, float and int in
///   either direction, bool into a number. Arrays only connect to the same
///   array type.
pub fn validate_connection(
    kind: ConnectionKind,
    from: (Identifier, EndpointKind),
    to: (Identifier, EndpointKind),
) -> Result<(), GraphError> {
    let mismatch = || GraphError::KindMismatch {
        kind,
        from: from.0,
        to: to.0,
    };

    match (kind, from.1, to.1) {
        (ConnectionKind::Event, EndpointKind::Event, EndpointKind::Event) => Ok(()),
        (ConnectionKind::Value, EndpointKind::Value(from_type), EndpointKind::Value(to_type)) => {
            if from_type.can_connect_to(to_type) {
                Ok(())
            } else {
                Err(GraphError::IncompatibleTypes {
                    from: from_type,
                    to: to_type,
                })
            }
        }
        _ => Err(mismatch()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUT: Identifier = Identifier::new("Out");
    const IN: Identifier = Identifier::new("In");

    fn value(ty: ValueType) -> EndpointKind {
        EndpointKind::Value(ty)
    }

    #[test]
    fn test_numeric_connections() {
        for (from, to) in [
            (ValueType::Float, ValueType::Float),
            (ValueType::Float, ValueType::Int),
            (ValueType::Int, ValueType::Float),
            (ValueType::Bool, ValueType::Int),
        ] {
            assert!(validate_connection(ConnectionKind::Value, (OUT, value(from)), (IN, value(to))).is_ok());
        }
    }

    #[test]
    fn test_array_to_scalar_rejected() {
        let result = validate_connection(
            ConnectionKind::Value,
            (OUT, value(ValueType::FloatArray)),
            (IN, value(ValueType::Float)),
        );
        assert_eq!(
            result,
            Err(GraphError::IncompatibleTypes {
                from: ValueType::FloatArray,
                to: ValueType::Float,
            })
        );
        assert!(validate_connection(
            ConnectionKind::Value,
            (OUT, value(ValueType::IntArray)),
            (IN, value(ValueType::FloatArray)),
        )
        .is_err());
    }

    #[test]
    fn test_event_and_value_do_not_mix() {
        let result = validate_connection(ConnectionKind::Event, (OUT, EndpointKind::Event), (IN, value(ValueType::Float)));
        assert!(matches!(result, Err(GraphError::KindMismatch { .. })));

        let result = validate_connection(ConnectionKind::Value, (OUT, EndpointKind::Event), (IN, EndpointKind::Event));
        assert!(matches!(result, Err(GraphError::KindMismatch { .. })));

        assert!(validate_connection(ConnectionKind::Event, (OUT, EndpointKind::Event), (IN, EndpointKind::Event)).is_ok());
    }

    #[test]
    fn test_error_messages_name_endpoints() {
        let err = GraphError::UnknownEndpoint {
            node: "Add (Float)".into(),
            endpoint: Identifier::new("Value3"),
            direction: EndpointDirection::Input,
        };
        let message = err.to_string();
        assert!(message.contains("Add (Float)"));
        assert!(message.contains("Value3"));
    }
}
