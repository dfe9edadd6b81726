//! Built-in node library.
//!
//! Nodes generic over [`NodeValue`](numeric::NodeValue) are registered once
//! per numeric type, e.g. "Add (Float)" and "Add (Int)". Audio-rate aliases
//! map onto the float implementations.

pub mod array;
pub mod boundary;
pub mod constant;
pub mod envelope;
pub mod generators;
pub mod math;
pub mod music;
pub mod numeric;
pub mod random;
pub mod range;
pub mod triggers;

#[cfg(test)]
pub(crate) mod test_util;

pub use array::{Get, GetRandom};
pub use boundary::GraphBoundary;
pub use constant::Constant;
pub use envelope::{AdEnvelope, EnvelopeStage};
pub use generators::{Noise, NoiseType, Sine};
pub use math::{Add, Divide, Log, Max, Min, Modulo, Multiply, Power, Subtract};
pub use music::{BpmToSeconds, FrequencyToNote, NoteToFrequency};
pub use numeric::NodeValue;
pub use random::Random;
pub use range::{Clamp, FrequencyLogToLinear, LinearToLogFrequency, MapRange};
pub use triggers::{DelayedTrigger, RepeatTrigger, TriggerCounter};

use crate::dsp::{NodeCategory, NodeRegistry};

/// Registers every built-in node type and alias.
pub fn register_builtin_nodes(registry: &mut NodeRegistry) {
    use NodeCategory::*;

    registry.register::<Constant<f32>>("Constant (Float)", Utility);
    registry.register::<Constant<i32>>("Constant (Int)", Utility);

    registry.register::<Add<f32>>("Add (Float)", Math);
    registry.register::<Add<i32>>("Add (Int)", Math);
    registry.register::<Subtract<f32>>("Subtract (Float)", Math);
    registry.register::<Subtract<i32>>("Subtract (Int)", Math);
    registry.register::<Multiply<f32>>("Multiply (Float)", Math);
    registry.register::<Multiply<i32>>("Multiply (Int)", Math);
    registry.register::<Divide<f32>>("Divide (Float)", Math);
    registry.register::<Divide<i32>>("Divide (Int)", Math);
    registry.register::<Min<f32>>("Min (Float)", Math);
    registry.register::<Min<i32>>("Min (Int)", Math);
    registry.register::<Max<f32>>("Max (Float)", Math);
    registry.register::<Max<i32>>("Max (Int)", Math);
    registry.register::<Clamp<f32>>("Clamp (Float)", Math);
    registry.register::<Clamp<i32>>("Clamp (Int)", Math);
    registry.register::<MapRange<f32>>("Map Range (Float)", Math);
    registry.register::<MapRange<i32>>("Map Range (Int)", Math);
    registry.register::<Modulo>("Modulo", Math);
    registry.register::<Power>("Power", Math);
    registry.register::<Log>("Log", Math);
    registry.register::<LinearToLogFrequency>("Linear To Log Frequency", Math);
    registry.register::<FrequencyLogToLinear>("Frequency Log To Linear", Math);

    registry.register_alias::<Add<f32>>("Add (Audio)", Math);
    registry.register_alias::<Add<f32>>("Add (Float to Audio)", Math);
    registry.register_alias::<Subtract<f32>>("Subtract (Audio)", Math);
    registry.register_alias::<Multiply<f32>>("Multiply (Audio)", Math);
    registry.register_alias::<Multiply<f32>>("Multiply (Audio by Float)", Math);
    registry.register_alias::<Min<f32>>("Min (Audio)", Math);
    registry.register_alias::<Max<f32>>("Max (Audio)", Math);
    registry.register_alias::<Clamp<f32>>("Clamp (Audio)", Math);
    registry.register_alias::<MapRange<f32>>("Map Range (Audio)", Math);

    registry.register::<Get<f32>>("Get (Float)", Array);
    registry.register::<Get<i32>>("Get (Int)", Array);
    registry.register::<GetRandom<f32>>("Get Random (Float)", Array);
    registry.register::<GetRandom<i32>>("Get Random (Int)", Array);

    registry.register::<Random<f32>>("Random (Float)", Generator);
    registry.register::<Random<i32>>("Random (Int)", Generator);
    registry.register::<Noise>("Noise", Generator);
    registry.register::<Sine>("Sine", Generator);

    registry.register::<AdEnvelope>("AD Envelope", Envelope);

    registry.register::<RepeatTrigger>("Repeat Trigger", Trigger);
    registry.register::<TriggerCounter>("Trigger Counter", Trigger);
    registry.register::<DelayedTrigger>("Delayed Trigger", Trigger);

    registry.register::<BpmToSeconds>("BPM to Seconds", Music);
    registry.register::<NoteToFrequency<f32>>("Note To Frequency (Float)", Music);
    registry.register::<NoteToFrequency<i32>>("Note To Frequency (Int)", Music);
    registry.register::<FrequencyToNote>("Frequency To Note", Music);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{Identifier, Value};
    use uuid::Uuid;

    #[test]
    fn test_every_registered_type_instantiates() {
        let registry = NodeRegistry::with_builtin_nodes();
        for info in registry.list_nodes() {
            let node = registry
                .create(info.id, Uuid::new_v4())
                .unwrap_or_else(|| panic!("{} did not instantiate", info.name));
            assert_eq!(node.name(), info.name);
            assert!(!node.definitions().is_empty(), "{} has no endpoints", info.name);
        }
    }

    #[test]
    fn test_aliases_share_implementation() {
        let registry = NodeRegistry::with_builtin_nodes();
        let ctx = crate::dsp::ProcessContext::default();

        for name in ["Multiply (Audio)", "Multiply (Audio by Float)", "Multiply (Float)"] {
            let mut node = registry.create_by_name(name, Uuid::new_v4()).unwrap();
            assert_eq!(node.name(), name);
            node.set_input_value(Identifier::new("Value"), Value::Float(3.0));
            node.set_input_value(Identifier::new("Multiplier"), Value::Float(0.5));
            node.tick(&ctx);
            assert_eq!(node.output_value(Identifier::new("Out")), Some(&Value::Float(1.5)));
        }

        let alias = registry.info(Identifier::new("Multiply (Audio)")).unwrap();
        assert!(alias.is_alias);
        assert!(!registry.info(Identifier::new("Multiply (Float)")).unwrap().is_alias);
    }

    #[test]
    fn test_unknown_type_is_none() {
        let registry = NodeRegistry::with_builtin_nodes();
        assert!(registry.create_by_name("Reverb (Float)", Uuid::new_v4()).is_none());
    }
}
