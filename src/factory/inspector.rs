use super::{Decoder, FactoryPlan, Slot, TypeSpec};
use crate::registry::RegistrationError;
use crate::Key;

/// The registration-time view of a type.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub key: Key,
    pub decoder: Option<Decoder>,
    pub plan: FactoryPlan,
    /// `None` leaves caching to the caller's per-call hint.
    pub cached: Option<bool>,
}

/// Derives the decoder, factory plan and cache preference of a type.
pub trait ElementInspector: Send + Sync {
    fn inspect(&self, spec: TypeSpec) -> Result<Inspection, RegistrationError>;
}

/// Checks the plan of a [`TypeSpec`] and passes it through.
///
/// A type has at most one data slot, and has a decoder exactly when it has a
/// data slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanInspector;

impl ElementInspector for PlanInspector {
    fn inspect(&self, spec: TypeSpec) -> Result<Inspection, RegistrationError> {
        let data_slots = spec
            .slots
            .iter()
            .filter(|slot| **slot == Slot::Data)
            .count();

        match (data_slots, spec.decoder.is_some()) {
            (0, false) | (1, true) => {}
            (0, true) => {
                return Err(RegistrationError::DecoderWithoutDataSlot { key: spec.key });
            }
            (1, false) => {
                return Err(RegistrationError::DataSlotWithoutDecoder { key: spec.key });
            }
            (count, _) => {
                return Err(RegistrationError::MultipleDataSlots {
                    key: spec.key,
                    count,
                });
            }
        }

        Ok(Inspection {
            plan: FactoryPlan::new(spec.key.clone(), spec.slots, spec.construct),
            key: spec.key,
            decoder: spec.decoder,
            cached: spec.cached,
        })
    }
}
