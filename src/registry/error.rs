use thiserror::Error;

use crate::Key;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RegistrationError {
    #[error("'{key}' is already registered in the {registry} registry")]
    Duplicate { registry: &'static str, key: Key },

    #[error("'{key}' declares a data slot but has no decoder")]
    DataSlotWithoutDecoder { key: Key },

    #[error("'{key}' has a decoder but declares no data slot")]
    DecoderWithoutDataSlot { key: Key },

    #[error("'{key}' declares {count} data slots, at most one is allowed")]
    MultipleDataSlots { key: Key, count: usize },

    #[error("'{key}' has no data slot")]
    NoDataSlot { key: Key },

    #[error("'{key}' has {len} argument slots, slot {index} does not exist")]
    SlotOutOfRange { key: Key, index: usize, len: usize },

    #[error("slot {index} of '{key}' does not hold a {expected}")]
    SlotTypeMismatch {
        key: Key,
        index: usize,
        expected: &'static str,
    },

    #[error("several suppliers provide '{type_key}' and at least one of them is unnamed")]
    AmbiguousSupplier { type_key: Key },

    #[error("supplier for '{type_key}' named '{name}' is declared twice")]
    DuplicateSupplier { type_key: Key, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no entry for '{key}' in the {registry} registry")]
pub struct LookupError {
    pub registry: &'static str,
    pub key: Key,
}
