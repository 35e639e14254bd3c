use thiserror::Error;

use super::ElementPath;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PathError {
    #[error("segment '{segment}' at position {position} does not exist")]
    MissingKey { segment: String, position: usize },

    #[error("segment '{segment}' at position {position} is not a valid list index")]
    InvalidIndex { segment: String, position: usize },

    #[error("index '{segment}' at position {position} is out of range for a list of {len}")]
    IndexOutOfRange {
        segment: String,
        position: usize,
        len: usize,
    },

    #[error("segment '{segment}' at position {position} indexes into a scalar value")]
    NotAContainer { segment: String, position: usize },

    #[error("cannot relativize '{to}' against '{from}': one is absolute and the other is not")]
    MixedAbsoluteness { from: ElementPath, to: ElementPath },

    #[error("cannot relativize '{to}' against '{from}': '{from}' has unresolved '..' segments")]
    Unrelativizable { from: ElementPath, to: ElementPath },

    #[error("subpath {begin}..{end} is out of range for '{path}'")]
    SubpathOutOfRange {
        path: ElementPath,
        begin: usize,
        end: usize,
    },
}
