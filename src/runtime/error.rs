use std::io;

use thiserror::Error;

use crate::resource::ConstantBufferError;

/// Errors raised while decoding a compiled stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not a compiled material script")]
    InvalidFileType,

    #[error("unsupported format version {0:#06x}")]
    UnsupportedVersion(u32),

    #[error("short read: needed {needed} bytes, {remaining} remaining")]
    ShortRead { needed: usize, remaining: usize },

    #[error("invalid node tag {0}")]
    InvalidNodeTag(u16),

    #[error("opcode {opcode} is not valid inside {object}")]
    UnknownOpcode { object: &'static str, opcode: u16 },

    #[error("invalid {what}: {value}")]
    InvalidValue { what: &'static str, value: String },

    #[error("{0} requires a name")]
    EmptyName(&'static str),

    #[error("{object} is missing {what}")]
    MissingField {
        object: &'static str,
        what: &'static str,
    },

    #[error(transparent)]
    ConstantBuffer(#[from] ConstantBufferError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DecodeError {
    pub(crate) fn invalid(what: &'static str, value: impl ToString) -> Self {
        DecodeError::InvalidValue {
            what,
            value: value.to_string(),
        }
    }
}
