//! Error types for the descry-core library.
//!
//! Every failure is terminal for the record it occurs in: there is no partial
//! recovery, and a single failing file fails the whole build.

use thiserror::Error;

/// Result type alias for descry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for decoding descriptors and building schema trees
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The cursor would read past the end of the buffer
    #[error("truncated input at offset {offset}: unexpected end of buffer")]
    TruncatedInput {
        /// Absolute byte offset where the read started
        offset: usize,
    },

    /// Group markers, or a wire type that does not exist
    #[error("unsupported wire type {wire_type} at offset {offset}")]
    UnsupportedWireType {
        /// Raw 3-bit wire type
        wire_type: u8,
        /// Absolute byte offset of the tag
        offset: usize,
    },

    /// A varint ran past ten bytes without terminating
    #[error("malformed varint at offset {offset}: longer than 10 bytes")]
    MalformedVarint {
        /// Absolute byte offset where the varint starts
        offset: usize,
    },

    /// A tag carried field number 0 or one above the protobuf maximum
    #[error("invalid field number {number} at offset {offset}: must be between 1 and {max}")]
    InvalidFieldNumber {
        /// Field number as decoded from the tag
        number: u64,
        /// Largest valid field number
        max: u32,
        /// Absolute byte offset of the tag
        offset: usize,
    },

    /// Sub-messages nest deeper than the decoder allows
    #[error("recursion limit of {limit} exceeded at offset {offset}")]
    RecursionLimitExceeded {
        /// Maximum nesting depth
        limit: u32,
        /// Absolute byte offset of the sub-message that crossed the limit
        offset: usize,
    },

    /// A field the schema marks as required was absent on the wire
    #[error("missing required field '{field}' in {message}")]
    MissingRequiredField {
        /// Descriptor message kind
        message: &'static str,
        /// Name of the absent field
        field: &'static str,
    },

    /// A message, enum or service lacks a usable name
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// A name or field number is already taken in its container
    #[error("duplicate name '{name}' in '{scope}'")]
    DuplicateName {
        /// The clashing name (or field number)
        name: String,
        /// Fully-qualified name of the container
        scope: String,
    },

    /// A type reference could not be resolved against the tree
    #[error("no such type '{name}' in '{scope}'")]
    UnresolvedType {
        /// The reference as written in the descriptor
        name: String,
        /// Fully-qualified name of the scope the lookup started from
        scope: String,
    },
}

impl Error {
    /// Creates a new truncated input error
    pub fn truncated(offset: usize) -> Self {
        Self::TruncatedInput { offset }
    }

    /// Creates a new unsupported wire type error
    pub fn unsupported_wire_type(wire_type: u8, offset: usize) -> Self {
        Self::UnsupportedWireType { wire_type, offset }
    }

    /// Creates a new malformed varint error
    pub fn malformed_varint(offset: usize) -> Self {
        Self::MalformedVarint { offset }
    }

    /// Creates a new invalid field number error
    pub fn invalid_field_number(number: u64, max: u32, offset: usize) -> Self {
        Self::InvalidFieldNumber {
            number,
            max,
            offset,
        }
    }

    /// Creates a new recursion limit error
    pub fn recursion_limit(limit: u32, offset: usize) -> Self {
        Self::RecursionLimitExceeded { limit, offset }
    }

    /// Creates a new missing required field error
    pub fn missing_field(message: &'static str, field: &'static str) -> Self {
        Self::MissingRequiredField { message, field }
    }

    /// Creates a new invalid descriptor error
    pub fn invalid_descriptor(msg: impl Into<String>) -> Self {
        Self::InvalidDescriptor(msg.into())
    }

    /// Creates a new duplicate name error
    pub fn duplicate(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::DuplicateName {
            name: name.into(),
            scope: scope.into(),
        }
    }

    /// Creates a new unresolved type error
    pub fn unresolved(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::UnresolvedType {
            name: name.into(),
            scope: scope.into(),
        }
    }

    /// Returns true if the error was raised while decoding wire bytes
    /// rather than while building or resolving the tree
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::TruncatedInput { .. }
                | Self::UnsupportedWireType { .. }
                | Self::MalformedVarint { .. }
                | Self::InvalidFieldNumber { .. }
                | Self::RecursionLimitExceeded { .. }
                | Self::MissingRequiredField { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::missing_field("NamePart", "name_part");
        assert!(err.to_string().contains("name_part"));
        assert!(err.to_string().contains("NamePart"));

        let err = Error::unresolved("Missing", ".pkg.Msg");
        assert_eq!(err.to_string(), "no such type 'Missing' in '.pkg.Msg'");
    }

    #[test]
    fn test_is_decode_error() {
        assert!(Error::truncated(3).is_decode_error());
        assert!(Error::unsupported_wire_type(3, 0).is_decode_error());
        assert!(Error::malformed_varint(0).is_decode_error());
        assert!(Error::invalid_field_number(0, 536_870_911, 0).is_decode_error());
        assert!(Error::recursion_limit(100, 7).is_decode_error());
        assert!(!Error::invalid_descriptor("no name").is_decode_error());
        assert!(!Error::duplicate("Foo", "pkg").is_decode_error());
    }
}
