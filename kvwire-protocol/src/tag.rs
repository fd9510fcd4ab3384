//! Reply type tags.
//!
//! Every reply starts with a single tag byte that fixes how much more has
//! to be read:
//!
//! ```text
//! scalar          + - : _ , # (      first line only
//! length-prefixed $ = !              line, then n payload bytes + CRLF
//! aggregate       * ~ >              line, then n nested replies
//! pairwise        %                  line, then 2n nested replies
//! attribute       |                  attribute map, then the reply it annotates
//! ```

/// Reply tag, one per leading byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Status,
    Error,
    Integer,
    Nil,
    Double,
    Boolean,
    BigNumber,
    BulkString,
    Verbatim,
    BulkError,
    Array,
    Set,
    Push,
    Map,
    Attribute,
}

/// How a tag's frame is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Fully described by the first line.
    Scalar,
    /// First line carries a byte count, followed by the payload and CRLF.
    Blob,
    /// First line carries the number of nested replies.
    Aggregate,
    /// First line carries the number of key/value pairs.
    Pairs,
    /// Metadata map attached to the reply that follows it.
    Attribute,
}

impl Tag {
    /// Classifies a leading byte. Returns `None` for unknown tags.
    pub fn from_byte(byte: u8) -> Option<Self> {
        let tag = match byte {
            b'+' => Tag::Status,
            b'-' => Tag::Error,
            b':' => Tag::Integer,
            b'_' => Tag::Nil,
            b',' => Tag::Double,
            b'#' => Tag::Boolean,
            b'(' => Tag::BigNumber,
            b'$' => Tag::BulkString,
            b'=' => Tag::Verbatim,
            b'!' => Tag::BulkError,
            b'*' => Tag::Array,
            b'~' => Tag::Set,
            b'>' => Tag::Push,
            b'%' => Tag::Map,
            b'|' => Tag::Attribute,
            _ => return None,
        };
        Some(tag)
    }

    /// Wire byte for this tag.
    pub fn byte(self) -> u8 {
        match self {
            Tag::Status => b'+',
            Tag::Error => b'-',
            Tag::Integer => b':',
            Tag::Nil => b'_',
            Tag::Double => b',',
            Tag::Boolean => b'#',
            Tag::BigNumber => b'(',
            Tag::BulkString => b'$',
            Tag::Verbatim => b'=',
            Tag::BulkError => b'!',
            Tag::Array => b'*',
            Tag::Set => b'~',
            Tag::Push => b'>',
            Tag::Map => b'%',
            Tag::Attribute => b'|',
        }
    }

    pub fn shape(self) -> Shape {
        match self {
            Tag::Status
            | Tag::Error
            | Tag::Integer
            | Tag::Nil
            | Tag::Double
            | Tag::Boolean
            | Tag::BigNumber => Shape::Scalar,
            Tag::BulkString | Tag::Verbatim | Tag::BulkError => Shape::Blob,
            Tag::Array | Tag::Set | Tag::Push => Shape::Aggregate,
            Tag::Map => Shape::Pairs,
            Tag::Attribute => Shape::Attribute,
        }
    }

    /// Whether the reply reports a server-side error.
    pub fn is_error(self) -> bool {
        matches!(self, Tag::Error | Tag::BulkError)
    }
}
