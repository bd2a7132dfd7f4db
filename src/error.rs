//! Structured error type returned by every fallible entry point in this crate.

use std::fmt;

/// A type-erased error from a user-supplied converter callback.
pub type ConverterError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Describes which element kind a failed parse was attempting to produce.
/// Carried on `BadField` purely for diagnostics; not interpreted by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementDescr {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Complex64,
    Complex128,
    Bool,
    NarrowString { elsize: usize },
    WideString { elsize: usize },
    Generic,
}

impl fmt::Display for ElementDescr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementDescr::Int8 => write!(f, "int8"),
            ElementDescr::Int16 => write!(f, "int16"),
            ElementDescr::Int32 => write!(f, "int32"),
            ElementDescr::Int64 => write!(f, "int64"),
            ElementDescr::UInt8 => write!(f, "uint8"),
            ElementDescr::UInt16 => write!(f, "uint16"),
            ElementDescr::UInt32 => write!(f, "uint32"),
            ElementDescr::UInt64 => write!(f, "uint64"),
            ElementDescr::Float32 => write!(f, "float32"),
            ElementDescr::Float64 => write!(f, "float64"),
            ElementDescr::Complex64 => write!(f, "complex64"),
            ElementDescr::Complex128 => write!(f, "complex128"),
            ElementDescr::Bool => write!(f, "bool"),
            ElementDescr::NarrowString { elsize } => write!(f, "string[{elsize}]"),
            ElementDescr::WideString { elsize } => write!(f, "unicode[{elsize}]"),
            ElementDescr::Generic => write!(f, "generic"),
        }
    }
}

/// Every error this crate's public API can return.
///
/// All variants are fatal to the read in progress: the reader never returns a
/// partially populated table alongside an error.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("row {row}, column {col}: could not parse {descr} from {text:?}")]
    BadField {
        row: usize,
        col: usize,
        descr: ElementDescr,
        text: String,
    },

    #[error("row {row}: expected {expected} fields, got {got}")]
    ChangedNumberOfFields {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("row {row}: column index {requested} out of range for {current_width} fields")]
    InvalidColumnIndex {
        row: usize,
        requested: i64,
        current_width: usize,
    },

    #[error("out of memory while growing the output buffer")]
    OutOfMemory,

    #[error("row {row}, column {col}: converter failed")]
    ConverterFailed {
        row: usize,
        col: usize,
        #[source]
        cause: ConverterError,
    },

    #[error("row {row}, column {col}: converter result longer than destination cell")]
    OverlongString { row: usize, col: usize },

    #[error("stream adapter failed: {0}")]
    TokenizerIo(#[from] std::io::Error),
}
