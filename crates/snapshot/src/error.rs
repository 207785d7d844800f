//! Result and Error types for mhdtools-snapshot

use crate::filekind::FileKind;

/// Type alias for Result<T, snapshot::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `mhdtools-snapshot` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error("unable to deserialise record content")]
    UnableToDeserialise(#[from] Box<bincode::ErrorKind>),

    #[error("decoded values do not fill the declared array shape")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("no file matching \"{pattern}\" under \"{directory}\"")]
    NoMatch { pattern: String, directory: String },

    #[error("pattern \"{pattern}\" matches more than one file: {matches:?}")]
    AmbiguousMatch {
        pattern: String,
        matches: Vec<String>,
    },

    #[error("snapshot {requested} requested from a file holding {available}")]
    IndexOutOfRange { requested: usize, available: usize },

    #[error("unrecognised format for \"{path}\"")]
    UnrecognizedFormat { path: String },

    #[error("malformed header record (expected {expected} bytes, found {found}) at byte {offset}")]
    MalformedHeader {
        expected: i32,
        found: i32,
        offset: u64,
    },

    #[error("file ends inside the header at byte {offset}")]
    TruncatedHeader { offset: u64 },

    #[error("file ends inside the data at byte {offset}")]
    ShortRead { offset: u64 },

    #[error("dimensionality {0} outside the supported 1-3 range")]
    UnsupportedDimensionality(i32),

    #[error("no snapshot records in {kind} file \"{path}\"")]
    UnsupportedFileKind { path: String, kind: FileKind },

    #[error("parser failed: {0}")]
    ParseError(String),
}
