//! Result and Error types for mhdtools-tecplot

/// Type alias for Result<T, tecplot::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `mhdtools-tecplot` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error("decoded values do not fill the declared array shape")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("expected a {expected} line, found \"{found}\"")]
    UnexpectedKeyword { expected: String, found: String },

    #[error("unparsable zone metadata \"{0}\"")]
    MalformedZoneLine(String),

    #[error("zone type \"{0}\" is not a known element type")]
    UnsupportedZoneType(String),

    #[error("file ends inside the data at byte {offset}")]
    ShortRead { offset: u64 },

    #[error("parser failed: {0}")]
    ParseError(String),
}
