//! Detection of the on-disk format variants
//!
//! Snapshot files give no explicit format marker, so the variant has to be
//! inferred from the first few bytes. Binary variants open with a Fortran
//! record tag holding the headline width (79, or 500 for the extended
//! headline), and the length of the second record separates single from
//! double precision. Anything else is the plain text variant.
//!
//! Logfiles and Tecplot exports are recognised by extension before any bytes
//! are touched.

// standard library
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

// crate modules
use crate::error::{Error, Result};

// external crates
use log::debug;
use serde::{Deserialize, Serialize};

/// Standard headline width in bytes
pub(crate) const HEADLINE: usize = 79;

/// Extended headline width in bytes
pub(crate) const HEADLINE_EXT: usize = 500;

/// Parameter record length for a single precision snapshot
const PARAMS_REAL4: i32 = 20;

/// Parameter record length for a double precision snapshot
const PARAMS_REAL8: i32 = 24;

/// Every file format variant the toolkit can decode
///
/// The binary variants carry their headline width, since the extended
/// headline changes the size of both string records in the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    /// Plain text snapshot
    Ascii,
    /// Single precision Fortran binary snapshot
    Real4 { headline: usize },
    /// Double precision Fortran binary snapshot
    Real8 { headline: usize },
    /// Plain text logfile written alongside the snapshots
    Log,
    /// Tecplot export; the data block encoding is probed by the Tecplot
    /// decoder itself, since the header is always text
    Tecplot,
}

impl FileKind {
    /// True for the kinds that carry per-snapshot framing
    pub fn is_snapshot(&self) -> bool {
        matches!(
            self,
            FileKind::Ascii | FileKind::Real4 { .. } | FileKind::Real8 { .. }
        )
    }

    /// Bytes per stored value for the binary snapshot variants
    pub fn precision_bytes(&self) -> Option<usize> {
        match self {
            FileKind::Real4 { .. } => Some(4),
            FileKind::Real8 { .. } => Some(8),
            _ => None,
        }
    }

    /// Width of the headline and variable name records, if fixed
    pub fn headline_bytes(&self) -> Option<usize> {
        match self {
            FileKind::Real4 { headline } | FileKind::Real8 { headline } => Some(*headline),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FileKind::Ascii => write!(f, "ascii"),
            FileKind::Real4 { headline } => write!(f, "real4{}", extended_marker(*headline)),
            FileKind::Real8 { headline } => write!(f, "real8{}", extended_marker(*headline)),
            FileKind::Log => write!(f, "log"),
            FileKind::Tecplot => write!(f, "tecplot"),
        }
    }
}

fn extended_marker(headline: usize) -> &'static str {
    if headline == HEADLINE_EXT {
        " (extended)"
    } else {
        ""
    }
}

/// Classify the file at `path` into a [FileKind]
///
/// Only the first few bytes are inspected, no snapshot content is decoded.
///
/// ```rust, no_run
/// # use mhdtools_snapshot::detect_file_kind;
/// let kind = detect_file_kind("./data/shocktube.out").unwrap();
/// println!("{kind}");
/// ```
pub fn detect_file_kind<P: AsRef<Path>>(path: P) -> Result<FileKind> {
    let file = File::open(&path)?;
    let mut stream = BufReader::new(file);
    detect_from_stream(&mut stream, path.as_ref())
}

/// Classify an open stream, leaving it rewound to the start
pub(crate) fn detect_from_stream<R: Read + Seek>(stream: &mut R, path: &Path) -> Result<FileKind> {
    let kind = classify(stream, path)?;
    stream.seek(SeekFrom::Start(0))?;
    debug!("detected {kind} for \"{}\"", path.display());
    Ok(kind)
}

fn classify<R: Read + Seek>(stream: &mut R, path: &Path) -> Result<FileKind> {
    // logfiles and Tecplot exports are named unambiguously
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        if extension.eq_ignore_ascii_case("log") {
            return Ok(FileKind::Log);
        }
        // text or binary data block is settled later by the Tecplot reader
        if extension.eq_ignore_ascii_case("dat") {
            return Ok(FileKind::Tecplot);
        }
    }

    // a binary snapshot opens with the headline record tag
    let Some(lenhead) = probe_i32(stream)? else {
        return Err(Error::UnrecognizedFormat {
            path: path.display().to_string(),
        });
    };
    if lenhead != HEADLINE as i32 && lenhead != HEADLINE_EXT as i32 {
        return Ok(FileKind::Ascii);
    }

    // the length of the second record separates the precisions
    stream.seek(SeekFrom::Current(lenhead as i64 + 4))?;
    let Some(lenparams) = probe_i32(stream)? else {
        return Err(Error::UnrecognizedFormat {
            path: path.display().to_string(),
        });
    };
    let headline = lenhead as usize;
    match lenparams {
        PARAMS_REAL4 => Ok(FileKind::Real4 { headline }),
        PARAMS_REAL8 => Ok(FileKind::Real8 { headline }),
        found => Err(Error::MalformedHeader {
            expected: PARAMS_REAL8,
            found,
            offset: lenhead as u64 + 8,
        }),
    }
}

/// Read a little-endian i32, or None if the stream ends first
fn probe_i32<R: Read>(stream: &mut R) -> Result<Option<i32>> {
    let mut buffer = [0u8; std::mem::size_of::<i32>()];
    match stream.read_exact(&mut buffer) {
        Ok(()) => Ok(Some(i32::from_le_bytes(buffer))),
        Err(source) if source.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
        Err(source) => Err(Error::IOError(source)),
    }
}
