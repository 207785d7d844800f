//! Snapshot file decoding pipeline
//!
//! Decoding runs detect → size → seek → header → body. The sizing pass and
//! the header decoder share one implementation, so the byte offsets used for
//! direct snapshot seeking can never disagree with the full decode.

mod body;
mod header;
mod records;
mod sizing;

pub mod parsers;

// standard library
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

// crate modules
use crate::dataset::{Dataset, FileInfo};
use crate::error::{Error, Result};
use crate::filekind::{detect_from_stream, FileKind};
use crate::resolve::resolve;

// external crates
use log::debug;

/// Internal reader for one snapshot file
///
/// Owns the file handle for the duration of a decode call, so the handle is
/// released on every exit path including early header-parse failures.
pub(crate) struct SnapshotReader {
    stream: BufReader<File>,
    kind: FileKind,
    path: PathBuf,
}

impl SnapshotReader {
    /// Open and classify a snapshot file, rejecting the non-snapshot kinds
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut stream = BufReader::new(file);
        let kind = detect_from_stream(&mut stream, path)?;
        if !kind.is_snapshot() {
            return Err(Error::UnsupportedFileKind {
                path: path.display().to_string(),
                kind,
            });
        }
        Ok(Self {
            stream,
            kind,
            path: path.to_path_buf(),
        })
    }

    /// Total size of the underlying file in bytes
    fn file_len(&self) -> Result<u64> {
        Ok(self.stream.get_ref().metadata()?.len())
    }
}

/// Decode one snapshot from the file at `path`
///
/// The snapshot count is found from a single sizing pass over the first
/// header, and the requested snapshot is seeked to directly without decoding
/// anything in between.
///
/// ```rust, no_run
/// # use mhdtools_snapshot::read_snapshot;
/// let dataset = read_snapshot("./data/shocktube.out", 2).unwrap();
/// println!("{dataset}");
/// ```
pub fn read_snapshot<P: AsRef<Path>>(path: P, index: usize) -> Result<Dataset> {
    let path = path.as_ref();
    let mut reader = SnapshotReader::open(path)?;

    let layout = reader.scan_layout()?;
    debug!(
        "grid extents {:?} behind a {} byte header",
        layout.extents, layout.header_bytes
    );
    let bytes = reader.file_len()?;
    let n_snapshots = (bytes / layout.snapshot_bytes) as usize;
    if index >= n_snapshots {
        return Err(Error::IndexOutOfRange {
            requested: index,
            available: n_snapshots,
        });
    }

    // jump straight to the requested snapshot
    reader
        .stream
        .seek(SeekFrom::Start(index as u64 * layout.snapshot_bytes))?;
    let (header, _) = reader.decode_header()?;
    let data = reader.decode_body(&header)?;

    let (name, directory) = FileInfo::split_path(path);
    Ok(Dataset {
        info: FileInfo {
            name,
            directory,
            kind: reader.kind,
            bytes,
            n_snapshots,
            snapshot_bytes: layout.snapshot_bytes,
        },
        header,
        data,
    })
}

/// Decode a snapshot from the single file matching a wildcard pattern
///
/// The pattern supports `*` for any run of characters and `?` for any single
/// character. Exactly one file under `directory` must match before anything
/// is opened for data; zero matches is a [NoMatch](Error::NoMatch) and more
/// than one an [AmbiguousMatch](Error::AmbiguousMatch).
pub fn read_dataset<P: AsRef<Path>>(pattern: &str, directory: P, index: usize) -> Result<Dataset> {
    let directory = directory.as_ref();
    let mut matches = resolve(pattern, directory)?;
    debug!("\"{pattern}\" matched {} file(s)", matches.len());

    match matches.len() {
        0 => Err(Error::NoMatch {
            pattern: pattern.to_string(),
            directory: directory.display().to_string(),
        }),
        1 => read_snapshot(directory.join(matches.remove(0)), index),
        _ => Err(Error::AmbiguousMatch {
            pattern: pattern.to_string(),
            matches,
        }),
    }
}

/// Classify and size a file without decoding any snapshot body
///
/// Logfiles and Tecplot exports hold a single logical unit spanning the whole
/// file; snapshot files are sized from one pass over the first header.
pub fn probe_file<P: AsRef<Path>>(path: P) -> Result<FileInfo> {
    let path = path.as_ref();
    let (name, directory) = FileInfo::split_path(path);

    let file = File::open(path)?;
    let bytes = file.metadata()?.len();
    let mut stream = BufReader::new(file);
    let kind = detect_from_stream(&mut stream, path)?;

    if !kind.is_snapshot() {
        return Ok(FileInfo {
            name,
            directory,
            kind,
            bytes,
            n_snapshots: 1,
            snapshot_bytes: bytes,
        });
    }

    let mut reader = SnapshotReader {
        stream,
        kind: kind.clone(),
        path: path.to_path_buf(),
    };
    let layout = reader.scan_layout()?;
    Ok(FileInfo {
        name,
        directory,
        kind,
        bytes,
        n_snapshots: (bytes / layout.snapshot_bytes) as usize,
        snapshot_bytes: layout.snapshot_bytes,
    })
}
