//! Snapshot byte-length computation
//!
//! One snapshot's length is its header plus the data payload plus the record
//! tag overhead of the binary variants. With the length known, the snapshot
//! count falls out of an integer division by the file size and any snapshot
//! can be seeked to directly.

// standard library
use std::io::{Seek, SeekFrom};

// crate modules
use crate::error::{Error, Result};
use crate::filekind::FileKind;

// external crates
use log::debug;

use super::SnapshotReader;

/// Byte layout of one snapshot, computed without decoding a body
#[derive(Debug, Clone)]
pub(crate) struct SnapshotLayout {
    /// Exact byte length of the header block
    pub header_bytes: u64,
    /// Exact byte length of one full snapshot
    pub snapshot_bytes: u64,
    /// Grid extents declared by the scanned header
    pub extents: Vec<usize>,
}

// ! Sizing pass
impl SnapshotReader {
    /// Scan the first header and compute the snapshot byte layout
    ///
    /// The scan is the header decoder itself with the decoded values mostly
    /// discarded, so the offsets here and in a full decode cannot disagree.
    pub(crate) fn scan_layout(&mut self) -> Result<SnapshotLayout> {
        self.stream.seek(SeekFrom::Start(0))?;
        let (header, header_bytes) = self.decode_header()?;

        let n = header.n_points() as u64;
        let columns = (header.ndim + header.nw) as u64;
        let nw = header.nw as u64;

        let snapshot_bytes = match self.kind {
            // 18 bytes per numeric column plus a newline per grid point
            FileKind::Ascii => header_bytes + (18 * columns + 1) * n,
            // one tag pair for x plus one per field record
            FileKind::Real4 { .. } => header_bytes + 8 * (1 + nw) + 4 * columns * n,
            FileKind::Real8 { .. } => header_bytes + 8 * (1 + nw) + 8 * columns * n,
            ref kind => {
                return Err(Error::UnsupportedFileKind {
                    path: self.path.display().to_string(),
                    kind: kind.clone(),
                })
            }
        };

        debug!("layout: {header_bytes} header bytes, {snapshot_bytes} bytes per snapshot");
        Ok(SnapshotLayout {
            header_bytes,
            snapshot_bytes,
            extents: header.nx,
        })
    }
}
