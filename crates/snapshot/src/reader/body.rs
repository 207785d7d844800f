//! Body decoding into the snapshot arrays
//!
//! The binary layout is asymmetric on disk: the whole coordinate array is one
//! Fortran record, but every field variable is written as its own record.
//! That convention comes from the solver's output loop and is matched here
//! exactly.

// standard library
use std::io::{BufRead, Read, Seek};

// crate modules
use crate::dataset::{Element, Snapshot, SnapshotData};
use crate::error::{Error, Result};
use crate::filekind::FileKind;
use crate::reader::parsers::vector_of_f64;

// mhdtools modules
use mhdtools_utils::f;

// external crates
use log::trace;

use super::SnapshotReader;

// ! Body decoding
impl SnapshotReader {
    /// Fill the snapshot arrays from the body at the current position
    pub(crate) fn decode_body(&mut self, header: &crate::dataset::Header) -> Result<SnapshotData> {
        match self.kind {
            FileKind::Ascii => Ok(SnapshotData::Real8(self.decode_ascii_body(header)?)),
            FileKind::Real4 { .. } => Ok(SnapshotData::Real4(self.decode_binary_body(header)?)),
            FileKind::Real8 { .. } => Ok(SnapshotData::Real8(self.decode_binary_body(header)?)),
            ref kind => Err(Error::UnsupportedFileKind {
                path: self.path.display().to_string(),
                kind: kind.clone(),
            }),
        }
    }

    /// One text line per grid point: `ndim` coordinates then `nw` fields
    fn decode_ascii_body(&mut self, header: &crate::dataset::Header) -> Result<Snapshot<f64>> {
        let n = header.n_points();
        let mut x = vec![0.0; n * header.ndim];
        let mut w = vec![0.0; n * header.nw];

        let mut line = String::new();
        for point in 0..n {
            line.clear();
            if self.stream.read_line(&mut line)? == 0 {
                return Err(Error::ShortRead {
                    offset: self.stream.stream_position()?,
                });
            }
            let values = vector_of_f64(&line).map(|(_, v)| v).map_err(|_| {
                Error::ParseError(f!("unparsable data line \"{}\"", line.trim_end()))
            })?;
            if values.len() != header.ndim + header.nw {
                return Err(Error::ParseError(f!(
                    "expected {} values per line, found {}",
                    header.ndim + header.nw,
                    values.len()
                )));
            }

            // column-major flat layout: point index varies fastest
            for (d, value) in values[..header.ndim].iter().enumerate() {
                x[point + d * n] = *value;
            }
            for (k, value) in values[header.ndim..].iter().enumerate() {
                w[point + k * n] = *value;
            }
        }

        Snapshot::from_flat(header, x, w)
    }

    /// One record for the full `x` array, then one record per field of `w`
    fn decode_binary_body<T: Element>(
        &mut self,
        header: &crate::dataset::Header,
    ) -> Result<Snapshot<T>> {
        let n = header.n_points();
        let x = self.read_data_record::<T>(n * header.ndim)?;

        let mut w = Vec::with_capacity(n * header.nw);
        for field in 0..header.nw {
            trace!("reading field record {field}");
            w.extend(self.read_data_record::<T>(n)?);
        }

        Snapshot::from_flat(header, x, w)
    }

    /// Read one tag-bracketed data record of `count` values
    fn read_data_record<T: Element>(&mut self, count: usize) -> Result<Vec<T>> {
        let expected = (count * T::BYTES) as i32;
        self.data_tag(expected)?;

        let offset = self.stream.stream_position()?;
        let mut payload = vec![0u8; count * T::BYTES];
        self.stream.read_exact(&mut payload).map_err(|source| {
            if source.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::ShortRead { offset }
            } else {
                Error::IOError(source)
            }
        })?;

        self.data_tag(expected)?;
        Ok(payload.chunks_exact(T::BYTES).map(T::from_le_slice).collect())
    }

    /// Read one data record tag, which must match the expected byte count
    fn data_tag(&mut self, expected: i32) -> Result<()> {
        let offset = self.stream.stream_position()?;
        let mut buffer = [0u8; std::mem::size_of::<i32>()];
        self.stream.read_exact(&mut buffer).map_err(|source| {
            if source.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::ShortRead { offset }
            } else {
                Error::IOError(source)
            }
        })?;
        let found = i32::from_le_bytes(buffer);
        if found != expected {
            return Err(Error::MalformedHeader {
                expected,
                found,
                offset,
            });
        }
        Ok(())
    }
}
