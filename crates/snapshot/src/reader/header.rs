//! Header decoding for the snapshot format variants

// standard library
use std::io::{BufRead, Seek};

// crate modules
use crate::dataset::Header;
use crate::error::{Error, Result};
use crate::filekind::FileKind;
use crate::reader::parsers::{ascii_params, vector_of_f64, vector_of_i32};
use crate::reader::records;

// mhdtools modules
use mhdtools_utils::f;

// external crates
use bincode::deserialize;
use log::{debug, warn};
use serde::Deserialize;

use super::SnapshotReader;

/// Parameter record of a real4 snapshot, 20 bytes
#[derive(Deserialize, Debug)]
struct ParamsReal4 {
    it: i32,
    time: f32,
    ndim: i32,
    neqpar: i32,
    nw: i32,
}

/// Parameter record of a real8 snapshot, 24 bytes
#[derive(Deserialize, Debug)]
struct ParamsReal8 {
    it: i32,
    time: f64,
    ndim: i32,
    neqpar: i32,
    nw: i32,
}

// ! Header decoding
impl SnapshotReader {
    /// Decode the header starting at the current stream position
    ///
    /// Returns the header together with its exact byte length, which the
    /// sizing pass needs for the snapshot length formula.
    pub(crate) fn decode_header(&mut self) -> Result<(Header, u64)> {
        debug!("decoding header of \"{}\"", self.path.display());
        match self.kind.clone() {
            FileKind::Ascii => self.decode_ascii_header(),
            FileKind::Real4 { headline } => self.decode_binary_header(headline, false),
            FileKind::Real8 { headline } => self.decode_binary_header(headline, true),
            kind => Err(Error::UnsupportedFileKind {
                path: self.path.display().to_string(),
                kind,
            }),
        }
    }

    /// Line-oriented decode of the plain text header
    fn decode_ascii_header(&mut self) -> Result<(Header, u64)> {
        let mut consumed = 0u64;

        let headline = self.header_line(&mut consumed)?.trim_end().to_string();

        let line = self.header_line(&mut consumed)?;
        let (_, (it, time, ndim_raw, neqpar, nw)) = ascii_params(&line)
            .map_err(|_| Error::ParseError(f!("invalid parameter line \"{}\"", line.trim_end())))?;
        let (ndim, gencoord) = checked_dimensions(ndim_raw)?;
        let neqpar = checked_count(neqpar, "neqpar")?;
        let nw = checked_count(nw, "nw")?;

        let line = self.header_line(&mut consumed)?;
        let (_, extents) = vector_of_i32(&line)
            .map_err(|_| Error::ParseError(f!("invalid extent line \"{}\"", line.trim_end())))?;
        let nx = checked_extents(&extents, ndim)?;

        let eqpar = if neqpar > 0 {
            let offset = self.stream.stream_position()?;
            let line = self.header_line(&mut consumed)?;
            let values = vector_of_f64(&line).map(|(_, v)| v).unwrap_or_default();
            if values.len() < neqpar {
                return Err(Error::TruncatedHeader { offset });
            }
            values[..neqpar].to_vec()
        } else {
            Vec::new()
        };

        let line = self.header_line(&mut consumed)?;
        let names: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        let variables = checked_names(names, ndim + nw + neqpar)?;

        let header = Header {
            headline,
            it,
            time,
            gencoord,
            ndim,
            neqpar,
            nw,
            nx,
            eqpar,
            variables,
        };
        debug!("header ({consumed} bytes): {header}");
        Ok((header, consumed))
    }

    /// Record-oriented decode of the binary header variants
    fn decode_binary_header(&mut self, headline_width: usize, real8: bool) -> Result<(Header, u64)> {
        let start = self.stream.stream_position()?;

        let headline = records::read_string_record(&mut self.stream, headline_width)?;

        let (it, time, ndim_raw, neqpar, nw) = if real8 {
            let params: ParamsReal8 = deserialize(&records::read_record(&mut self.stream, 24)?)?;
            (params.it, params.time, params.ndim, params.neqpar, params.nw)
        } else {
            let params: ParamsReal4 = deserialize(&records::read_record(&mut self.stream, 20)?)?;
            let ParamsReal4 { it, time, ndim, neqpar, nw } = params;
            (it, time as f64, ndim, neqpar, nw)
        };
        let (ndim, gencoord) = checked_dimensions(ndim_raw)?;
        let neqpar = checked_count(neqpar, "neqpar")?;
        let nw = checked_count(nw, "nw")?;

        let payload = records::read_record(&mut self.stream, (ndim * 4) as i32)?;
        let nx = checked_extents(&records::as_i32_values(&payload), ndim)?;

        // parameter values take the width of the data precision
        let eqpar = if neqpar > 0 {
            let width = if real8 { 8 } else { 4 };
            let payload = records::read_record(&mut self.stream, (neqpar * width) as i32)?;
            as_f64_values(&payload, real8)
        } else {
            Vec::new()
        };

        let names = records::read_string_record(&mut self.stream, headline_width)?;
        let names: Vec<String> = names.split_whitespace().map(str::to_string).collect();
        let variables = checked_names(names, ndim + nw + neqpar)?;

        let consumed = self.stream.stream_position()? - start;
        let header = Header {
            headline,
            it,
            time,
            gencoord,
            ndim,
            neqpar,
            nw,
            nx,
            eqpar,
            variables,
        };
        debug!("header ({consumed} bytes): {header}");
        Ok((header, consumed))
    }

    /// Read one header line, adding its byte count to the running total
    fn header_line(&mut self, consumed: &mut u64) -> Result<String> {
        let mut line = String::new();
        let n = self.stream.read_line(&mut line)?;
        if n == 0 {
            return Err(Error::TruncatedHeader {
                offset: self.stream.stream_position()?,
            });
        }
        *consumed += n as u64;
        Ok(line)
    }
}

/// Split `ndim` into magnitude and the generalised coordinate flag
fn checked_dimensions(ndim: i32) -> Result<(usize, bool)> {
    let magnitude = ndim.unsigned_abs() as usize;
    if !(1..=3).contains(&magnitude) {
        return Err(Error::UnsupportedDimensionality(ndim));
    }
    Ok((magnitude, ndim < 0))
}

/// A variable count must be non-negative to mean anything
fn checked_count(count: i32, name: &str) -> Result<usize> {
    usize::try_from(count).map_err(|_| Error::ParseError(f!("negative count {name}={count}")))
}

/// Grid extents must cover every dimension with positive sizes
fn checked_extents(extents: &[i32], ndim: usize) -> Result<Vec<usize>> {
    if extents.len() < ndim || extents[..ndim].iter().any(|&n| n < 1) {
        return Err(Error::ParseError(f!("invalid grid extents {extents:?}")));
    }
    Ok(extents[..ndim].iter().map(|&n| n as usize).collect())
}

/// Check the variable name list against the declared counts
///
/// Surplus trailing tokens are dropped, a deficit makes the name slices
/// meaningless and is fatal.
fn checked_names(mut names: Vec<String>, expected: usize) -> Result<Vec<String>> {
    if names.len() < expected {
        return Err(Error::ParseError(f!(
            "expected {expected} variable names, found {}",
            names.len()
        )));
    }
    if names.len() > expected {
        warn!("dropping surplus variable names: {:?}", &names[expected..]);
        names.truncate(expected);
    }
    Ok(names)
}

/// Split a record payload into native f64 values
fn as_f64_values(payload: &[u8], real8: bool) -> Vec<f64> {
    if real8 {
        payload
            .chunks_exact(8)
            .map(|chunk| {
                let mut buffer = [0u8; 8];
                buffer.copy_from_slice(chunk);
                f64::from_le_bytes(buffer)
            })
            .collect()
    } else {
        payload
            .chunks_exact(4)
            .map(|chunk| {
                let mut buffer = [0u8; 4];
                buffer.copy_from_slice(chunk);
                f32::from_le_bytes(buffer) as f64
            })
            .collect()
    }
}
