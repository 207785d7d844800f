//! Fortran sequential record primitives
//!
//! Every record in a binary snapshot is bracketed by a pair of 4-byte length
//! tags. A record `R` bytes long is stored as `<R> <payload> <R>`, and a tag
//! that disagrees with the expected payload length means the file is not what
//! the header detection claimed it was.
//!
//! Both the sizing scan and the header decoder go through these helpers, so
//! the two passes cannot drift apart on byte offsets.

// standard library
use std::io::{Read, Seek};

// crate modules
use crate::error::{Error, Result};

// external crates
use log::trace;

/// Read one 4-byte little-endian record tag
///
/// End of file inside the header is a [TruncatedHeader](Error::TruncatedHeader).
pub(crate) fn read_tag<R: Read + Seek>(stream: &mut R) -> Result<i32> {
    let offset = stream.stream_position()?;
    let mut buffer = [0u8; std::mem::size_of::<i32>()];
    match stream.read_exact(&mut buffer) {
        Ok(()) => Ok(i32::from_le_bytes(buffer)),
        Err(source) if source.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(Error::TruncatedHeader { offset })
        }
        Err(source) => Err(Error::IOError(source)),
    }
}

/// Read the opening tag of a record, checking the declared length
pub(crate) fn open_record<R: Read + Seek>(stream: &mut R, expected: i32) -> Result<()> {
    let offset = stream.stream_position()?;
    let found = read_tag(stream)?;
    if found != expected {
        return Err(Error::MalformedHeader {
            expected,
            found,
            offset,
        });
    }
    trace!("record of {expected} bytes opened at offset {offset}");
    Ok(())
}

/// Read the bookend tag of a record, which must repeat the opening tag
pub(crate) fn close_record<R: Read + Seek>(stream: &mut R, length: i32) -> Result<()> {
    open_record(stream, length)
}

/// Read a full record of a known payload length, tags included
pub(crate) fn read_record<R: Read + Seek>(stream: &mut R, expected: i32) -> Result<Vec<u8>> {
    open_record(stream, expected)?;
    let mut payload = vec![0u8; expected as usize];
    let offset = stream.stream_position()?;
    stream.read_exact(&mut payload).map_err(|source| {
        if source.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::TruncatedHeader { offset }
        } else {
            Error::IOError(source)
        }
    })?;
    close_record(stream, expected)?;
    Ok(payload)
}

/// Read a fixed-width string record, trimming the padding
pub(crate) fn read_string_record<R: Read + Seek>(stream: &mut R, width: usize) -> Result<String> {
    let payload = read_record(stream, width as i32)?;
    Ok(String::from_utf8_lossy(&payload).trim().to_string())
}

/// Split a record payload into little-endian i32 values
pub(crate) fn as_i32_values(payload: &[u8]) -> Vec<i32> {
    payload
        .chunks_exact(std::mem::size_of::<i32>())
        .map(|chunk| {
            let mut buffer = [0u8; 4];
            buffer.copy_from_slice(chunk);
            i32::from_le_bytes(buffer)
        })
        .collect()
}
