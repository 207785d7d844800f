//! Module for decoding Tecplot mesh/data exports
//!
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod error;
mod mesh;
mod reader;

// Inline anything important for a nice public API
#[doc(inline)]
pub use mesh::{AuxValue, Header, Mesh, ZoneKind, ZoneMeta};

#[doc(inline)]
pub use reader::read_tecplot;

#[doc(inline)]
pub use error::{Error, Result};
