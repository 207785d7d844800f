//! Core data structures produced by the snapshot readers

// standard library
use std::path::Path;

// crate modules
use crate::error::{Error, Result};
use crate::filekind::FileKind;

// mhdtools modules
use mhdtools_utils::{f, ValueExt};

// external crates
use itertools::Itertools;
use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn, ShapeBuilder};
use serde::Serialize;

/// Summary of a snapshot file on disk
///
/// Computed once by [probe_file](crate::probe_file) or as part of a full
/// decode, and never updated afterwards. The per-snapshot byte length is
/// stored rather than derived because the integer division that produced
/// the count cannot be inverted safely.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    /// File name without any directory component
    pub name: String,
    /// Directory the file was found under
    pub directory: String,
    /// Detected format variant
    pub kind: FileKind,
    /// Total file size in bytes
    pub bytes: u64,
    /// Number of snapshots held in the file
    pub n_snapshots: usize,
    /// Exact byte length of one snapshot, header and record tags included
    pub snapshot_bytes: u64,
}

impl FileInfo {
    /// Split a path into the name/directory pair stored on the descriptor
    pub(crate) fn split_path(path: &Path) -> (String, String) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let directory = path
            .parent()
            .map(|d| d.to_string_lossy().to_string())
            .unwrap_or_default();
        (name, directory)
    }
}

impl std::fmt::Display for FileInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} [{}]: {} bytes, {} snapshot(s) of {} bytes",
            self.name, self.kind, self.bytes, self.n_snapshots, self.snapshot_bytes
        )
    }
}

/// Decoded snapshot header
///
/// Field order follows the on-disk layout. The variable name list covers the
/// coordinates, then the fields, then the equation parameters, as contiguous
/// non-overlapping slices of one list.
#[derive(Debug, Clone, Serialize)]
pub struct Header {
    /// Free-text headline record
    pub headline: String,
    /// Iteration number of the snapshot
    pub it: i32,
    /// Simulation time, widened to f64 for the single precision variants
    pub time: f64,
    /// Generalised coordinates flag, taken from the sign of `ndim` on disk
    pub gencoord: bool,
    /// Spatial dimensionality, 1-3 for snapshots and 0 for logfile tables
    pub ndim: usize,
    /// Number of scalar equation parameters
    pub neqpar: usize,
    /// Number of field variables
    pub nw: usize,
    /// Grid extents per dimension
    pub nx: Vec<usize>,
    /// Equation parameter values
    pub eqpar: Vec<f64>,
    /// Variable names: coordinates, fields, then equation parameters
    pub variables: Vec<String>,
}

impl Header {
    /// Total number of grid points, the product of the extents
    pub fn n_points(&self) -> usize {
        self.nx.iter().product()
    }

    /// Names of the coordinate variables
    pub fn coordinate_names(&self) -> &[String] {
        &self.variables[..self.ndim]
    }

    /// Names of the field variables
    pub fn field_names(&self) -> &[String] {
        &self.variables[self.ndim..self.ndim + self.nw]
    }

    /// Names of the equation parameters
    pub fn parameter_names(&self) -> &[String] {
        &self.variables[self.ndim + self.nw..self.ndim + self.nw + self.neqpar]
    }

    /// Index of a field variable by name, if it exists
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_names().iter().position(|n| n == name)
    }
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = f!("\"{}\"\n", self.headline);
        s += &f!("    it: {}, time: {}\n", self.it, self.time.sci(5, 2));
        s += &f!(
            "    grid: {} ({}d{})\n",
            self.nx.iter().join("x"),
            self.ndim,
            if self.gencoord { ", gencoord" } else { "" }
        );
        s += &f!("    coordinates: {}\n", self.coordinate_names().join(" "));
        s += &f!("    fields: {}\n", self.field_names().join(" "));
        s += &f!(
            "    parameters: {}",
            self.parameter_names()
                .iter()
                .zip(&self.eqpar)
                .map(|(n, v)| f!("{n}={}", v.sci(5, 2)))
                .join(" ")
        );
        write!(f, "{}", s)
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Array element types the binary decoders can produce
///
/// Sealed to the two float widths the file formats actually store.
pub trait Element: private::Sealed + Copy + Default + 'static {
    /// Stored width of one value in bytes
    const BYTES: usize;

    /// Decode one value from its little-endian byte representation
    fn from_le_slice(bytes: &[u8]) -> Self;
}

impl Element for f32 {
    const BYTES: usize = 4;

    fn from_le_slice(bytes: &[u8]) -> Self {
        let mut buffer = [0u8; 4];
        buffer.copy_from_slice(bytes);
        f32::from_le_bytes(buffer)
    }
}

impl Element for f64 {
    const BYTES: usize = 8;

    fn from_le_slice(bytes: &[u8]) -> Self {
        let mut buffer = [0u8; 8];
        buffer.copy_from_slice(bytes);
        f64::from_le_bytes(buffer)
    }
}

/// Coordinate and field arrays for one snapshot
///
/// Both arrays are column-major so the flat memory order equals the value
/// order on disk: `x` has shape `(nx..., ndim)` and `w` has shape
/// `(nx..., nw)`.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    /// Grid point coordinates
    pub x: ArrayD<T>,
    /// Field variable values
    pub w: ArrayD<T>,
}

impl<T: Element> Snapshot<T> {
    /// Shape the flat on-disk value order into the snapshot arrays
    pub(crate) fn from_flat(header: &Header, x: Vec<T>, w: Vec<T>) -> Result<Self> {
        let x = ArrayD::from_shape_vec(array_shape(&header.nx, header.ndim).f(), x)?;
        let w = ArrayD::from_shape_vec(array_shape(&header.nx, header.nw).f(), w)?;
        Ok(Self { x, w })
    }

    /// View of one coordinate over the whole grid
    pub fn coordinate(&self, index: usize) -> ArrayViewD<T> {
        self.x.index_axis(Axis(self.x.ndim() - 1), index)
    }

    /// View of one field variable over the whole grid
    pub fn field(&self, index: usize) -> ArrayViewD<T> {
        self.w.index_axis(Axis(self.w.ndim() - 1), index)
    }
}

/// Build the grid shape with a trailing variable axis
pub(crate) fn array_shape(extents: &[usize], trailing: usize) -> IxDyn {
    let mut shape: Vec<usize> = extents.to_vec();
    shape.push(trailing);
    IxDyn(&shape)
}

/// Snapshot arrays at the precision found on disk
///
/// The text variant carries enough digits for a double, so ascii files always
/// decode to [Real8](SnapshotData::Real8).
#[derive(Debug, Clone)]
pub enum SnapshotData {
    /// Single precision arrays from a real4 binary file
    Real4(Snapshot<f32>),
    /// Double precision arrays from a real8 binary or ascii file
    Real8(Snapshot<f64>),
}

impl SnapshotData {
    /// Grid shape of the coordinate array, variable axis included
    pub fn x_shape(&self) -> &[usize] {
        match self {
            SnapshotData::Real4(s) => s.x.shape(),
            SnapshotData::Real8(s) => s.x.shape(),
        }
    }

    /// Grid shape of the field array, variable axis included
    pub fn w_shape(&self) -> &[usize] {
        match self {
            SnapshotData::Real4(s) => s.w.shape(),
            SnapshotData::Real8(s) => s.w.shape(),
        }
    }

    /// Double precision arrays, or an error for a real4 snapshot
    pub fn as_real8(&self) -> Result<&Snapshot<f64>> {
        match self {
            SnapshotData::Real8(s) => Ok(s),
            SnapshotData::Real4(_) => Err(Error::ParseError(
                "snapshot holds single precision data".to_string(),
            )),
        }
    }

    /// Single precision arrays, or an error for a real8 snapshot
    pub fn as_real4(&self) -> Result<&Snapshot<f32>> {
        match self {
            SnapshotData::Real4(s) => Ok(s),
            SnapshotData::Real8(_) => Err(Error::ParseError(
                "snapshot holds double precision data".to_string(),
            )),
        }
    }
}

/// One fully decoded snapshot with its file and header context
///
/// Produced by a single decode call and never mutated; reading a different
/// snapshot index produces a new Dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Summary of the file the snapshot came from
    pub info: FileInfo,
    /// Decoded snapshot header
    pub header: Header,
    /// Coordinate and field arrays
    pub data: SnapshotData,
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}\n{}", self.info, self.header)
    }
}
