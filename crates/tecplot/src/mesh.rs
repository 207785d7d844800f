//! Core structures for decoded Tecplot zones

// mhdtools modules
use mhdtools_utils::{f, OptionExt};

// external crates
use itertools::Itertools;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Finite element type of a Tecplot zone
///
/// Only the two cell shapes the solver writes are supported; the element type
/// fixes both the mesh dimensionality and the connectivity width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    /// 2d zone of 4-node cells
    Quadrilateral,
    /// 3d zone of 8-node cells
    Brick,
}

impl ZoneKind {
    /// Match the `ET`/`ZONETYPE` keyword value, case-insensitively
    pub fn from_keyword(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "QUADRILATERAL" | "FEQUADRILATERAL" => Some(ZoneKind::Quadrilateral),
            "BRICK" | "FEBRICK" => Some(ZoneKind::Brick),
            _ => None,
        }
    }

    /// Connectivity entries per cell
    pub fn nodes_per_cell(&self) -> usize {
        match self {
            ZoneKind::Quadrilateral => 4,
            ZoneKind::Brick => 8,
        }
    }

    /// Spatial dimensionality implied by the element type
    pub fn ndim(&self) -> usize {
        match self {
            ZoneKind::Quadrilateral => 2,
            ZoneKind::Brick => 3,
        }
    }
}

impl std::fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ZoneKind::Quadrilateral => write!(f, "quadrilateral"),
            ZoneKind::Brick => write!(f, "brick"),
        }
    }
}

/// One auxiliary metadata value, either an integer or free text
///
/// Keys known to be numeric decode to [Int](AuxValue::Int), everything else
/// stays text. Never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuxValue {
    /// Integer-valued entry, e.g. `ITER` or `NPROC`
    Int(i32),
    /// Free text entry
    Text(String),
}

impl std::fmt::Display for AuxValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AuxValue::Int(value) => write!(f, "{value}"),
            AuxValue::Text(value) => write!(f, "\"{value}\""),
        }
    }
}

/// Metadata of one Tecplot zone
#[derive(Debug, Clone, Serialize)]
pub struct ZoneMeta {
    /// Zone title from the `T` key
    pub title: String,
    /// Number of nodes in the zone
    pub nodes: usize,
    /// Number of cells in the zone
    pub cells: usize,
    /// Finite element type
    pub kind: ZoneKind,
    /// Auxiliary name/value pairs in file order
    pub aux: Vec<(String, AuxValue)>,
}

impl ZoneMeta {
    /// Look up an auxiliary value by name, case-insensitively
    pub fn aux(&self, name: &str) -> Option<&AuxValue> {
        self.aux
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

impl std::fmt::Display for ZoneMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "\"{}\": {} zone, {} nodes, {} cells, time {}",
            self.title,
            self.kind,
            self.nodes,
            self.cells,
            self.aux("TIMESIM").display()
        )
    }
}

/// Decoded Tecplot file header
#[derive(Debug, Clone, Serialize)]
pub struct Header {
    /// File title from the `TITLE` line
    pub title: String,
    /// Variable names from the `VARIABLES` block
    pub variables: Vec<String>,
    /// Metadata of the single zone
    pub zone: ZoneMeta,
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = f!("\"{}\"\n", self.title);
        s += &f!("    variables: {}\n", self.variables.iter().join(" "));
        s += &f!("    zone: {}", self.zone);
        write!(f, "{}", s)
    }
}

/// Point cloud and connectivity decoded from a Tecplot zone
///
/// In geometry mode the data values are cell-centred and a separate nodal
/// geometry array carries the coordinates; otherwise the values are nodal
/// and no geometry array exists.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Values shaped `(n_variables, n_points)`
    pub data: Array2<f32>,
    /// 1-based node indices shaped `(nodes_per_cell, n_cells)`
    pub connectivity: Array2<i32>,
    /// Nodal coordinates shaped `(ndim, n_nodes)`, geometry mode only
    pub geometry: Option<Array2<f32>>,
}

impl Mesh {
    /// Number of points the data values cover
    pub fn n_points(&self) -> usize {
        self.data.ncols()
    }

    /// Number of cells in the connectivity array
    pub fn n_cells(&self) -> usize {
        self.connectivity.ncols()
    }
}

impl std::fmt::Display for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} variables over {} points, {}x{} connectivity{}",
            self.data.nrows(),
            self.n_points(),
            self.connectivity.nrows(),
            self.n_cells(),
            if self.geometry.is_some() {
                ", nodal geometry"
            } else {
                ""
            }
        )
    }
}
