//! Reader for the plain text logfiles written alongside the snapshots
//!
//! The layout is trivial: a title line, a variable-name line, then one row of
//! floats per saved step.

// standard library
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// crate modules
use crate::dataset::Header;
use crate::error::{Error, Result};
use crate::reader::parsers::vector_of_f64;

// mhdtools modules
use mhdtools_utils::f;

// external crates
use log::debug;
use ndarray::{Array2, ArrayView1, Axis};

/// Tabulated logfile values, one column per saved step
#[derive(Debug, Clone)]
pub struct LogTable {
    /// Variable names in column order
    pub variables: Vec<String>,
    /// Values shaped `(n_variables, n_entries)`
    pub data: Array2<f64>,
}

impl LogTable {
    /// Number of saved entries in the table
    pub fn n_entries(&self) -> usize {
        self.data.ncols()
    }

    /// All values of one variable by name, if it exists
    pub fn column(&self, name: &str) -> Option<ArrayView1<f64>> {
        let index = self.variables.iter().position(|n| n == name)?;
        Some(self.data.index_axis(Axis(0), index))
    }
}

/// Read a logfile into a header and a table of values
///
/// The header treats the table as a grid with one point per entry and no
/// coordinate columns (`ndim = 0`), so every name on the variable line is a
/// field name and the slice accessors stay valid.
///
/// ```rust, no_run
/// # use mhdtools_snapshot::read_log;
/// let (header, table) = read_log("./data/shocktube.log").unwrap();
/// let time = table.column("t").unwrap();
/// println!("{header}: {} entries", time.len());
/// ```
pub fn read_log<P: AsRef<Path>>(path: P) -> Result<(Header, LogTable)> {
    let file = File::open(&path)?;
    let mut lines = BufReader::new(file).lines();

    let headline = next_log_line(&mut lines)?.trim().to_string();
    let variables: Vec<String> = next_log_line(&mut lines)?
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let nw = variables.len();

    let mut values: Vec<f64> = Vec::new();
    let mut rows = 0;
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = vector_of_f64(&line).map(|(_, v)| v).map_err(|_| {
            Error::ParseError(f!("unparsable logfile row \"{}\"", line.trim_end()))
        })?;
        if row.len() != nw {
            return Err(Error::ParseError(f!(
                "expected {nw} values per logfile row, found {}",
                row.len()
            )));
        }
        values.extend(row);
        rows += 1;
    }
    debug!("logfile \"{headline}\": {nw} variables over {rows} entries");

    // rows arrive entry-major, the table stores variable-major
    let data = Array2::from_shape_vec((rows, nw), values)?.reversed_axes();
    let header = Header {
        headline,
        it: 0,
        time: 0.0,
        gencoord: false,
        ndim: 0,
        neqpar: 0,
        nw,
        nx: vec![rows],
        eqpar: Vec::new(),
        variables: variables.clone(),
    };

    Ok((header, LogTable { variables, data }))
}

/// Pull the next line of the logfile header
fn next_log_line(lines: &mut std::io::Lines<BufReader<File>>) -> Result<String> {
    lines
        .next()
        .ok_or(Error::TruncatedHeader { offset: 0 })?
        .map_err(Error::IOError)
}
