//! Module for decoding MHD snapshot and logfile output
//!
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod dataset;
mod error;
mod filekind;
mod logfile;
mod reader;
mod resolve;

// Inline anything important for a nice public API
#[doc(inline)]
pub use dataset::{Dataset, Element, FileInfo, Header, Snapshot, SnapshotData};

#[doc(inline)]
pub use filekind::{detect_file_kind, FileKind};

#[doc(inline)]
pub use logfile::{read_log, LogTable};

#[doc(inline)]
pub use reader::{probe_file, read_dataset, read_snapshot};

#[doc(inline)]
pub use resolve::resolve;

#[doc(inline)]
pub use error::{Error, Result};
