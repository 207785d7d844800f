//! `mhdtools` is a semi-modular toolkit of fast and reliable libraries for
//! working with MHD simulation output
//!
#![doc = include_str!("../readme.md")]
#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Re-exports of toolkit crates.
#[doc(inline)]
pub use mhdtools_utils as utils;

#[cfg(feature = "snapshot")]
#[cfg_attr(docsrs, doc(cfg(feature = "snapshot")))]
#[doc(inline)]
pub use mhdtools_snapshot as snapshot;

#[cfg(feature = "tecplot")]
#[cfg_attr(docsrs, doc(cfg(feature = "tecplot")))]
#[doc(inline)]
pub use mhdtools_tecplot as tecplot;
