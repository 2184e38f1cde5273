//! # Core Module
//!
//! This module provides the stateless building blocks of bfmap: the fixed-column record
//! handling for PDB structure files, the tabular data models that carry per-residue and
//! per-frame observables, and the formatting utilities that keep rewritten fields inside
//! their reserved byte range.
//!
//! ## Architecture
//!
//! - **File I/O** ([`io`]) - PDB record classification, residue resolution and field
//!   splicing, CSV tables, and cpptraj per-run data files
//! - **Data Models** ([`models`]) - `ObservableTable`, `SelectedColumn` and `FrameTable`
//! - **Utilities** ([`utils`]) - Fixed-width numeric field formatting
//!
//! ## Key Capabilities
//!
//! - **Byte-exact rewriting** that never changes a line's length or any byte outside
//!   the reserved field
//! - **Tolerant residue resolution** for the known missing-space anomaly in some
//!   record generators
//! - **Explicit undefined values** in tables instead of sentinel numbers

pub mod io;
pub mod models;
pub mod utils;
