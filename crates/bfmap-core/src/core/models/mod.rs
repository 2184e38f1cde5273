//! # Core Models Module
//!
//! This module contains the tabular data structures that carry externally computed
//! observables into bfmap.
//!
//! ## Overview
//!
//! bfmap never computes observables itself. It receives them as tables keyed by residue
//! identifier (for mapping onto a structure) or by frame (for opening statistics). These
//! models are designed to:
//!
//! - **Keep undefined cells explicit** - A missing value is `None`, never a sentinel number
//! - **Fix the column set up front** - Column names are validated once, at construction
//! - **Make column choices checkable** - A [`table::SelectedColumn`] can only be obtained
//!   from a table that actually has the column
//!
//! ## Key Components
//!
//! - [`table`] - `ObservableTable`, per-residue observables in crystal numbering
//! - [`series`] - `FrameTable`, one per-frame observable series per simulation run

pub mod series;
pub mod table;
