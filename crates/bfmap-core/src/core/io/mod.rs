//! Provides input/output functionality for structure files and observable tables.
//!
//! This module contains the byte-exact handling of PDB atom records, the line-level
//! rewriting interface used by the mapping driver, and the readers and writers for the
//! tabular data that flows into and out of bfmap.

pub mod cpptraj;
pub mod pdb;
pub mod table;
pub mod traits;
