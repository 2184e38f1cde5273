//! # bfmap Core Library
//!
//! A library for mapping per-residue observables (for example backbone fluctuation
//! B-factors computed from molecular dynamics runs) onto the temperature factor field
//! of structure files in the fixed-column PDB format.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture so that the byte-exact record
//! handling stays isolated from configuration and file management.
//!
//! - **[`core`]: The Foundation.** Stateless building blocks: the PDB record classifier,
//!   residue resolver and field splice, fixed-width numeric formatting, the
//!   `ObservableTable` and `FrameTable` models, and table readers/writers.
//!
//! - **[`engine`]: The Logic Core.** Validated run configuration, the error taxonomy,
//!   progress reporting, and the `BfactorRewriter` that turns one atom record into its
//!   rewritten form.
//!
//! - **[`workflows`]: The Public API.** Complete procedures: the single-pass mapping
//!   driver with atomic output commit, aggregation of per-run data files into an
//!   observable table, and opening statistics over per-frame observables.

pub mod core;
pub mod engine;
pub mod workflows;
