//! # Workflows Module
//!
//! This module provides the end-to-end procedures built on the engine: mapping an
//! observable onto a structure file, aggregating per-run data files into an observable
//! table, and summarising per-frame observables against crystal thresholds.
//!
//! ## Overview
//!
//! Workflows are the entry points used by front ends. Each one takes a validated
//! configuration, owns every file it opens for exactly the duration of the call, and
//! reports failures through [`crate::engine::error::EngineError`].
//!
//! ## Architecture
//!
//! - **Mapping Workflow** ([`map`]) - Single-pass rewrite of the temperature factor
//!   field with an atomic commit of the output file
//! - **Aggregation Workflow** ([`aggregate`]) - Collects `run*` data files into one
//!   table with a mean column, shifted into crystal residue numbering
//! - **Statistics Workflow** ([`statistics`]) - Mean, spread and threshold occupancy
//!   per run
//!
//! ## Key Capabilities
//!
//! - **No partial output**: the destination either holds the complete result or is
//!   left untouched
//! - **Deterministic output** for identical inputs
//! - **Progress monitoring** at file and line granularity

pub mod aggregate;
pub mod map;
pub mod statistics;
