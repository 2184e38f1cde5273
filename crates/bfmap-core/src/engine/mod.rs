//! # Engine Module
//!
//! This module holds the logic that sits between the stateless building blocks in
//! [`crate::core`] and the end-to-end procedures in [`crate::workflows`].
//!
//! ## Overview
//!
//! A mapping run is configured once, validated before any file is touched, and then
//! executed line by line. The engine provides the pieces that make that contract hold:
//! configuration builders that reject unknown columns up front, the error taxonomy that
//! separates configuration, resource and format failures, progress events for front
//! ends, and the rewriter that applies table values to atom records.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Mapping, aggregation and statistics settings,
//!   missing-value policy and output naming
//! - **Rewriting** ([`rewriter`]) - `BfactorRewriter`, the table-backed `RecordRewriter`
//! - **Progress Monitoring** ([`progress`]) - Per-file and per-line progress events
//! - **Error Handling** ([`error`]) - `EngineError` and its propagation from lower layers

pub mod config;
pub mod error;
pub mod progress;
pub mod rewriter;
