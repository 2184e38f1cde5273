use crate::core::io::pdb::RESERVED_FIELD_WIDTH;
use crate::core::models::table::{ObservableTable, SelectedColumn, TableModelError};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Infix placed between the source stem and the column name in derived output names.
pub const OUTPUT_NAME_INFIX: &str = "_bfactors_";
/// Extension used for derived output names when the source has none.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "pdb";
/// Data file looked up inside every run directory; `{dataset}` is replaced by the dataset name.
pub const DEFAULT_DATAFILE_TEMPLATE: &str = "analyze/bfactors_{dataset}_backbone.out";
/// Name of the column holding the per-residue mean across runs.
pub const MEAN_COLUMN: &str = "Mean";

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error(transparent)]
    Table(#[from] TableModelError),

    #[error("Invalid thresholds: closed = {closed}, opened = {opened:?}")]
    InvalidThresholds { closed: f64, opened: Option<f64> },

    #[error("Unknown missing-value policy '{0}'. Expected 'zero', 'blank' or 'keep'.")]
    UnknownMissingValuePolicy(String),
}

/// What to write into the reserved field when the table has no value for a residue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingValuePolicy {
    /// Write `0.000`.
    #[default]
    Zero,
    /// Write five spaces.
    Blank,
    /// Leave the original field content untouched.
    Keep,
}

impl MissingValuePolicy {
    /// The text spliced into the reserved field, or `None` to keep the original bytes.
    pub fn placeholder(self) -> Option<&'static str> {
        match self {
            MissingValuePolicy::Zero => Some("0.000"),
            MissingValuePolicy::Blank => Some("     "),
            MissingValuePolicy::Keep => None,
        }
    }
}

impl FromStr for MissingValuePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" => Ok(MissingValuePolicy::Zero),
            "blank" => Ok(MissingValuePolicy::Blank),
            "keep" => Ok(MissingValuePolicy::Keep),
            other => Err(ConfigError::UnknownMissingValuePolicy(other.to_string())),
        }
    }
}

impl fmt::Display for MissingValuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingValuePolicy::Zero => "zero",
            MissingValuePolicy::Blank => "blank",
            MissingValuePolicy::Keep => "keep",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to exactly this path.
    Explicit(PathBuf),
    /// Derive the file name from the source and column, placed in `output_dir` or,
    /// when unset, next to the source.
    Derived { output_dir: Option<PathBuf> },
}

/// A validated, immutable configuration for one mapping run.
#[derive(Debug, Clone)]
pub struct MappingConfig<'t> {
    pub table: &'t ObservableTable,
    pub column: SelectedColumn,
    pub output: OutputTarget,
    pub missing_value: MissingValuePolicy,
}

impl MappingConfig<'_> {
    /// Resolves the destination path for mapping `source`.
    pub fn destination_for(&self, source: &Path) -> PathBuf {
        match &self.output {
            OutputTarget::Explicit(path) => path.clone(),
            OutputTarget::Derived { output_dir } => {
                let dir = output_dir
                    .clone()
                    .or_else(|| source.parent().map(Path::to_path_buf))
                    .unwrap_or_default();
                dir.join(derived_file_name(source, self.column.name()))
            }
        }
    }
}

/// Builds `<stem>_bfactors_<column>.<ext>` for `source`.
pub fn derived_file_name(source: &Path, column: &str) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "structure".to_string());
    let extension = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_OUTPUT_EXTENSION.to_string());
    format!("{stem}{OUTPUT_NAME_INFIX}{column}.{extension}")
}

#[derive(Default)]
pub struct MappingConfigBuilder<'t> {
    table: Option<&'t ObservableTable>,
    column: Option<String>,
    destination: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    missing_value: Option<MissingValuePolicy>,
}

impl<'t> MappingConfigBuilder<'t> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: &'t ObservableTable) -> Self {
        self.table = Some(table);
        self
    }
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
    pub fn destination(mut self, path: PathBuf) -> Self {
        self.destination = Some(path);
        self
    }
    pub fn output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = Some(dir);
        self
    }
    pub fn missing_value(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_value = Some(policy);
        self
    }

    /// Validates the selection against the table.
    ///
    /// Performs no file I/O, so a rejected configuration never touches the source or
    /// the destination.
    pub fn build(self) -> Result<MappingConfig<'t>, ConfigError> {
        let table = self.table.ok_or(ConfigError::MissingParameter("table"))?;
        let column_name = self
            .column
            .filter(|c| !c.trim().is_empty())
            .ok_or(ConfigError::MissingParameter("column"))?;
        let column = table.select(&column_name)?;

        let output = match self.destination {
            Some(path) => OutputTarget::Explicit(path),
            None => OutputTarget::Derived {
                output_dir: self.output_dir,
            },
        };

        let missing_value = self.missing_value.unwrap_or_default();
        debug_assert!(
            missing_value
                .placeholder()
                .is_none_or(|p| p.len() == RESERVED_FIELD_WIDTH)
        );

        Ok(MappingConfig {
            table,
            column,
            output,
            missing_value,
        })
    }
}

/// Configuration for aggregating per-run cpptraj data files into one table.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationConfig {
    pub root: PathBuf,
    pub datafile_template: String,
    pub only_runs: Option<Vec<String>>,
    pub offsets: HashMap<String, isize>,
}

impl AggregationConfig {
    /// The dataset name is the final component of the root directory.
    pub fn dataset_name(&self) -> Option<String> {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .or_else(|| {
                self.root
                    .canonicalize()
                    .ok()
                    .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            })
    }

    /// Relative path of the data file inside a run directory for `dataset`.
    pub fn datafile_for(&self, dataset: &str) -> PathBuf {
        PathBuf::from(self.datafile_template.replace("{dataset}", dataset))
    }

    pub fn offset_for(&self, dataset: &str) -> Option<isize> {
        self.offsets.get(dataset).copied()
    }
}

#[derive(Default)]
pub struct AggregationConfigBuilder {
    root: Option<PathBuf>,
    datafile_template: Option<String>,
    only_runs: Option<Vec<String>>,
    offsets: HashMap<String, isize>,
}

impl AggregationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(mut self, root: PathBuf) -> Self {
        self.root = Some(root);
        self
    }
    pub fn datafile_template(mut self, template: impl Into<String>) -> Self {
        self.datafile_template = Some(template.into());
        self
    }
    pub fn only_runs(mut self, runs: Vec<String>) -> Self {
        self.only_runs = Some(runs);
        self
    }
    pub fn offset(mut self, dataset: impl Into<String>, offset: isize) -> Self {
        self.offsets.insert(dataset.into(), offset);
        self
    }
    pub fn offsets(mut self, offsets: HashMap<String, isize>) -> Self {
        self.offsets.extend(offsets);
        self
    }

    pub fn build(self) -> Result<AggregationConfig, ConfigError> {
        Ok(AggregationConfig {
            root: self.root.ok_or(ConfigError::MissingParameter("root"))?,
            datafile_template: self
                .datafile_template
                .unwrap_or_else(|| DEFAULT_DATAFILE_TEMPLATE.to_string()),
            only_runs: self.only_runs.filter(|runs| !runs.is_empty()),
            offsets: self.offsets,
        })
    }
}

/// Reference distances for opening statistics: the closed-state threshold and,
/// optionally, the opened-state threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    closed: f64,
    opened: Option<f64>,
}

impl Thresholds {
    pub fn new(closed: f64, opened: Option<f64>) -> Result<Self, ConfigError> {
        let valid = closed.is_finite() && opened.is_none_or(|o| o.is_finite() && o >= closed);
        if !valid {
            return Err(ConfigError::InvalidThresholds { closed, opened });
        }
        Ok(Self { closed, opened })
    }

    pub fn closed(&self) -> f64 {
        self.closed
    }

    pub fn opened(&self) -> Option<f64> {
        self.opened
    }
}
