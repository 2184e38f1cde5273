use crate::cli::{AggregateArgs, MapArgs};
use crate::error::{CliError, Result};
use bfmap::engine::config::{AggregationConfig, AggregationConfigBuilder, MissingValuePolicy};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialTableConfig {
    path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialMappingConfig {
    columns: Option<Vec<String>>,
    #[serde(rename = "output-dir")]
    output_dir: Option<PathBuf>,
    #[serde(rename = "missing-value")]
    missing_value: Option<MissingValuePolicy>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialAggregationConfig {
    datafile: Option<String>,
    runs: Option<Vec<String>>,
    offsets: Option<HashMap<String, isize>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    table: Option<PartialTableConfig>,
    mapping: Option<PartialMappingConfig>,
    aggregation: Option<PartialAggregationConfig>,
}

/// Everything the `map` command needs once file and command line are merged.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingSettings {
    pub input: PathBuf,
    pub table: PathBuf,
    pub columns: Vec<String>,
    pub output: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub missing_value: MissingValuePolicy,
}

fn split_key_value<'a>(pair: &'a str, what: &str) -> Result<(&'a str, &'a str)> {
    pair.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| {
            CliError::Config(format!(
                "Invalid {} format: '{}'. Expected KEY=VALUE.",
                what, pair
            ))
        })
}

fn parse_offset(key: &str, value: &str) -> Result<isize> {
    value.parse().map_err(|_| {
        CliError::Config(format!("Invalid integer offset for {}: {}", key, value))
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;

        if let Some(base) = path.parent() {
            config.resolve_relative_paths(base);
        }
        Ok(config)
    }

    /// Loads the file when one is given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    // Paths in a config file are relative to the file, not to the working directory.
    fn resolve_relative_paths(&mut self, base: &Path) {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(path) = self.table.as_mut().and_then(|t| t.path.as_mut()) {
            rebase(path);
        }
        if let Some(dir) = self.mapping.as_mut().and_then(|m| m.output_dir.as_mut()) {
            rebase(dir);
        }
    }

    pub fn merge_map_args(mut self, args: &MapArgs) -> Result<MappingSettings> {
        self.apply_set_values(&args.set_values)?;
        let mapping = self.mapping.take().unwrap_or_default();

        let table = args
            .table
            .clone()
            .or_else(|| self.table.take().and_then(|t| t.path))
            .ok_or_else(|| {
                CliError::Config(
                    "An observable table is required either via --table or `table.path`."
                        .to_string(),
                )
            })?;

        let requested = if args.columns.is_empty() {
            mapping.columns.unwrap_or_default()
        } else {
            args.columns.clone()
        };
        let mut columns: Vec<String> = Vec::with_capacity(requested.len());
        for column in requested {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        if columns.is_empty() {
            return Err(CliError::Config(
                "At least one column is required either via --column or `mapping.columns`."
                    .to_string(),
            ));
        }
        if args.output.is_some() && columns.len() > 1 {
            return Err(CliError::Argument(format!(
                "--output names a single file but {} columns were requested; use --output-dir instead.",
                columns.len()
            )));
        }

        Ok(MappingSettings {
            input: args.input.clone(),
            table,
            columns,
            output: args.output.clone(),
            output_dir: args.output_dir.clone().or(mapping.output_dir),
            missing_value: args
                .missing_value
                .or(mapping.missing_value)
                .unwrap_or_default(),
        })
    }

    pub fn merge_aggregate_args(mut self, args: &AggregateArgs) -> Result<AggregationConfig> {
        self.apply_set_values(&args.set_values)?;
        let aggregation = self.aggregation.take().unwrap_or_default();

        let mut builder = AggregationConfigBuilder::new()
            .root(args.root.clone())
            .offsets(aggregation.offsets.unwrap_or_default());

        for pair in &args.offsets {
            let (dataset, value) = split_key_value(pair, "--offset")?;
            builder = builder.offset(dataset, parse_offset(dataset, value)?);
        }
        if let Some(template) = args.datafile.clone().or(aggregation.datafile) {
            builder = builder.datafile_template(template);
        }
        let runs = if args.runs.is_empty() {
            aggregation.runs.unwrap_or_default()
        } else {
            args.runs.clone()
        };
        builder = builder.only_runs(runs);

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = split_key_value(kv_pair, "--set")?;

            match key {
                "table.path" => {
                    self.table.get_or_insert_with(Default::default).path =
                        Some(PathBuf::from(value_str));
                }
                "mapping.columns" => {
                    self.mapping.get_or_insert_with(Default::default).columns =
                        Some(split_list(value_str));
                }
                "mapping.output-dir" => {
                    self.mapping.get_or_insert_with(Default::default).output_dir =
                        Some(PathBuf::from(value_str));
                }
                "mapping.missing-value" => {
                    self.mapping
                        .get_or_insert_with(Default::default)
                        .missing_value = Some(
                        value_str
                            .parse()
                            .map_err(|e: bfmap::engine::config::ConfigError| {
                                CliError::Config(e.to_string())
                            })?,
                    );
                }
                "aggregation.datafile" => {
                    self.aggregation.get_or_insert_with(Default::default).datafile =
                        Some(value_str.to_string());
                }
                "aggregation.runs" => {
                    self.aggregation.get_or_insert_with(Default::default).runs =
                        Some(split_list(value_str));
                }
                _ => {
                    let Some(dataset) = key.strip_prefix("aggregation.offsets.") else {
                        return Err(CliError::Config(format!(
                            "Unsupported configuration key for --set: '{}'",
                            key
                        )));
                    };
                    let offset = parse_offset(key, value_str)?;
                    self.aggregation
                        .get_or_insert_with(Default::default)
                        .offsets
                        .get_or_insert_with(Default::default)
                        .insert(dataset.to_string(), offset);
                }
            }
        }
        Ok(())
    }
}
