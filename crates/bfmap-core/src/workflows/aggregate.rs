use crate::core::io::cpptraj;
use crate::core::models::table::ObservableTable;
use crate::engine::config::{AggregationConfig, ConfigError, MEAN_COLUMN};
use crate::engine::error::EngineError;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

const RUN_PREFIX: &str = "run";

/// A run directory is named `run` followed by a digit from 1 to 9 and anything after it.
fn is_run_name(name: &str) -> bool {
    name.strip_prefix(RUN_PREFIX)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| ('1'..='9').contains(&c))
}

/// Orders `run2` before `run10`, falling back to the name for equal numbers.
fn run_sort_key(name: &str) -> (u64, String) {
    let digits: String = name
        .trim_start_matches(RUN_PREFIX)
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    (digits.parse().unwrap_or(u64::MAX), name.to_string())
}

fn discover_runs(config: &AggregationConfig) -> Result<Vec<(String, PathBuf)>, EngineError> {
    let entries = fs::read_dir(&config.root).map_err(|e| EngineError::Resource {
        path: config.root.clone(),
        source: e,
    })?;

    let mut runs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| EngineError::Resource {
            path: config.root.clone(),
            source: e,
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_run_name(&name) || !entry.path().is_dir() {
            continue;
        }
        if let Some(only) = &config.only_runs {
            if !only.contains(&name) {
                debug!("Skipping run '{}' (not selected)", name);
                continue;
            }
        }
        runs.push((name, entry.path()));
    }
    runs.sort_by_key(|(name, _)| run_sort_key(name));

    if let Some(only) = &config.only_runs {
        for wanted in only {
            if !runs.iter().any(|(name, _)| name == wanted) {
                warn!("Requested run '{}' was not found under {:?}", wanted, config.root);
            }
        }
    }
    Ok(runs)
}

/// Aggregates the per-run cpptraj data files of one dataset into an observable table.
///
/// The table has one column per run directory, in run order, followed by a
/// [`MEAN_COLUMN`] holding the mean of the defined run values of each residue. Raw
/// residue indices are shifted by the dataset's offset so that rows are keyed in
/// crystal numbering.
#[instrument(skip_all, name = "aggregation_workflow")]
pub fn run(config: &AggregationConfig) -> Result<ObservableTable, EngineError> {
    let dataset = config
        .dataset_name()
        .ok_or(ConfigError::MissingParameter("dataset name"))?;
    let offset = match config.offset_for(&dataset) {
        Some(offset) => offset,
        None => {
            warn!(
                "No residue offset configured for dataset '{}'; using raw indices",
                dataset
            );
            0
        }
    };
    info!(
        "Aggregating dataset '{}' under {:?} (offset {})",
        dataset, config.root, offset
    );

    let runs = discover_runs(config)?;
    if runs.is_empty() {
        return Err(EngineError::NoRuns {
            root: config.root.clone(),
        });
    }

    let datafile = config.datafile_for(&dataset);
    let mut per_run: Vec<HashMap<isize, f64>> = Vec::with_capacity(runs.len());
    let mut residues = BTreeSet::new();
    for (name, dir) in &runs {
        let path = dir.join(&datafile);
        debug!("Reading run '{}' from {:?}", name, path);
        let series = cpptraj::read_path(&path)?;

        let values: HashMap<isize, f64> = series
            .values
            .into_iter()
            .map(|(index, value)| (index + offset, value))
            .collect();
        residues.extend(values.keys().copied());
        per_run.push(values);
    }

    let mut table = ObservableTable::new(runs.iter().map(|(name, _)| name.clone()))?;
    for &residue in &residues {
        let cells = per_run
            .iter()
            .map(|values| values.get(&residue).copied())
            .collect();
        table.insert_row(residue, cells)?;
    }
    table.push_mean_column(MEAN_COLUMN)?;

    info!(
        "Aggregated {} runs over {} residues",
        runs.len(),
        table.len()
    );
    Ok(table)
}
