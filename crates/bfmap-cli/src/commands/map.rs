use crate::cli::MapArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use bfmap::{
    core::io::table::read_observable_csv,
    engine::{
        config::{MappingConfig, MappingConfigBuilder},
        error::EngineError,
        progress::ProgressReporter,
    },
    workflows::{self, map::MappingSummary},
};
use indicatif::MultiProgress;
use rayon::prelude::*;
use tracing::{error, info};

pub fn run(args: MapArgs) -> Result<()> {
    let partial_config = PartialConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial_config.merge_map_args(&args)?;

    info!("Loading observable table from {:?}", &settings.table);
    let table = read_observable_csv(&settings.table).map_err(|e| CliError::FileParsing {
        path: settings.table.clone(),
        source: e.into(),
    })?;
    info!(
        "Table has {} residues and columns {:?}",
        table.len(),
        table.columns()
    );

    // Every column is validated before the first output file is created.
    let configs = settings
        .columns
        .iter()
        .map(|column| {
            let mut builder = MappingConfigBuilder::new()
                .table(&table)
                .column(column.as_str())
                .missing_value(settings.missing_value);
            if let Some(path) = &settings.output {
                builder = builder.destination(path.clone());
            } else if let Some(dir) = &settings.output_dir {
                builder = builder.output_dir(dir.clone());
            }
            builder.build().map_err(EngineError::from)
        })
        .collect::<std::result::Result<Vec<MappingConfig>, _>>()?;

    if let Some(dir) = &settings.output_dir {
        std::fs::create_dir_all(dir)?;
    }

    println!(
        "Mapping {} column(s) onto {}...",
        configs.len(),
        settings.input.display()
    );

    let multi = MultiProgress::new();
    let results: Vec<std::result::Result<MappingSummary, EngineError>> = configs
        .par_iter()
        .map(|config| {
            let handler = CliProgressHandler::in_group(&multi);
            let reporter = ProgressReporter::with_callback(handler.get_callback());
            let result = workflows::map::run(&settings.input, config, &reporter);
            if let Err(e) = &result {
                handler.abandon(e.to_string());
            }
            result
        })
        .collect();

    let mut first_error = None;
    for (config, result) in configs.iter().zip(results) {
        match result {
            Ok(summary) => println!(
                "✓ Column '{}' written to: {} ({} rewritten, {} placeholders)",
                summary.column,
                summary.destination.display(),
                summary.stats.rewritten,
                summary.stats.placeholders
            ),
            Err(e) => {
                error!("Column '{}' failed: {}", config.column.name(), e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
