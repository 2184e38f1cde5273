use crate::cli::AggregateArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use bfmap::{
    core::io::table::{write_observable_csv, write_observable_to},
    engine::error::EngineError,
    workflows,
};
use tracing::info;

pub fn run(args: AggregateArgs) -> Result<()> {
    let partial_config = PartialConfig::load(args.config.as_deref())?;
    let config = partial_config.merge_aggregate_args(&args)?;

    info!("Invoking the aggregation workflow...");
    let table = workflows::aggregate::run(&config)?;

    match &args.output {
        Some(path) => {
            write_observable_csv(&table, path).map_err(EngineError::from)?;
            eprintln!(
                "✓ Aggregated {} residues from {} runs into: {}",
                table.len(),
                table.columns().len() - 1,
                path.display()
            );
        }
        None => {
            let stdout = std::io::stdout();
            write_observable_to(&table, stdout.lock(), "<stdout>").map_err(EngineError::from)?;
        }
    }
    Ok(())
}
