use crate::cli::StatsArgs;
use crate::error::{CliError, Result};
use bfmap::{
    core::io::table::{read_frames_csv, write_statistics_to},
    engine::{config::Thresholds, error::EngineError},
    workflows::statistics::opening_statistics,
};
use std::fs::File;
use tracing::info;

pub fn run(args: StatsArgs) -> Result<()> {
    let thresholds = Thresholds::new(args.closed, args.opened).map_err(EngineError::from)?;

    info!("Loading frame table from {:?}", &args.input);
    let frames = read_frames_csv(&args.input).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;
    let statistics = opening_statistics(&frames, &thresholds);

    match &args.output {
        Some(path) => {
            let file = File::create(path)?;
            write_statistics_to(&statistics, file, &path.to_string_lossy())
                .map_err(EngineError::from)?;
            eprintln!("✓ Statistics written to: {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            write_statistics_to(&statistics, stdout.lock(), "<stdout>")
                .map_err(EngineError::from)?;
        }
    }
    Ok(())
}
