use crate::core::models::series::{FrameTable, StatisticsTable};
use crate::engine::config::Thresholds;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Summary {
    count: usize,
    mean: f64,
    std: Option<f64>,
}

fn summarize(samples: &[f64]) -> Option<Summary> {
    if samples.is_empty() {
        return None;
    }
    let count = samples.len();
    let mean = samples.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let squares: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
        (squares / (count - 1) as f64).sqrt()
    });
    Some(Summary { count, mean, std })
}

fn percentage(samples: &[f64], predicate: impl Fn(f64) -> bool) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let hits = samples.iter().filter(|&&x| predicate(x)).count();
    Some(100.0 * hits as f64 / samples.len() as f64)
}

/// Describes how often each run's observable sits beyond the crystal thresholds.
///
/// Every run gets its mean and sample standard deviation. With only a closed threshold
/// the table reports the share of frames above it; with both thresholds the frames are
/// split into three disjoint bins: at or below closed, between closed (exclusive) and
/// opened (inclusive), and above opened. Percentages are taken over the defined
/// samples of each run, so a run with no samples has undefined cells throughout.
#[instrument(skip_all, name = "statistics_workflow")]
pub fn opening_statistics(frames: &FrameTable, thresholds: &Thresholds) -> StatisticsTable {
    let samples: Vec<Vec<f64>> = (0..frames.columns().len())
        .map(|i| frames.samples(i))
        .collect();
    let summaries: Vec<Option<Summary>> = samples.iter().map(|s| summarize(s)).collect();
    let closed = thresholds.closed();

    let mut table = StatisticsTable::new(frames.columns().to_vec());
    table.push_row("mean", summaries.iter().map(|s| s.map(|s| s.mean)).collect());
    table.push_row("std", summaries.iter().map(|s| s.and_then(|s| s.std)).collect());

    // Threshold rows repeat the threshold under every run that has data.
    let constant = |value: f64| -> Vec<Option<f64>> {
        summaries.iter().map(|s| s.map(|_| value)).collect()
    };

    match thresholds.opened() {
        None => {
            table.push_row("threshold", constant(closed));
            table.push_row(
                format!("% > {closed}"),
                samples.iter().map(|s| percentage(s, |x| x > closed)).collect(),
            );
        }
        Some(opened) => {
            table.push_row("threshold closed", constant(closed));
            table.push_row("threshold opened", constant(opened));
            table.push_row(
                format!("% <= {closed}"),
                samples.iter().map(|s| percentage(s, |x| x <= closed)).collect(),
            );
            table.push_row(
                format!("% {closed} < x <= {opened}"),
                samples
                    .iter()
                    .map(|s| percentage(s, |x| x > closed && x <= opened))
                    .collect(),
            );
            table.push_row(
                format!("% > {opened}"),
                samples.iter().map(|s| percentage(s, |x| x > opened)).collect(),
            );
        }
    }

    info!(
        "Computed opening statistics for {} runs over {} frames",
        frames.columns().len(),
        frames.len()
    );
    table
}
