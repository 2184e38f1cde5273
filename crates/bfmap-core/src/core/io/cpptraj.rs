use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CpptrajError {
    #[error("File I/O error for '{origin}': {source}")]
    Io { origin: String, source: io::Error },
    #[error("Parse error in '{origin}' on line {line}: {message}")]
    Parse {
        origin: String,
        line: usize,
        message: String,
    },
    #[error("'{origin}' does not start with a '#' column header")]
    MissingHeader { origin: String },
}

/// Per-residue values read from one cpptraj data file, in file order.
///
/// Residue indices are the raw indices written by cpptraj, before any crystal
/// numbering offset is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueSeries {
    pub label: String,
    pub values: Vec<(isize, f64)>,
}

fn parse_index(token: &str) -> Option<isize> {
    if let Ok(index) = token.parse::<isize>() {
        return Some(index);
    }
    let value = token.parse::<f64>().ok()?;
    (value.fract() == 0.0 && value.is_finite()).then_some(value as isize)
}

/// Reads a whitespace-separated cpptraj data file.
///
/// The first non-blank line must be the column header (for example
/// `#Res  bfactors_backbone`). Every following non-blank, non-comment line holds a
/// residue index and at least one value; only the first value column is kept.
pub fn read_from(reader: impl BufRead, origin: &str) -> Result<ResidueSeries, CpptrajError> {
    let mut label = None;
    let mut values = Vec::new();

    for (idx, line_res) in reader.lines().enumerate() {
        let line = line_res.map_err(|source| CpptrajError::Io {
            origin: origin.to_string(),
            source,
        })?;
        let line_num = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if label.is_none() {
            if !trimmed.starts_with('#') {
                return Err(CpptrajError::MissingHeader {
                    origin: origin.to_string(),
                });
            }
            let header: Vec<&str> = trimmed.split_whitespace().collect();
            label = Some(header.get(1).copied().unwrap_or("value").to_string());
            continue;
        }
        if trimmed.starts_with('#') {
            continue;
        }

        let parse_err = |message: String| CpptrajError::Parse {
            origin: origin.to_string(),
            line: line_num,
            message,
        };
        let mut tokens = trimmed.split_whitespace();
        let index_str = tokens.next().unwrap_or_default();
        let index = parse_index(index_str)
            .ok_or_else(|| parse_err(format!("invalid residue index '{}'", index_str)))?;
        let value_str = tokens
            .next()
            .ok_or_else(|| parse_err("missing value column".to_string()))?;
        let value: f64 = value_str
            .parse()
            .map_err(|_| parse_err(format!("invalid value '{}'", value_str)))?;

        values.push((index, value));
    }

    match label {
        Some(label) => Ok(ResidueSeries { label, values }),
        None => Err(CpptrajError::MissingHeader {
            origin: origin.to_string(),
        }),
    }
}

pub fn read_path(path: &Path) -> Result<ResidueSeries, CpptrajError> {
    let origin = path.to_string_lossy().to_string();
    let file = File::open(path).map_err(|source| CpptrajError::Io {
        origin: origin.clone(),
        source,
    })?;
    read_from(BufReader::new(file), &origin)
}
