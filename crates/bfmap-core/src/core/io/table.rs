use crate::core::models::series::{FrameTable, StatisticsTable};
use crate::core::models::table::{ObservableTable, TableModelError};
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

/// Header written for the residue column of observable tables.
pub const RESIDUE_HEADER: &str = "residue";
/// Header written for the frame column of frame tables.
pub const FRAME_HEADER: &str = "frame";

#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV error for '{origin}': {source}")]
    Csv { origin: String, source: csv::Error },
    #[error("Invalid {what} '{value}' in '{origin}' at data record {record}")]
    InvalidCell {
        origin: String,
        record: usize,
        what: &'static str,
        value: String,
    },
    #[error("Malformed table '{origin}': {source}")]
    Model {
        origin: String,
        source: TableModelError,
    },
}

struct RawTable {
    columns: Vec<String>,
    rows: Vec<(isize, Vec<Option<f64>>)>,
}

fn parse_cell(raw: &str) -> Option<Result<f64, ()>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return None;
    }
    Some(raw.parse::<f64>().map_err(|_| ()))
}

fn read_raw<R: Read>(reader: R, origin: &str) -> Result<RawTable, TableError> {
    let csv_err = |source| TableError::Csv {
        origin: origin.to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_err)?.clone();
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(csv_err)?;
        let record_num = idx + 1;
        let key_str = record.get(0).unwrap_or("");
        let key: isize = key_str.parse().map_err(|_| TableError::InvalidCell {
            origin: origin.to_string(),
            record: record_num,
            what: "index",
            value: key_str.to_string(),
        })?;

        let mut cells = Vec::with_capacity(columns.len());
        for raw in record.iter().skip(1) {
            let cell = parse_cell(raw)
                .transpose()
                .map_err(|_| TableError::InvalidCell {
                    origin: origin.to_string(),
                    record: record_num,
                    what: "value",
                    value: raw.to_string(),
                })?;
            cells.push(cell);
        }
        rows.push((key, cells));
    }

    Ok(RawTable { columns, rows })
}

/// Reads an observable table whose first column holds residue identifiers.
///
/// Empty cells and `NaN` are read as undefined values.
pub fn read_observable_from<R: Read>(
    reader: R,
    origin: &str,
) -> Result<ObservableTable, TableError> {
    let raw = read_raw(reader, origin)?;
    let model_err = |source| TableError::Model {
        origin: origin.to_string(),
        source,
    };
    let mut table = ObservableTable::new(raw.columns).map_err(model_err)?;
    for (residue, cells) in raw.rows {
        table.insert_row(residue, cells).map_err(model_err)?;
    }
    Ok(table)
}

pub fn read_observable_csv(path: &Path) -> Result<ObservableTable, TableError> {
    let origin = path.to_string_lossy().to_string();
    let file = std::fs::File::open(path).map_err(|e| TableError::Csv {
        origin: origin.clone(),
        source: e.into(),
    })?;
    read_observable_from(file, &origin)
}

/// Reads a frame table whose first column holds frame numbers.
pub fn read_frames_from<R: Read>(reader: R, origin: &str) -> Result<FrameTable, TableError> {
    let raw = read_raw(reader, origin)?;
    let model_err = |source| TableError::Model {
        origin: origin.to_string(),
        source,
    };
    let mut table = FrameTable::new(raw.columns).map_err(model_err)?;
    for (frame, cells) in raw.rows {
        table.push_frame(frame, cells).map_err(model_err)?;
    }
    Ok(table)
}

pub fn read_frames_csv(path: &Path) -> Result<FrameTable, TableError> {
    let origin = path.to_string_lossy().to_string();
    let file = std::fs::File::open(path).map_err(|e| TableError::Csv {
        origin: origin.clone(),
        source: e.into(),
    })?;
    read_frames_from(file, &origin)
}

fn render_cell(cell: Option<f64>) -> String {
    cell.map(|v| v.to_string()).unwrap_or_default()
}

pub fn write_observable_to<W: Write>(
    table: &ObservableTable,
    writer: W,
    origin: &str,
) -> Result<(), TableError> {
    let csv_err = |source| TableError::Csv {
        origin: origin.to_string(),
        source,
    };
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec![RESIDUE_HEADER.to_string()];
    header.extend(table.columns().iter().cloned());
    writer.write_record(&header).map_err(csv_err)?;

    for (residue, cells) in table.rows() {
        let mut record = Vec::with_capacity(cells.len() + 1);
        record.push(residue.to_string());
        record.extend(cells.iter().copied().map(render_cell));
        writer.write_record(&record).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| csv_err(e.into()))
}

pub fn write_observable_csv(table: &ObservableTable, path: &Path) -> Result<(), TableError> {
    let origin = path.to_string_lossy().to_string();
    let file = std::fs::File::create(path).map_err(|e| TableError::Csv {
        origin: origin.clone(),
        source: e.into(),
    })?;
    write_observable_to(table, file, &origin)
}

/// Writes a statistics table with its row labels in the first column.
pub fn write_statistics_to<W: Write>(
    table: &StatisticsTable,
    writer: W,
    origin: &str,
) -> Result<(), TableError> {
    let csv_err = |source| TableError::Csv {
        origin: origin.to_string(),
        source,
    };
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec![String::new()];
    header.extend(table.columns().iter().cloned());
    writer.write_record(&header).map_err(csv_err)?;

    for row in table.rows() {
        let mut record = Vec::with_capacity(row.cells.len() + 1);
        record.push(row.label.clone());
        record.extend(
            row.cells
                .iter()
                .map(|c| c.map(|v| format!("{v:.1}")).unwrap_or_default()),
        );
        writer.write_record(&record).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| csv_err(e.into()))
}
