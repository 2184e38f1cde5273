use crate::core::io::traits::{RecordRewriter, RewriteError, RewriteStats};
use crate::engine::config::MappingConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::rewriter::BfactorRewriter;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingSummary {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub column: String,
    pub stats: RewriteStats,
}

/// Maps the selected table column onto the temperature factor field of `source`.
///
/// The source is read in a single pass. Output goes to a temporary file in the
/// destination directory, which is renamed over the destination only after every line
/// was rewritten and flushed. Any failure leaves the destination untouched and removes
/// the temporary file; both file handles are released on every exit path. The output
/// carries the permissions of the source file.
///
/// # Errors
///
/// * [`EngineError::Resource`] if the source cannot be opened for reading, the
///   destination is an existing directory, or no file can be created in the destination
///   directory. Nothing is read or written in that case.
/// * [`EngineError::Record`] for the first atom record that cannot be rewritten.
/// * [`EngineError::Read`] if reading the source fails while draining.
/// * [`EngineError::Io`] if writing or committing the output fails, including a
///   destination the final rename cannot replace.
#[instrument(skip_all, name = "mapping_workflow", fields(column = config.column.name()))]
pub fn run(
    source: &Path,
    config: &MappingConfig,
    reporter: &ProgressReporter,
) -> Result<MappingSummary, EngineError> {
    let destination = config.destination_for(source);
    info!(
        "Mapping column '{}' from {:?} to {:?}",
        config.column.name(),
        source,
        destination
    );

    let source_file = File::open(source).map_err(|e| EngineError::Resource {
        path: source.to_path_buf(),
        source: e,
    })?;
    let metadata = source_file.metadata().map_err(|e| EngineError::Resource {
        path: source.to_path_buf(),
        source: e,
    })?;

    if destination.is_dir() {
        return Err(EngineError::Resource {
            path: destination,
            source: io::ErrorKind::IsADirectory.into(),
        });
    }

    let staging_dir = match destination.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let staging = NamedTempFile::new_in(&staging_dir).map_err(|e| EngineError::Resource {
        path: destination.clone(),
        source: e,
    })?;
    debug!("Staging output in {:?}", staging.path());

    reporter.report(Progress::FileStart {
        path: source.display().to_string(),
        total_bytes: metadata.len(),
    });

    let rewriter = BfactorRewriter::new(config);
    let mut reader = BufReader::new(source_file);
    let mut writer = BufWriter::new(staging);
    let stats = rewriter
        .rewrite_stream(&mut reader, &mut writer, |outcome, bytes| {
            reporter.report(Progress::LineProcessed { bytes, outcome })
        })
        .map_err(|err| match err {
            RewriteError::Record(record) => EngineError::Record(record),
            RewriteError::Read(e) => EngineError::Read {
                path: source.to_path_buf(),
                source: e,
            },
            RewriteError::Write(e) => EngineError::Io {
                path: destination.clone(),
                source: e,
            },
        })?;

    let staging = writer.into_inner().map_err(|e| EngineError::Io {
        path: destination.clone(),
        source: e.into_error(),
    })?;
    staging
        .as_file()
        .set_permissions(metadata.permissions())
        .map_err(|e| EngineError::Io {
            path: destination.clone(),
            source: e,
        })?;
    staging
        .persist(&destination)
        .map_err(|e| EngineError::Io {
            path: destination.clone(),
            source: e.error,
        })?;

    reporter.report(Progress::FileFinish { stats });
    if stats.placeholders > 0 {
        reporter.report(Progress::Message(format!(
            "{} atom record(s) had no value in column '{}' ({} placeholder)",
            stats.placeholders,
            config.column.name(),
            config.missing_value
        )));
    }
    info!(
        "Wrote {:?}: {} lines, {} atom records rewritten, {} placeholders",
        destination, stats.lines, stats.rewritten, stats.placeholders
    );

    Ok(MappingSummary {
        source: source.to_path_buf(),
        destination,
        column: config.column.name().to_string(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::table::ObservableTable;
    use crate::engine::config::{MappingConfigBuilder, MissingValuePolicy};
    use crate::engine::progress::ProgressCallback;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const ATOM_10: &str =
        "ATOM      1  CA  ALA A  10      11.104  13.207   2.100  1.00 20.00           C";
    const ATOM_100: &str =
        "ATOM      2  CA  ALA A 100      11.104  13.207   2.100  1.00 20.00           C";

    fn table() -> ObservableTable {
        let mut table = ObservableTable::new(["Classical", "Accelerated"]).unwrap();
        table
            .insert_row(10, vec![Some(197.21225), Some(828.368475)])
            .unwrap();
        table.insert_row(11, vec![Some(123456.0), None]).unwrap();
        table
    }

    fn write_source(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn dir_entries(dir: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn maps_column_into_derived_destination() {
        let dir = TempDir::new().unwrap();
        let content = format!("HEADER    TEST\n{ATOM_10}\n{ATOM_100}\nEND\n");
        let source = write_source(&dir, "model.pdb", &content);
        let t = table();
        let config = MappingConfigBuilder::new()
            .table(&t)
            .column("Classical")
            .build()
            .unwrap();

        let summary = run(&source, &config, &ProgressReporter::new()).unwrap();

        assert_eq!(summary.destination, dir.path().join("model_bfactors_Classical.pdb"));
        assert_eq!(
            summary.stats,
            RewriteStats {
                lines: 4,
                rewritten: 1,
                placeholders: 1,
                passed_through: 2,
            }
        );

        let output = fs::read_to_string(&summary.destination).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "HEADER    TEST");
        assert_eq!(&lines[1][61..66], "197.2");
        assert_eq!(&lines[2][61..66], "0.000");
        assert_eq!(lines[3], "END");
        assert_eq!(output.len(), content.len());
        assert_eq!(fs::read_to_string(&source).unwrap(), content);
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "model.pdb", &format!("{ATOM_10}\n{ATOM_100}\n"));
        let t = table();
        let first = dir.path().join("first.pdb");
        let second = dir.path().join("second.pdb");

        for destination in [&first, &second] {
            let config = MappingConfigBuilder::new()
                .table(&t)
                .column("Accelerated")
                .destination(destination.clone())
                .missing_value(MissingValuePolicy::Blank)
                .build()
                .unwrap();
            run(&source, &config, &ProgressReporter::new()).unwrap();
        }

        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }

    #[test]
    fn crlf_and_unterminated_last_line_are_preserved() {
        let dir = TempDir::new().unwrap();
        let content = format!("REMARK\r\n{ATOM_10}\r\n{ATOM_100}");
        let source = write_source(&dir, "model.pdb", &content);
        let t = table();
        let config = MappingConfigBuilder::new()
            .table(&t)
            .column("Classical")
            .destination(dir.path().join("out.pdb"))
            .build()
            .unwrap();

        let summary = run(&source, &config, &ProgressReporter::new()).unwrap();
        let output = fs::read_to_string(summary.destination).unwrap();

        let expected = content
            .replacen("20.00", "197.2", 1)
            .replacen("20.00", "0.000", 1);
        assert_eq!(output, expected);
    }

    #[test]
    fn format_error_leaves_no_destination_and_no_staging_file() {
        let dir = TempDir::new().unwrap();
        let bad = ATOM_10.replace("  10 ", "  11 ");
        let source = write_source(&dir, "model.pdb", &format!("{ATOM_10}\n{bad}\n"));
        let t = table();
        let config = MappingConfigBuilder::new()
            .table(&t)
            .column("Classical")
            .build()
            .unwrap();

        let err = run(&source, &config, &ProgressReporter::new()).unwrap_err();

        match err {
            EngineError::Record(record) => assert_eq!(record.line, 2),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(dir_entries(&dir), vec!["model.pdb"]);
    }

    #[test]
    fn existing_destination_survives_a_failed_run() {
        let dir = TempDir::new().unwrap();
        let short = &ATOM_10[..64];
        let source = write_source(&dir, "model.pdb", &format!("{short}\n"));
        let destination = write_source(&dir, "out.pdb", "previous result\n");
        let t = table();
        let config = MappingConfigBuilder::new()
            .table(&t)
            .column("Classical")
            .destination(destination.clone())
            .build()
            .unwrap();

        assert!(run(&source, &config, &ProgressReporter::new()).is_err());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "previous result\n");
        assert_eq!(dir_entries(&dir), vec!["model.pdb", "out.pdb"]);
    }

    #[test]
    fn missing_source_is_a_resource_error_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let t = table();
        let config = MappingConfigBuilder::new()
            .table(&t)
            .column("Classical")
            .output_dir(dir.path().to_path_buf())
            .build()
            .unwrap();

        let err = run(&dir.path().join("absent.pdb"), &config, &ProgressReporter::new())
            .unwrap_err();

        assert!(matches!(err, EngineError::Resource { .. }));
        assert!(dir_entries(&dir).is_empty());
    }

    #[test]
    fn non_utf8_remark_passes_through_byte_for_byte() {
        let dir = TempDir::new().unwrap();
        let remark: &[u8] = b"REMARK   1 AUTHOR M\xFCLLER\n";
        let source = dir.path().join("m.pdb");
        fs::write(&source, [remark, ATOM_10.as_bytes(), b"\n".as_slice()].concat()).unwrap();
        let t = table();
        let config = MappingConfigBuilder::new()
            .table(&t)
            .column("Classical")
            .build()
            .unwrap();

        let summary = run(&source, &config, &ProgressReporter::new()).unwrap();

        let rewritten = ATOM_10.replacen("20.00", "197.2", 1);
        let expected = [remark, rewritten.as_bytes(), b"\n".as_slice()].concat();
        assert_eq!(fs::read(&summary.destination).unwrap(), expected);
        assert_eq!(summary.stats.passed_through, 1);
        assert_eq!(summary.stats.rewritten, 1);
    }

    #[cfg(unix)]
    #[test]
    fn read_failure_is_reported_against_the_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("model");
        fs::create_dir(&source).unwrap();
        let t = table();
        let config = MappingConfigBuilder::new()
            .table(&t)
            .column("Classical")
            .build()
            .unwrap();

        let err = run(&source, &config, &ProgressReporter::new()).unwrap_err();

        assert!(matches!(err, EngineError::Read { ref path, .. } if *path == source));
        assert!(err.to_string().contains("reading"));
        assert_eq!(dir_entries(&dir), vec!["model"]);
    }

    #[test]
    fn directory_destination_is_rejected_before_draining() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "model.pdb", &format!("{ATOM_10}\n"));
        let destination = dir.path().join("out.pdb");
        fs::create_dir(&destination).unwrap();
        let t = table();
        let config = MappingConfigBuilder::new()
            .table(&t)
            .column("Classical")
            .destination(destination.clone())
            .build()
            .unwrap();

        let events = Mutex::new(Vec::new());
        let callback: ProgressCallback = Box::new(|event| events.lock().unwrap().push(event));
        let reporter = ProgressReporter::with_callback(callback);
        let err = run(&source, &config, &reporter).unwrap_err();
        drop(reporter);

        assert!(matches!(err, EngineError::Resource { ref path, .. } if *path == destination));
        assert!(events.into_inner().unwrap().is_empty());
        assert!(destination.is_dir());
        assert_eq!(dir_entries(&dir), vec!["model.pdb", "out.pdb"]);
    }

    #[cfg(unix)]
    #[test]
    fn output_takes_the_permissions_of_the_source() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "model.pdb", &format!("{ATOM_10}\n"));
        let t = table();
        let config = MappingConfigBuilder::new()
            .table(&t)
            .column("Classical")
            .build()
            .unwrap();

        for mode in [0o644, 0o640] {
            fs::set_permissions(&source, fs::Permissions::from_mode(mode)).unwrap();
            let summary = run(&source, &config, &ProgressReporter::new()).unwrap();
            let written = fs::metadata(&summary.destination).unwrap().permissions();
            assert_eq!(written.mode() & 0o777, mode);
        }
    }

    #[test]
    fn progress_events_cover_the_whole_file() {
        let dir = TempDir::new().unwrap();
        let content = format!("HEADER\n{ATOM_10}\n");
        let source = write_source(&dir, "model.pdb", &content);
        let t = table();
        let config = MappingConfigBuilder::new()
            .table(&t)
            .column("Classical")
            .build()
            .unwrap();

        let events = Mutex::new(Vec::new());
        let callback: ProgressCallback = Box::new(|event| events.lock().unwrap().push(event));
        let reporter = ProgressReporter::with_callback(callback);
        run(&source, &config, &reporter).unwrap();
        drop(reporter);

        let events = events.into_inner().unwrap();
        assert!(matches!(
            events.first(),
            Some(Progress::FileStart { total_bytes, .. }) if *total_bytes == content.len() as u64
        ));
        let bytes: u64 = events
            .iter()
            .filter_map(|e| match e {
                Progress::LineProcessed { bytes, .. } => Some(*bytes),
                _ => None,
            })
            .sum();
        assert_eq!(bytes, content.len() as u64);
        assert!(matches!(events.last(), Some(Progress::FileFinish { .. })));
    }
}
