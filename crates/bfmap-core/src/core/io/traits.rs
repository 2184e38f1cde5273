use super::pdb::RecordError;
use std::borrow::Cow;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// What happened to one line during a rewrite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// The line is not an atom record and was copied verbatim.
    PassedThrough,
    /// The reserved field now carries a value from the table.
    Rewritten,
    /// No value was available and the missing-value placeholder was applied.
    Placeholder,
}

/// The result of rewriting one line, without its terminator.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewritten<'a> {
    pub line: Cow<'a, [u8]>,
    pub outcome: LineOutcome,
}

impl<'a> Rewritten<'a> {
    pub fn passed_through(line: &'a [u8]) -> Self {
        Self {
            line: Cow::Borrowed(line),
            outcome: LineOutcome::PassedThrough,
        }
    }
}

/// Counters collected over one rewrite pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub lines: usize,
    pub rewritten: usize,
    pub placeholders: usize,
    pub passed_through: usize,
}

impl RewriteStats {
    fn record(&mut self, outcome: LineOutcome) {
        self.lines += 1;
        match outcome {
            LineOutcome::PassedThrough => self.passed_through += 1,
            LineOutcome::Rewritten => self.rewritten += 1,
            LineOutcome::Placeholder => self.placeholders += 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Read error: {0}")]
    Read(#[source] io::Error),
    #[error("Write error: {0}")]
    Write(#[source] io::Error),
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Defines a line-by-line transformation of a structure file.
///
/// Lines are handled as raw bytes, so content in any encoding passes through intact.
/// Implementors decide how a single line is rewritten; the provided
/// [`rewrite_stream`](RecordRewriter::rewrite_stream) drives a complete single pass
/// from a reader to a writer.
pub trait RecordRewriter {
    /// Rewrites one line.
    ///
    /// # Arguments
    ///
    /// * `line_number` - The 1-based position of the line in the source.
    /// * `line` - The line bytes without their terminator.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordError`] carrying the line number and content when the line
    /// cannot be rewritten without corrupting the record layout.
    fn rewrite<'a>(
        &self,
        line_number: usize,
        line: &'a [u8],
    ) -> Result<Rewritten<'a>, RecordError>;

    /// Streams every line of `reader` through [`rewrite`](RecordRewriter::rewrite)
    /// into `writer`.
    ///
    /// Lines are processed strictly in source order and written immediately. The line
    /// terminator of every line (`\n`, `\r\n`, or none on a final unterminated line) is
    /// reproduced exactly. `on_line` is called once per processed line with its outcome
    /// and the number of source bytes it occupied, terminator included.
    ///
    /// # Errors
    ///
    /// Stops at the first read, write or record error; whatever was written to `writer`
    /// up to that point must be treated as invalid.
    fn rewrite_stream(
        &self,
        reader: &mut impl BufRead,
        writer: &mut impl Write,
        mut on_line: impl FnMut(LineOutcome, u64),
    ) -> Result<RewriteStats, RewriteError> {
        let mut stats = RewriteStats::default();
        let mut buffer = Vec::new();
        let mut line_number = 0;

        loop {
            buffer.clear();
            let consumed = reader
                .read_until(b'\n', &mut buffer)
                .map_err(RewriteError::Read)?;
            if consumed == 0 {
                break;
            }
            line_number += 1;

            let (content, terminator) = split_terminator(&buffer);
            let rewritten = self.rewrite(line_number, content)?;
            writer
                .write_all(&rewritten.line)
                .map_err(RewriteError::Write)?;
            writer.write_all(terminator).map_err(RewriteError::Write)?;

            stats.record(rewritten.outcome);
            on_line(rewritten.outcome, consumed as u64);
        }

        writer.flush().map_err(RewriteError::Write)?;
        Ok(stats)
    }
}

fn split_terminator(line: &[u8]) -> (&[u8], &[u8]) {
    if let Some(content) = line.strip_suffix(b"\r\n") {
        (content, b"\r\n")
    } else if let Some(content) = line.strip_suffix(b"\n") {
        (content, b"\n")
    } else {
        (line, b"")
    }
}
