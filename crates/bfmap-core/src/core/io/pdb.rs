use std::ops::Range;
use thiserror::Error;
use tracing::trace;

/// Record-type marker of the lines eligible for rewriting.
pub const ATOM_RECORD_MARKER: &[u8] = b"ATOM";

/// Byte range (0-indexed, half-open) of the reserved temperature factor field.
pub const RESERVED_FIELD: Range<usize> = 61..66;

/// Width of the reserved field in bytes.
pub const RESERVED_FIELD_WIDTH: usize = RESERVED_FIELD.end - RESERVED_FIELD.start;

/// Whitespace token that normally carries the residue identifier.
pub const RESIDUE_TOKEN: usize = 5;

/// Token tried when the atom name and residue name were written without a separating space.
pub const RESIDUE_TOKEN_FALLBACK: usize = 4;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("Record error on line {line}: {kind} (line: '{content}')")]
pub struct RecordError {
    pub line: usize,
    /// The offending line, with any non-UTF-8 bytes replaced for display.
    pub content: String,
    pub kind: RecordErrorKind,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordErrorKind {
    #[error(
        "Residue identifier is not an integer at token {primary} (found {primary_token:?}) nor at fallback token {fallback} (found {fallback_token:?})"
    )]
    UnresolvedResidue {
        primary: usize,
        primary_token: Option<String>,
        fallback: usize,
        fallback_token: Option<String>,
    },
    #[error("Line is too short for the reserved field (needs at least {required} bytes, found {found})")]
    LineTooShort { required: usize, found: usize },
    #[error("Replacement '{field}' is not exactly {width} ASCII characters")]
    FieldWidth { field: String, width: usize },
    #[error("Value {value} for residue {residue} does not fit into {width} characters")]
    ValueOverflow {
        residue: isize,
        value: f64,
        width: usize,
    },
}

impl RecordErrorKind {
    pub fn at(self, line: usize, content: &[u8]) -> RecordError {
        RecordError {
            line,
            content: String::from_utf8_lossy(content).into_owned(),
            kind: self,
        }
    }
}

/// Returns `true` if the line is an atom coordinate record.
///
/// Lines are opaque bytes; no encoding is assumed.
pub fn is_atom_record(line: &[u8]) -> bool {
    let is_atom = line.starts_with(ATOM_RECORD_MARKER);
    trace!(is_atom, "Classified line: {}", String::from_utf8_lossy(line));
    is_atom
}

fn tokens(line: &[u8]) -> Vec<&[u8]> {
    line.split(|b| b.is_ascii_whitespace())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Extracts the residue identifier from an atom record.
///
/// The identifier is read from whitespace token [`RESIDUE_TOKEN`]. Some record
/// generators omit the space between the atom name and the residue name, which merges
/// the two tokens and shifts every later token one position to the left; in that case
/// the identifier is read from [`RESIDUE_TOKEN_FALLBACK`]. Nothing further is guessed.
pub fn resolve_residue_id(line: &[u8]) -> Result<isize, RecordErrorKind> {
    let tokens = tokens(line);
    let parse_at = |idx: usize| {
        tokens
            .get(idx)
            .and_then(|t| std::str::from_utf8(t).ok())
            .and_then(|t| t.parse::<isize>().ok())
    };
    let token_at = |idx: usize| {
        tokens
            .get(idx)
            .map(|t| String::from_utf8_lossy(t).into_owned())
    };

    if let Some(residue) = parse_at(RESIDUE_TOKEN) {
        return Ok(residue);
    }
    if let Some(residue) = parse_at(RESIDUE_TOKEN_FALLBACK) {
        trace!(residue, "Residue identifier resolved at fallback token");
        return Ok(residue);
    }

    Err(RecordErrorKind::UnresolvedResidue {
        primary: RESIDUE_TOKEN,
        primary_token: token_at(RESIDUE_TOKEN),
        fallback: RESIDUE_TOKEN_FALLBACK,
        fallback_token: token_at(RESIDUE_TOKEN_FALLBACK),
    })
}

/// Returns the current bytes of the reserved field.
pub fn reserved_field(line: &[u8]) -> Result<&[u8], RecordErrorKind> {
    line.get(RESERVED_FIELD).ok_or(RecordErrorKind::LineTooShort {
        required: RESERVED_FIELD.end,
        found: line.len(),
    })
}

/// Replaces the reserved field of `line` with `field`.
///
/// The result has the same length as `line` and differs from it only inside
/// [`RESERVED_FIELD`].
pub fn splice_field(line: &[u8], field: &str) -> Result<Vec<u8>, RecordErrorKind> {
    if field.len() != RESERVED_FIELD_WIDTH || !field.is_ascii() {
        return Err(RecordErrorKind::FieldWidth {
            field: field.to_string(),
            width: RESERVED_FIELD_WIDTH,
        });
    }
    reserved_field(line)?;

    let mut spliced = Vec::with_capacity(line.len());
    spliced.extend_from_slice(&line[..RESERVED_FIELD.start]);
    spliced.extend_from_slice(field.as_bytes());
    spliced.extend_from_slice(&line[RESERVED_FIELD.end..]);
    Ok(spliced)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATOM_LINE: &[u8] =
        b"ATOM      1  CA  ALA A  10      11.104  13.207   2.100  1.00 20.00           C";
    const MERGED_NAME_LINE: &[u8] =
        b"ATOM   1234  HD21ASN A 100      11.104  13.207   2.100  1.00 20.00           H";
    const NO_CHAIN_LINE: &[u8] =
        b"ATOM      2  CA  ALA  100      11.104  13.207   2.100  1.00 20.00";

    #[test]
    fn only_lines_starting_with_atom_are_atom_records() {
        assert!(is_atom_record(ATOM_LINE));
        assert!(is_atom_record(b"ATOM"));
        assert!(!is_atom_record(b"HETATM    1  O   HOH A 201"));
        assert!(!is_atom_record(b"ANISOU    1  CA  ALA A  10"));
        assert!(!is_atom_record(b" ATOM      1  CA  ALA A  10"));
        assert!(!is_atom_record(b"HEADER    HYDROLASE"));
        assert!(!is_atom_record(b"REMARK   1 AUTHOR M\xFCLLER"));
        assert!(!is_atom_record(b"TER"));
        assert!(!is_atom_record(b""));
    }

    #[test]
    fn resolves_residue_at_conventional_token() {
        assert_eq!(resolve_residue_id(ATOM_LINE), Ok(10));
    }

    #[test]
    fn resolves_residue_when_atom_and_residue_names_merge() {
        assert_eq!(resolve_residue_id(MERGED_NAME_LINE), Ok(100));
    }

    #[test]
    fn resolves_residue_when_chain_is_missing() {
        assert_eq!(resolve_residue_id(NO_CHAIN_LINE), Ok(100));
    }

    #[test]
    fn unresolvable_residue_reports_both_positions() {
        let line = b"ATOM      1  CA  ALA A  XX      YY";
        let err = resolve_residue_id(line).unwrap_err();
        assert_eq!(
            err,
            RecordErrorKind::UnresolvedResidue {
                primary: 5,
                primary_token: Some("XX".into()),
                fallback: 4,
                fallback_token: Some("A".into()),
            }
        );
    }

    #[test]
    fn unresolvable_residue_on_truncated_record() {
        let err = resolve_residue_id(b"ATOM      1").unwrap_err();
        assert!(matches!(
            err,
            RecordErrorKind::UnresolvedResidue {
                primary_token: None,
                fallback_token: None,
                ..
            }
        ));
    }

    #[test]
    fn splice_replaces_only_the_reserved_field() {
        let spliced = splice_field(ATOM_LINE, "197.2").unwrap();
        assert_eq!(spliced.len(), ATOM_LINE.len());
        assert_eq!(&spliced[..61], &ATOM_LINE[..61]);
        assert_eq!(&spliced[61..66], b"197.2");
        assert_eq!(&spliced[66..], &ATOM_LINE[66..]);
    }

    #[test]
    fn splice_accepts_line_ending_at_field_end() {
        let line = &ATOM_LINE[..66];
        assert_eq!(reserved_field(line), Ok(&b"20.00"[..]));
        let spliced = splice_field(line, "0.000").unwrap();
        assert!(spliced.ends_with(b"  1.00 0.000"));
    }

    #[test]
    fn splice_rejects_short_lines() {
        let line = b"ATOM      1  CA  ALA A  10      0.000   0.000   0.000  1.00  0.00";
        assert_eq!(line.len(), 65);
        assert_eq!(
            splice_field(line, "197.2"),
            Err(RecordErrorKind::LineTooShort {
                required: 66,
                found: 65
            })
        );
    }

    #[test]
    fn splice_rejects_fields_of_wrong_width() {
        assert!(matches!(
            splice_field(ATOM_LINE, "197.21"),
            Err(RecordErrorKind::FieldWidth { width: 5, .. })
        ));
        assert!(matches!(
            splice_field(ATOM_LINE, "1.0"),
            Err(RecordErrorKind::FieldWidth { .. })
        ));
    }

    #[test]
    fn splice_keeps_non_utf8_bytes_outside_the_field() {
        let mut line = ATOM_LINE.to_vec();
        line[77] = 0xE9;
        line.push(0xFF);
        let spliced = splice_field(&line, "1.000").unwrap();
        assert_eq!(spliced.len(), line.len());
        assert_eq!(&spliced[61..66], b"1.000");
        assert_eq!(&spliced[66..], &line[66..]);
    }

    #[test]
    fn record_error_carries_line_context() {
        let err = RecordErrorKind::LineTooShort {
            required: 66,
            found: 5,
        }
        .at(3, b"ATOM\xFF");
        assert_eq!(err.line, 3);
        assert_eq!(err.content, "ATOM\u{FFFD}");
        assert!(err.to_string().contains("line 3"));
    }
}
