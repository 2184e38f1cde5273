use super::config::{MappingConfig, MissingValuePolicy};
use crate::core::io::pdb::{
    RESERVED_FIELD_WIDTH, RecordError, RecordErrorKind, is_atom_record, reserved_field,
    resolve_residue_id, splice_field,
};
use crate::core::io::traits::{LineOutcome, RecordRewriter, Rewritten};
use crate::core::models::table::{ObservableTable, SelectedColumn};
use crate::core::utils::format::format_field;
use std::borrow::Cow;
use tracing::debug;

/// Rewrites the temperature factor field of atom records with values from an
/// [`ObservableTable`].
///
/// Atom records whose residue has no value in the selected column receive the
/// placeholder of the configured [`MissingValuePolicy`]. Every other line passes
/// through untouched.
pub struct BfactorRewriter<'a> {
    table: &'a ObservableTable,
    column: &'a SelectedColumn,
    missing_value: MissingValuePolicy,
}

impl<'a> BfactorRewriter<'a> {
    pub fn new(config: &'a MappingConfig<'a>) -> Self {
        Self {
            table: config.table,
            column: &config.column,
            missing_value: config.missing_value,
        }
    }

    fn placeholder<'l>(&self, line: &'l [u8]) -> Result<Cow<'l, [u8]>, RecordErrorKind> {
        match self.missing_value.placeholder() {
            Some(text) => splice_field(line, text).map(Cow::Owned),
            None => reserved_field(line).map(|_| Cow::Borrowed(line)),
        }
    }
}

impl RecordRewriter for BfactorRewriter<'_> {
    fn rewrite<'l>(
        &self,
        line_number: usize,
        line: &'l [u8],
    ) -> Result<Rewritten<'l>, RecordError> {
        if !is_atom_record(line) {
            return Ok(Rewritten::passed_through(line));
        }
        let at = |kind: RecordErrorKind| kind.at(line_number, line);

        let residue = resolve_residue_id(line).map_err(at)?;
        match self.table.value(residue, self.column) {
            Some(value) => {
                let field = format_field(value, RESERVED_FIELD_WIDTH).ok_or_else(|| {
                    at(RecordErrorKind::ValueOverflow {
                        residue,
                        value,
                        width: RESERVED_FIELD_WIDTH,
                    })
                })?;
                let rewritten = splice_field(line, &field).map_err(at)?;
                Ok(Rewritten {
                    line: Cow::Owned(rewritten),
                    outcome: LineOutcome::Rewritten,
                })
            }
            None => {
                debug!(
                    line = line_number,
                    residue,
                    column = self.column.name(),
                    policy = %self.missing_value,
                    "No value for residue; applying missing-value placeholder"
                );
                Ok(Rewritten {
                    line: self.placeholder(line).map_err(at)?,
                    outcome: LineOutcome::Placeholder,
                })
            }
        }
    }
}
