use log::{debug, warn};

pub use crate::config::*;
use crate::normalize::normalize;

/// A builder for the canonical store.
///
/// Rows are normalized as they are added. Rows that cannot be normalized are
/// dropped and recorded in the report returned by `build`.
///
/// ```
/// use case_aggregates::builder::StoreBuilder;
/// use case_aggregates::{FieldNames, RawCell, RawRecord};
///
/// let mut builder = StoreBuilder::new(&FieldNames::default());
/// builder.add_raw(
///     &RawRecord::new(2)
///         .with_cell("EDI Primary Case Issues", RawCell::Text("Bias".to_string()))
///         .with_cell("Original Publication Date", RawCell::Number(44927.0)),
/// );
/// builder.add_raw(
///     &RawRecord::new(3)
///         .with_cell("Original Publication Date", RawCell::Text("not-a-date".to_string())),
/// );
///
/// let (store, report) = builder.build();
/// assert_eq!(store.len(), 1);
/// assert_eq!(report.excluded.len(), 1);
/// ```
pub struct StoreBuilder {
    pub(crate) _fields: FieldNames,
    pub(crate) _records: Vec<CanonicalRecord>,
    pub(crate) _excluded: Vec<ExcludedRow>,
    pub(crate) _rows_read: usize,
}

impl StoreBuilder {
    pub fn new(fields: &FieldNames) -> StoreBuilder {
        StoreBuilder {
            _fields: fields.clone(),
            _records: Vec::new(),
            _excluded: Vec::new(),
            _rows_read: 0,
        }
    }

    /// Normalizes and adds a row.
    ///
    /// Returns false if the row was excluded.
    pub fn add_raw(&mut self, raw: &RawRecord) -> bool {
        self._rows_read += 1;
        match normalize(raw, &self._fields) {
            Ok(rec) => {
                debug!("add_raw: row {}: {:?}", raw.row, rec);
                self._records.push(rec);
                true
            }
            Err(reason) => {
                warn!("Excluding row {}: {}", raw.row, reason);
                self._excluded.push(ExcludedRow {
                    row: raw.row,
                    reason,
                });
                false
            }
        }
    }

    pub fn add_all(&mut self, raws: &[RawRecord]) {
        for raw in raws {
            self.add_raw(raw);
        }
    }

    pub fn build(self) -> (Vec<CanonicalRecord>, NormalizationReport) {
        let report = NormalizationReport {
            rows_read: self._rows_read,
            retained: self._records.len(),
            excluded: self._excluded,
        };
        (self._records, report)
    }
}
