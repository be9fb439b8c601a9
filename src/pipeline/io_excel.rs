use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use std::collections::HashMap;

use crate::pipeline::*;

/// Reads the rows of a workbook, using the first row as the column names.
///
/// The first worksheet is used unless a worksheet name is provided.
pub fn read_excel_file(path: &str, worksheet_name: Option<&str>) -> PipelineResult<Vec<RawRecord>> {
    let wrange = get_range(path, worksheet_name)?;
    read_range(path, &wrange)
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> PipelineResult<Range<DataType>> {
    debug!(
        "read_excel_file: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(name) = worksheet_name {
        workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?
            .context(OpeningExcelSnafu { path })
    } else {
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })
    }
}

/// Converts a worksheet to raw records. The row numbers of the records are the
/// ones displayed by spreadsheet programs.
pub fn read_range(path: &str, wrange: &Range<DataType>) -> PipelineResult<Vec<RawRecord>> {
    let mut iter = wrange.rows();
    let header = iter.next().context(MissingHeaderSnafu { path })?;
    let columns = header_names(header);
    debug!("read_range: header: {:?}", columns);

    let header_row = wrange.start().map(|(r, _)| r as usize).unwrap_or(0) + 1;
    let mut res: Vec<RawRecord> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let mut raw = RawRecord::new(header_row + idx + 1);
        for (column, cell) in columns.iter().zip(row.iter()) {
            if let Some(name) = column {
                raw.insert(name, read_cell(cell));
            }
        }
        if raw.cells.values().all(|c| *c == RawCell::Empty) {
            debug!("read_range: skipping blank row {}", raw.row);
            continue;
        }
        debug!("read_range: {:?}", raw);
        res.push(raw);
    }
    Ok(res)
}

/// The column names. Blank header cells give `None`, repeated names get a
/// `_1`, `_2`, ... suffix.
fn header_names(header: &[DataType]) -> Vec<Option<String>> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .map(|cell| {
            let name = read_cell(cell).as_text()?.trim().to_string();
            let n = seen.entry(name.clone()).or_insert(0);
            let unique = if *n == 0 {
                name
            } else {
                format!("{}_{}", name, n)
            };
            *n += 1;
            Some(unique)
        })
        .collect()
}

fn read_cell(cell: &DataType) -> RawCell {
    match cell {
        DataType::String(s) => RawCell::Text(s.clone()),
        DataType::Float(f) => RawCell::Number(*f),
        DataType::Int(i) => RawCell::Number(*i as f64),
        // Serial number of the date.
        DataType::DateTime(f) => RawCell::Number(*f),
        DataType::Bool(b) => RawCell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        DataType::Error(e) => {
            debug!("read_cell: error cell {:?} read as empty", e);
            RawCell::Empty
        }
        DataType::Empty => RawCell::Empty,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn s(x: &str) -> DataType {
        DataType::String(x.to_string())
    }

    pub(crate) fn sheet(rows: &[Vec<DataType>]) -> Range<DataType> {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let mut r: Range<DataType> = Range::new((0, 0), (height - 1, width - 1));
        for (i, row) in rows.iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                r.set_value((i as u32, j as u32), cell.clone());
            }
        }
        r
    }

    #[test]
    fn header_and_cells() {
        let r = sheet(&[
            vec![
                s("EDI Primary Case Issues"),
                s("Original Publication Date"),
                s("Disciplines"),
            ],
            vec![s("Bias"), DataType::DateTime(44941.0), s("Medicine; Law")],
            vec![s("Bias"), s("2023-06-01"), DataType::Empty],
            vec![DataType::Empty, DataType::Int(44927), DataType::Float(12.0)],
        ]);
        let records = read_range("test.xlsx", &r).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].row, 2);
        assert_eq!(
            records[0].get("Original Publication Date"),
            Some(&RawCell::Number(44941.0))
        );
        assert_eq!(
            records[1].get("Original Publication Date"),
            Some(&RawCell::Text("2023-06-01".to_string()))
        );
        assert_eq!(records[1].get("Disciplines"), Some(&RawCell::Empty));
        assert_eq!(records[2].row, 4);
        assert_eq!(records[2].get("Disciplines"), Some(&RawCell::Number(12.0)));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let r = sheet(&[
            vec![s("Original Publication Date"), s("Other")],
            vec![DataType::Empty, DataType::Empty],
            vec![s("2020-01-01"), DataType::Error(calamine::CellErrorType::NA)],
        ]);
        let records = read_range("test.xlsx", &r).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].row, 3);
        assert_eq!(records[0].get("Other"), Some(&RawCell::Empty));
    }

    #[test]
    fn header_names_are_unique() {
        let names = header_names(&[
            s("Issue"),
            DataType::Empty,
            s(" Issue "),
            s("   "),
            DataType::Bool(true),
            s("Issue"),
        ]);
        assert_eq!(
            names,
            vec![
                Some("Issue".to_string()),
                None,
                Some("Issue_1".to_string()),
                None,
                Some("TRUE".to_string()),
                Some("Issue_2".to_string()),
            ]
        );
    }

    #[test]
    fn empty_sheet_has_no_header() {
        let r: Range<DataType> = Range::empty();
        assert!(matches!(
            read_range("test.xlsx", &r),
            Err(PipelineError::MissingHeader { .. })
        ));
    }

    #[test]
    fn missing_workbook() {
        let res = read_excel_file("/nonexistent/cases.xlsx", None);
        assert!(matches!(res, Err(PipelineError::OpeningExcel { .. })));
    }

    #[test]
    fn rows_feed_the_normalizer() {
        let r = sheet(&[
            vec![
                s("EDI Primary Case Issues"),
                s("Original Publication Date"),
                s("Disciplines"),
            ],
            vec![s("Bias"), DataType::DateTime(44941.0), s("Medicine; Law")],
            vec![s("Pay"), s("not-a-date"), s("Law")],
        ]);
        let records = read_range("test.xlsx", &r).unwrap();
        let mut builder = StoreBuilder::new(&FieldNames::default());
        builder.add_all(&records);
        let (store, report) = builder.build();
        assert_eq!(store.len(), 1);
        assert_eq!(store[0].disciplines, vec!["Medicine", "Law"]);
        assert_eq!(report.excluded.len(), 1);
        assert_eq!(report.excluded[0].row, 3);
    }
}
