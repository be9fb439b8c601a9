// ********* Input data structures ***********

use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Display;

/// The issue assigned to a record when the source does not provide one.
pub const UNDEFINED_ISSUE: &str = "Undefined";

/// The content of a spreadsheet cell, as far as the reader could tell.
///
/// Date-formatted cells are read as their serial number.
#[derive(PartialEq, Debug, Clone)]
pub enum RawCell {
    Number(f64),
    Text(String),
    Empty,
}

impl RawCell {
    /// The textual rendering of the cell, or `None` if it is empty or blank.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawCell::Text(s) if s.trim().is_empty() => None,
            RawCell::Text(s) => Some(s.clone()),
            // f64 display drops the fractional part of integral values.
            RawCell::Number(n) => Some(n.to_string()),
            RawCell::Empty => None,
        }
    }
}

/// One data row of the source, keyed by the column names of the header row.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RawRecord {
    /// 1-based row number in the source, for diagnostics.
    pub row: usize,
    pub cells: IndexMap<String, RawCell>,
}

impl RawRecord {
    pub fn new(row: usize) -> RawRecord {
        RawRecord {
            row,
            cells: IndexMap::new(),
        }
    }

    pub fn with_cell(mut self, column: &str, cell: RawCell) -> RawRecord {
        self.insert(column, cell);
        self
    }

    pub fn insert(&mut self, column: &str, cell: RawCell) {
        self.cells.insert(column.to_string(), cell);
    }

    pub fn get(&self, column: &str) -> Option<&RawCell> {
        self.cells.get(column)
    }
}

/// The names of the source columns read by the normalizer.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FieldNames {
    pub issue: String,
    pub publication_date: String,
    pub disciplines: String,
    /// Separator of the multi-valued discipline field.
    pub discipline_delimiter: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        FieldNames {
            issue: "EDI Primary Case Issues".to_string(),
            publication_date: "Original Publication Date".to_string(),
            disciplines: "Disciplines".to_string(),
            discipline_delimiter: ";".to_string(),
        }
    }
}

// ******** Canonical store *********

fn undefined_issue() -> String {
    UNDEFINED_ISSUE.to_string()
}

/// A normalized source row. This is the only input of the aggregations.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(rename = "EDI Primary Case Issues", default = "undefined_issue")]
    pub issue: String,
    /// Serialized as `YYYY-MM-DD`.
    #[serde(rename = "Original Publication Date")]
    pub publication_date: NaiveDate,
    #[serde(rename = "Disciplines", default)]
    pub disciplines: Vec<String>,
}

impl CanonicalRecord {
    pub fn year(&self) -> i32 {
        self.publication_date.year()
    }

    /// The issue, falling back to the default label for records that were
    /// written by hand with an empty issue.
    pub fn issue_name(&self) -> &str {
        if self.issue.trim().is_empty() {
            UNDEFINED_ISSUE
        } else {
            self.issue.as_str()
        }
    }
}

/// The reason a source row was left out of the canonical store.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Exclusion {
    /// The date cell is absent or empty.
    MissingDate,
    /// The date cell matches none of the accepted encodings, or does not
    /// describe a valid calendar date.
    UnparsableDate { value: String },
}

impl Error for Exclusion {}

impl Display for Exclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Exclusion::MissingDate => write!(f, "missing publication date"),
            Exclusion::UnparsableDate { value } => {
                write!(f, "invalid publication date {:?}", value)
            }
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ExcludedRow {
    pub row: usize,
    pub reason: Exclusion,
}

/// What happened to the rows of one normalization pass.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct NormalizationReport {
    pub rows_read: usize,
    pub retained: usize,
    pub excluded: Vec<ExcludedRow>,
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct YearCount {
    pub year: i32,
    pub count: u64,
}

/// One bucket of the bar chart. (year, discipline, issue) is unique.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BarDatum {
    pub year: i32,
    pub discipline: String,
    pub issue: String,
    pub count: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SankeyNode {
    pub name: String,
}

/// A flow from `source` to `target`, both positions in `SankeyGraph::nodes`.
/// The value is the running total up to and including `year`.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SankeyLink {
    pub source: usize,
    pub target: usize,
    pub value: u64,
    pub year: i32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SankeyGraph {
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
}

/// Problems found in a Sankey graph that the renderers cannot draw.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SankeyCheckError {
    MissingRootNode,
    LinkOutOfRange {
        link: usize,
        index: usize,
    },
    NonMonotonic {
        target: String,
        year: i32,
        value: u64,
        previous: u64,
    },
}

impl Error for SankeyCheckError {}

impl Display for SankeyCheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SankeyCheckError::MissingRootNode => {
                write!(f, "the first node is not the root node")
            }
            SankeyCheckError::LinkOutOfRange { link, index } => {
                write!(f, "link #{} refers to missing node #{}", link, index)
            }
            SankeyCheckError::NonMonotonic {
                target,
                year,
                value,
                previous,
            } => write!(
                f,
                "cumulative value for {:?} decreases in {}: {} after {}",
                target, year, value, previous
            ),
        }
    }
}
