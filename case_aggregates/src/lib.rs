mod config;
mod normalize;
mod sankey;

pub mod builder;
pub mod manual;

use indexmap::IndexMap;
use log::debug;

pub use crate::config::*;
pub use crate::normalize::{normalize, normalize_date, split_disciplines};
pub use crate::sankey::{aggregate_for_sankey, ROOT_NODE_NAME};

/// Counts the records of each publication year.
///
/// The years are listed in the order they first appear in `records`, they are
/// not sorted.
pub fn aggregate_by_year(records: &[CanonicalRecord]) -> Vec<YearCount> {
    let mut counts: IndexMap<i32, u64> = IndexMap::new();
    for r in records {
        *counts.entry(r.year()).or_insert(0) += 1;
    }
    debug!(
        "aggregate_by_year: {} records, {} years",
        records.len(),
        counts.len()
    );
    counts
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect()
}

/// Counts the records for each (year, discipline, issue).
///
/// A record is counted once for each of its disciplines, so the total of the
/// counts may exceed the number of records. Records without discipline are
/// not counted. The result is sorted by year. Within a year, disciplines and
/// then issues keep the order in which they were first seen.
pub fn aggregate_for_bar_chart(records: &[CanonicalRecord]) -> Vec<BarDatum> {
    let mut by_year: IndexMap<i32, IndexMap<&str, IndexMap<&str, u64>>> = IndexMap::new();
    for r in records {
        let issue = r.issue_name();
        for discipline in r.disciplines.iter() {
            *by_year
                .entry(r.year())
                .or_default()
                .entry(discipline.as_str())
                .or_default()
                .entry(issue)
                .or_insert(0) += 1;
        }
    }

    let mut res: Vec<BarDatum> = Vec::new();
    for (year, by_discipline) in by_year.iter() {
        for (discipline, by_issue) in by_discipline.iter() {
            for (issue, count) in by_issue.iter() {
                res.push(BarDatum {
                    year: *year,
                    discipline: discipline.to_string(),
                    issue: issue.to_string(),
                    count: *count,
                });
            }
        }
    }
    // Stable: the first-seen order is kept within a year.
    res.sort_by_key(|b| b.year);
    debug!("aggregate_for_bar_chart: {} buckets", res.len());
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StoreBuilder;
    use chrono::NaiveDate;

    fn rec(issue: &str, date: &str, disciplines: &[&str]) -> CanonicalRecord {
        CanonicalRecord {
            issue: issue.to_string(),
            publication_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            disciplines: disciplines.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn bar(year: i32, discipline: &str, issue: &str, count: u64) -> BarDatum {
        BarDatum {
            year,
            discipline: discipline.to_string(),
            issue: issue.to_string(),
            count,
        }
    }

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    #[test]
    fn years_in_first_seen_order() {
        let records = vec![
            rec("A", "2021-01-01", &[]),
            rec("A", "2019-05-01", &[]),
            rec("B", "2021-12-31", &[]),
            rec("C", "2020-02-02", &[]),
            rec("C", "2019-01-01", &[]),
        ];
        assert_eq!(
            aggregate_by_year(&records),
            vec![
                YearCount {
                    year: 2021,
                    count: 2
                },
                YearCount {
                    year: 2019,
                    count: 2
                },
                YearCount {
                    year: 2020,
                    count: 1
                },
            ]
        );
        assert!(aggregate_by_year(&[]).is_empty());
    }

    #[test]
    fn year_counts_add_up_to_records() {
        let records: Vec<CanonicalRecord> = (0..40)
            .map(|i| rec("A", &format!("{}-03-0{}", 2000 + i % 7, 1 + i % 9), &[]))
            .collect();
        let total: u64 = aggregate_by_year(&records).iter().map(|y| y.count).sum();
        assert_eq!(total, records.len() as u64);
    }

    #[test]
    fn bar_chart_fans_out_disciplines() {
        let records = vec![
            rec("Bias", "2023-01-01", &["Medicine", "Law"]),
            rec("Bias", "2023-06-01", &["Medicine"]),
            rec("Pay", "2022-02-01", &["Law"]),
            rec("Pay", "2023-03-01", &["Medicine"]),
            rec("Bias", "2022-09-09", &[]),
        ];
        assert_eq!(
            aggregate_for_bar_chart(&records),
            vec![
                bar(2022, "Law", "Pay", 1),
                bar(2023, "Medicine", "Bias", 2),
                bar(2023, "Medicine", "Pay", 1),
                bar(2023, "Law", "Bias", 1),
            ]
        );
    }

    #[test]
    fn bar_chart_counts_add_up_per_year() {
        let records = vec![
            rec("Bias", "2020-01-01", &["A", "B", "C"]),
            rec("Pay", "2020-05-01", &["A"]),
            rec("Pay", "2021-05-01", &["B", "C"]),
            rec("Bias", "2020-07-01", &[]),
        ];
        let data = aggregate_for_bar_chart(&records);
        for year in [2020, 2021] {
            let expected: usize = records
                .iter()
                .filter(|r| r.year() == year)
                .map(|r| r.disciplines.len())
                .sum();
            let got: u64 = data.iter().filter(|b| b.year == year).map(|b| b.count).sum();
            assert_eq!(got, expected as u64);
        }
        assert!(data.windows(2).all(|w| w[0].year <= w[1].year));
        assert!(data.iter().all(|b| b.count >= 1));
    }

    #[test]
    fn two_row_scenario() {
        let fields = FieldNames::default();
        let mut builder = StoreBuilder::new(&fields);
        builder.add_raw(
            &RawRecord::new(2)
                .with_cell("EDI Primary Case Issues", text("Bias"))
                .with_cell("Original Publication Date", RawCell::Number(44941.0))
                .with_cell("Disciplines", text("Medicine; Law")),
        );
        builder.add_raw(
            &RawRecord::new(3)
                .with_cell("EDI Primary Case Issues", text("Bias"))
                .with_cell("Original Publication Date", text("2023-06-01"))
                .with_cell("Disciplines", text("Medicine")),
        );
        let (store, report) = builder.build();
        assert_eq!(store.len(), 2);
        assert_eq!(report.retained, 2);
        assert!(report.excluded.is_empty());
        assert_eq!(
            store[0].publication_date,
            NaiveDate::from_ymd_opt(2023, 1, 15).unwrap()
        );

        assert_eq!(
            aggregate_by_year(&store),
            vec![YearCount {
                year: 2023,
                count: 2
            }]
        );
        assert_eq!(
            aggregate_for_bar_chart(&store),
            vec![
                bar(2023, "Medicine", "Bias", 2),
                bar(2023, "Law", "Bias", 1)
            ]
        );
        let g = aggregate_for_sankey(&store);
        assert_eq!(
            g.nodes,
            vec![
                SankeyNode {
                    name: "All Cases".to_string()
                },
                SankeyNode {
                    name: "Bias".to_string()
                }
            ]
        );
        assert_eq!(
            g.links,
            vec![SankeyLink {
                source: 0,
                target: 1,
                value: 2,
                year: 2023
            }]
        );
    }

    #[test]
    fn unparsable_row_is_dropped_everywhere() {
        let mut builder = StoreBuilder::new(&FieldNames::default());
        builder.add_raw(
            &RawRecord::new(2)
                .with_cell("EDI Primary Case Issues", text("Bias"))
                .with_cell("Original Publication Date", text("2023-06-01"))
                .with_cell("Disciplines", text("Law")),
        );
        let kept = builder.add_raw(
            &RawRecord::new(3)
                .with_cell("EDI Primary Case Issues", text("Ghost"))
                .with_cell("Original Publication Date", text("not-a-date"))
                .with_cell("Disciplines", text("Arts")),
        );
        assert!(!kept);
        let (store, report) = builder.build();
        assert_eq!(report.rows_read, 2);
        assert_eq!(report.retained, 1);
        assert_eq!(
            report.excluded,
            vec![ExcludedRow {
                row: 3,
                reason: Exclusion::UnparsableDate {
                    value: "not-a-date".to_string()
                }
            }]
        );
        assert!(store.iter().all(|r| r.issue != "Ghost"));
        assert!(aggregate_for_bar_chart(&store)
            .iter()
            .all(|b| b.issue != "Ghost" && b.discipline != "Arts"));
        assert!(aggregate_for_sankey(&store)
            .nodes
            .iter()
            .all(|n| n.name != "Ghost"));
    }

    #[test]
    fn canonical_record_json() {
        let r = rec("Bias", "2023-01-15", &["Medicine", "Law"]);
        let js = serde_json::to_value(&r).unwrap();
        assert_eq!(
            js,
            serde_json::json!({
                "EDI Primary Case Issues": "Bias",
                "Original Publication Date": "2023-01-15",
                "Disciplines": ["Medicine", "Law"]
            })
        );
        let back: CanonicalRecord = serde_json::from_value(js).unwrap();
        assert_eq!(back, r);

        // Optional fields may be missing from hand-written stores.
        let sparse: CanonicalRecord =
            serde_json::from_str(r#"{"Original Publication Date": "2020-02-02"}"#).unwrap();
        assert_eq!(sparse.issue, UNDEFINED_ISSUE);
        assert!(sparse.disciplines.is_empty());
    }
}
