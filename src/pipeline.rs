use log::{debug, info, warn};

use case_aggregates::builder::StoreBuilder;
use case_aggregates::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod config_reader;
pub mod io_excel;
pub mod io_json;

use crate::pipeline::config_reader::Settings;
use crate::pipeline::io_json::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PipelineError {
    #[snafu(display("Error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Workbook {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Workbook {path} has no worksheet named {name:?}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Workbook {path}: the worksheet has no header row"))]
    MissingHeader { path: String },
    #[snafu(display("Error reading {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing {name}"))]
    SerializingJson {
        source: serde_json::Error,
        name: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Unknown stage {stage:?} (expected convert, years, bar-chart, sankey, all or check)"))]
    UnknownStage { stage: String },
    #[snafu(display("Invalid Sankey data in {path}"))]
    InvalidSankey {
        source: SankeyCheckError,
        path: String,
    },
    #[snafu(display("Invalid bar chart data in {path}: {message}"))]
    InvalidBarChart { path: String, message: String },
    #[snafu(display("Difference detected between the generated files and the reference files: {names}"))]
    ReferenceMismatch { names: String },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// A step of the pipeline.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Stage {
    /// Workbook to `data.json`.
    Convert,
    /// `data.json` to `aggregatedData.json`.
    Years,
    /// `data.json` to `barChartData.json`.
    BarChart,
    /// `data.json` to `sankeyData.json`.
    Sankey,
    /// Workbook to all the files.
    All,
    /// Validation of the chart files already written.
    Check,
}

impl Stage {
    pub fn parse(s: &str) -> PipelineResult<Stage> {
        match s {
            "convert" => Ok(Stage::Convert),
            "years" => Ok(Stage::Years),
            "bar-chart" => Ok(Stage::BarChart),
            "sankey" => Ok(Stage::Sankey),
            "all" => Ok(Stage::All),
            "check" => Ok(Stage::Check),
            x => UnknownStageSnafu { stage: x }.fail(),
        }
    }
}

/// What a run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stage: Stage,
    pub written: Vec<PathBuf>,
    /// Only for the stages that read the workbook.
    pub report: Option<NormalizationReport>,
}

fn convert(
    raw_records: &[RawRecord],
    fields: &FieldNames,
) -> (Vec<CanonicalRecord>, NormalizationReport) {
    let mut builder = StoreBuilder::new(fields);
    builder.add_all(raw_records);
    let (store, report) = builder.build();
    if !report.excluded.is_empty() {
        warn!(
            "{} row(s) excluded because of their publication date",
            report.excluded.len()
        );
    }
    info!(
        "Read {} row(s): {} record(s) kept, {} excluded",
        report.rows_read,
        report.retained,
        report.excluded.len()
    );
    (store, report)
}

fn read_store(settings: &Settings) -> PipelineResult<Vec<CanonicalRecord>> {
    let p = settings.output_dir.join(DATA_FILE);
    info!("Attempting to read canonical store {:?}", p);
    let store: Vec<CanonicalRecord> = read_artifact(&p)?;
    debug!("read_store: {} records", store.len());
    Ok(store)
}

fn year_artifact(store: &[CanonicalRecord]) -> PipelineResult<Artifact> {
    to_artifact(YEARS_FILE, &aggregate_by_year(store))
}

fn bar_chart_artifact(store: &[CanonicalRecord]) -> PipelineResult<Artifact> {
    to_artifact(BAR_CHART_FILE, &aggregate_for_bar_chart(store))
}

fn sankey_artifact(store: &[CanonicalRecord]) -> PipelineResult<Artifact> {
    let graph = aggregate_for_sankey(store);
    info!(
        "Sankey graph: {} nodes, {} links over {} years",
        graph.nodes.len(),
        graph.links.len(),
        graph.years().len()
    );
    to_artifact(SANKEY_FILE, &graph)
}

/// Runs one stage of the pipeline.
///
/// All the files of a stage are computed and written to temporary files
/// before the first one replaces its previous version.
pub fn run_pipeline(settings: &Settings) -> PipelineResult<RunSummary> {
    run_stage(settings, || {
        let path = settings.input_path.display().to_string();
        info!("Attempting to read case file {:?}", path);
        io_excel::read_excel_file(&path, settings.worksheet_name.as_deref())
    })
}

/// Runs the stage of `settings`. `read_source` provides the source rows to
/// the stages that start from the workbook.
fn run_stage<F>(settings: &Settings, read_source: F) -> PipelineResult<RunSummary>
where
    F: FnOnce() -> PipelineResult<Vec<RawRecord>>,
{
    info!("Running stage {:?}", settings.stage);
    let mut report: Option<NormalizationReport> = None;

    let artifacts: Vec<Artifact> = match settings.stage {
        Stage::Convert => {
            let (store, r) = convert(&read_source()?, &settings.fields);
            report = Some(r);
            vec![to_artifact(DATA_FILE, &store)?]
        }
        Stage::Years => vec![year_artifact(&read_store(settings)?)?],
        Stage::BarChart => vec![bar_chart_artifact(&read_store(settings)?)?],
        Stage::Sankey => vec![sankey_artifact(&read_store(settings)?)?],
        Stage::All => {
            let (store, r) = convert(&read_source()?, &settings.fields);
            report = Some(r);
            vec![
                to_artifact(DATA_FILE, &store)?,
                year_artifact(&store)?,
                bar_chart_artifact(&store)?,
                sankey_artifact(&store)?,
            ]
        }
        Stage::Check => {
            check_artifacts(&settings.output_dir)?;
            vec![]
        }
    };

    let written = if artifacts.is_empty() {
        vec![]
    } else {
        write_artifacts(&settings.output_dir, &artifacts)?
    };

    // The reference files, if provided for comparison
    if let Some(reference_dir) = settings.reference_dir.as_ref() {
        compare_with_reference(&artifacts, reference_dir)?;
    }

    Ok(RunSummary {
        stage: settings.stage,
        written,
        report,
    })
}

/// Checks that the chart files in `dir` can be drawn.
pub fn check_artifacts(dir: &Path) -> PipelineResult<()> {
    let sankey_p = dir.join(SANKEY_FILE);
    let graph: SankeyGraph = read_artifact(&sankey_p)?;
    graph.validate().context(InvalidSankeySnafu {
        path: sankey_p.display().to_string(),
    })?;
    info!(
        "{:?}: {} nodes, {} links",
        sankey_p,
        graph.nodes.len(),
        graph.links.len()
    );

    let bar_p = dir.join(BAR_CHART_FILE);
    let bars: Vec<BarDatum> = read_artifact(&bar_p)?;
    if let Err(message) = check_bar_chart(&bars) {
        return InvalidBarChartSnafu {
            path: bar_p.display().to_string(),
            message,
        }
        .fail();
    }
    info!("{:?}: {} buckets", bar_p, bars.len());
    Ok(())
}

fn check_bar_chart(bars: &[BarDatum]) -> Result<(), String> {
    let mut seen: HashSet<(i32, &str, &str)> = HashSet::new();
    for (idx, b) in bars.iter().enumerate() {
        if b.count == 0 {
            return Err(format!(
                "empty bucket {} / {} / {}",
                b.year, b.discipline, b.issue
            ));
        }
        if idx > 0 && bars[idx - 1].year > b.year {
            return Err(format!(
                "year {} listed after year {}",
                b.year,
                bars[idx - 1].year
            ));
        }
        if !seen.insert((b.year, b.discipline.as_str(), b.issue.as_str())) {
            return Err(format!(
                "duplicate bucket {} / {} / {}",
                b.year, b.discipline, b.issue
            ));
        }
    }
    Ok(())
}

fn compare_with_reference(artifacts: &[Artifact], reference_dir: &Path) -> PipelineResult<()> {
    let mut mismatches: Vec<&str> = Vec::new();
    for a in artifacts.iter() {
        let summary_ref = read_reference(&reference_dir.join(a.name))?;
        let pretty_ref = serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {
            name: a.name.to_string(),
        })?;
        let generated: JSValue = serde_json::from_str(&a.contents).context(ParsingJsonSnafu {
            path: a.name.to_string(),
        })?;
        let pretty_generated =
            serde_json::to_string_pretty(&generated).context(SerializingJsonSnafu {
                name: a.name.to_string(),
            })?;
        if pretty_ref != pretty_generated {
            warn!("Found differences with the reference file {}", a.name);
            print_diff(pretty_ref.as_str(), pretty_generated.as_str(), "\n");
            mismatches.push(a.name);
        } else {
            info!("{} matches the reference", a.name);
        }
    }
    if !mismatches.is_empty() {
        return ReferenceMismatchSnafu {
            names: mismatches.join(", "),
        }
        .fail();
    }
    Ok(())
}
