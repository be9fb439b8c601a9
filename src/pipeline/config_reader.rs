use serde::{Deserialize, Serialize};
use std::fs;

use crate::args::Args;
use crate::pipeline::*;

pub const DEFAULT_INPUT_PATH: &str = "EDI Master 2023-11.xlsx";
pub const DEFAULT_OUTPUT_DIRECTORY: &str = ".";

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnSettings {
    pub issue: Option<String>,
    #[serde(rename = "publicationDate")]
    pub publication_date: Option<String>,
    pub disciplines: Option<String>,
}

/// The content of the JSON configuration file. All the keys are optional.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(rename = "inputPath")]
    pub input_path: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    pub columns: Option<ColumnSettings>,
    #[serde(rename = "disciplineDelimiter")]
    pub discipline_delimiter: Option<String>,
}

impl PipelineConfig {
    pub fn field_names(&self) -> FieldNames {
        let defaults = FieldNames::default();
        let columns = self.columns.clone().unwrap_or_default();
        FieldNames {
            issue: columns.issue.unwrap_or(defaults.issue),
            publication_date: columns
                .publication_date
                .unwrap_or(defaults.publication_date),
            disciplines: columns.disciplines.unwrap_or(defaults.disciplines),
            discipline_delimiter: self
                .discipline_delimiter
                .clone()
                .unwrap_or(defaults.discipline_delimiter),
        }
    }
}

/// Everything a run needs, after merging the command line and the
/// configuration file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub worksheet_name: Option<String>,
    pub fields: FieldNames,
    pub reference_dir: Option<PathBuf>,
    pub stage: Stage,
}

pub fn read_config(path: &str) -> PipelineResult<PipelineConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: PipelineConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    info!("config: {:?}", config);
    Ok(config)
}

/// Builds the settings of a run. Command line values take precedence over the
/// configuration file, whose relative paths are resolved from its directory.
pub fn resolve_settings(args: &Args) -> PipelineResult<Settings> {
    let (config, root_p) = match args.config.as_ref() {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root_p = Path::new(config_path.as_str())
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            (config, root_p)
        }
        None => (PipelineConfig::default(), PathBuf::new()),
    };

    let from_config = |p: &Option<String>, default: &str| -> PathBuf {
        match p {
            Some(x) => root_p.join(x),
            None => PathBuf::from(default),
        }
    };

    let input_path = match args.input.as_ref() {
        Some(x) => PathBuf::from(x),
        None => from_config(&config.input_path, DEFAULT_INPUT_PATH),
    };
    let output_dir = match args.out.as_ref() {
        Some(x) => PathBuf::from(x),
        None => from_config(&config.output_directory, DEFAULT_OUTPUT_DIRECTORY),
    };
    let stage = Stage::parse(args.stage.as_deref().unwrap_or("all"))?;

    let settings = Settings {
        input_path,
        output_dir,
        worksheet_name: args
            .excel_worksheet_name
            .clone()
            .or_else(|| config.excel_worksheet_name.clone()),
        fields: config.field_names(),
        reference_dir: args.reference.as_ref().map(PathBuf::from),
        stage,
    };
    debug!("resolve_settings: {:?}", settings);
    Ok(settings)
}
