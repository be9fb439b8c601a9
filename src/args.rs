use clap::Parser;

/// Converts a spreadsheet of case records into the JSON files used by the charts.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. See the manual of case_aggregates for
    /// the available options.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The Excel workbook containing the cases. Setting this option overrides the
    /// path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (directory, default: current directory) Where the JSON files are read and written.
    /// Setting this option overrides the directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (directory, optional) A directory containing reference outputs. If provided, casecharts
    /// will check that the generated files match the files with the same name in this directory.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (default all) The step to run: convert, years, bar-chart, sankey, all or check.
    #[clap(long, value_parser)]
    pub stage: Option<String>,

    /// (default: first worksheet) The name of the worksheet to read in the workbook.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
