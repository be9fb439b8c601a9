mod args;
mod pipeline;

use clap::Parser;
use log::{debug, info};
use snafu::ErrorCompat;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();
    debug!("args: {:?}", args);

    let res = pipeline::config_reader::resolve_settings(&args)
        .and_then(|settings| pipeline::run_pipeline(&settings));

    match res {
        Ok(summary) => {
            if let Some(report) = summary.report.as_ref() {
                for excluded in report.excluded.iter() {
                    debug!("excluded row {}: {}", excluded.row, excluded.reason);
                }
            }
            info!(
                "Stage {:?} done, {} file(s) written",
                summary.stage,
                summary.written.len()
            );
        }
        Err(e) => {
            for (idx, err) in ErrorCompat::iter_chain(&e).enumerate() {
                if idx == 0 {
                    eprintln!("error: {}", err);
                } else {
                    eprintln!("caused by: {}", err);
                }
            }
            std::process::exit(1);
        }
    }
}
