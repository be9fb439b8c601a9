// Reading and writing the JSON files of the pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::pipeline::*;

pub const DATA_FILE: &str = "data.json";
pub const YEARS_FILE: &str = "aggregatedData.json";
pub const BAR_CHART_FILE: &str = "barChartData.json";
pub const SANKEY_FILE: &str = "sankeyData.json";

/// A serialized output, ready to be written.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Artifact {
    pub name: &'static str,
    pub contents: String,
}

pub fn to_artifact<T: Serialize + ?Sized>(name: &'static str, value: &T) -> PipelineResult<Artifact> {
    let mut contents = serde_json::to_string_pretty(value).context(SerializingJsonSnafu { name })?;
    contents.push('\n');
    Ok(Artifact { name, contents })
}

/// Writes the artifacts in `dir`, replacing any previous version.
///
/// Every content goes to a temporary file first. The temporary files are
/// renamed over the targets once all of them are written, so a failed write
/// leaves all the previous files in place. Each rename is atomic on its own.
pub fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> PipelineResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).context(WritingFileSnafu {
        path: dir.display().to_string(),
    })?;
    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();
    for a in artifacts.iter() {
        let tmp = dir.join(format!(".{}.tmp", a.name));
        if let Err(e) = fs::write(&tmp, a.contents.as_bytes()) {
            remove_staged(&staged);
            let _ = fs::remove_file(&tmp);
            return Err(e).context(WritingFileSnafu {
                path: tmp.display().to_string(),
            });
        }
        debug!("write_artifacts: staged {:?}", tmp);
        staged.push((tmp, dir.join(a.name)));
    }

    let mut written: Vec<PathBuf> = Vec::new();
    for (idx, (tmp, target)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(tmp, target) {
            remove_staged(&staged[idx..]);
            return Err(e).context(WritingFileSnafu {
                path: target.display().to_string(),
            });
        }
        info!("Wrote {:?}", target);
        written.push(target.clone());
    }
    Ok(written)
}

// Nothing else to do if the cleanup fails as well.
fn remove_staged(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged.iter() {
        let _ = fs::remove_file(tmp);
    }
}

pub fn read_artifact<T: DeserializeOwned>(p: &Path) -> PipelineResult<T> {
    let path = p.display().to_string();
    let contents = fs::read_to_string(p).context(OpeningJsonSnafu { path: path.clone() })?;
    debug!("read_artifact: {:?}: {} bytes", path, contents.len());
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
}

/// Reads a reference file without assuming its structure.
pub fn read_reference(p: &Path) -> PipelineResult<JSValue> {
    read_artifact(p)
}
