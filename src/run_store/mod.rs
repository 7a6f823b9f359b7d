//! Run artifacts on disk
//!
//! A run is named by its local start time (`YYYYMMDDHHMMSS`). The crawl
//! writes `extracted_urls/URLs_<run>.txt`, one absolute URL per line, and
//! extraction of that artifact writes `raw_datasets/data_<run>.csv`. The
//! filename convention is the only discovery mechanism: the latest run is
//! the greatest id among files that match it exactly.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexSet;
use thiserror::Error;
use url::Url;

const URL_ARTIFACT_PREFIX: &str = "URLs_";
const URL_ARTIFACT_SUFFIX: &str = ".txt";
const RECORD_TABLE_PREFIX: &str = "data_";
const RECORD_TABLE_SUFFIX: &str = ".csv";
const RUN_ID_FORMAT: &str = "%Y%m%d%H%M%S";

/// Errors reading or writing run artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Invalid run id '{0}': expected 14 digits (YYYYMMDDHHMMSS)")]
    InvalidRunId(String),

    #[error("No URL artifacts found in {}", dir.display())]
    NoArtifacts { dir: PathBuf },

    #[error("Artifact {} does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("Artifact {} already exists", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ArtifactError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Identifier of one crawl run and everything derived from it
///
/// Always 14 ASCII digits, so string order is time order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(String);

impl RunId {
    /// Id for a run starting now (local time)
    #[must_use]
    pub fn now() -> Self {
        Self(chrono::Local::now().format(RUN_ID_FORMAT).to_string())
    }

    /// Validate an id given by an operator or read from a filename
    ///
    /// # Errors
    ///
    /// Rejects anything that is not exactly 14 ASCII digits. The digits are
    /// not checked against the calendar, so `20230126156000` is a run id.
    pub fn parse(raw: &str) -> Result<Self, ArtifactError> {
        let raw = raw.trim();
        if raw.len() != 14 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ArtifactError::InvalidRunId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RunId {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Path of a run's URL artifact inside `urls_dir`
#[must_use]
pub fn url_artifact_path(urls_dir: &Path, run: &RunId) -> PathBuf {
    urls_dir.join(format!("{URL_ARTIFACT_PREFIX}{run}{URL_ARTIFACT_SUFFIX}"))
}

/// Path of a run's record table inside `records_dir`
#[must_use]
pub fn record_table_path(records_dir: &Path, run: &RunId) -> PathBuf {
    records_dir.join(format!("{RECORD_TABLE_PREFIX}{run}{RECORD_TABLE_SUFFIX}"))
}

/// Hidden sibling a file is written to before being renamed into place
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Write `contents` to `path` through a temp sibling and a rename
///
/// Readers never see a half-written file under `path`. On failure the temp
/// sibling is removed again.
pub(crate) async fn write_file_atomically(
    path: &Path,
    contents: impl AsRef<[u8]>,
) -> Result<(), ArtifactError> {
    let tmp = temp_sibling(path);
    let written = match tokio::fs::write(&tmp, contents).await {
        Ok(()) => tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| ArtifactError::io(path, e)),
        Err(e) => Err(ArtifactError::io(&tmp, e)),
    };
    if written.is_err() {
        match tokio::fs::remove_file(&tmp).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %tmp.display(), error = %e, "Could not remove temp file");
            }
        }
    }
    written
}

fn run_id_from_file_name(name: &str) -> Option<RunId> {
    let stem = name
        .strip_prefix(URL_ARTIFACT_PREFIX)?
        .strip_suffix(URL_ARTIFACT_SUFFIX)?;
    RunId::parse(stem).ok()
}

fn looks_like_url_artifact(name: &str) -> bool {
    name.starts_with(URL_ARTIFACT_PREFIX) && name.ends_with(URL_ARTIFACT_SUFFIX)
}

/// Runs with a URL artifact in `urls_dir`, oldest first
///
/// A missing directory has no runs. Files not matching the naming pattern
/// are ignored.
///
/// # Errors
///
/// Fails if the directory exists but cannot be listed.
pub async fn list_url_artifacts(urls_dir: &Path) -> Result<Vec<RunId>, ArtifactError> {
    let mut entries = match tokio::fs::read_dir(urls_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ArtifactError::io(urls_dir, e)),
    };

    let mut runs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ArtifactError::io(urls_dir, e))?
    {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        match run_id_from_file_name(name) {
            Some(run) => runs.push(run),
            None if looks_like_url_artifact(name) => tracing::warn!(
                dir = %urls_dir.display(),
                file = name,
                "Ignoring URL artifact with a malformed run id"
            ),
            None => {}
        }
    }
    runs.sort();
    Ok(runs)
}

/// The most recent run with a URL artifact
///
/// # Errors
///
/// `NoArtifacts` when nothing in `urls_dir` matches the naming pattern.
pub async fn latest_url_artifact(urls_dir: &Path) -> Result<RunId, ArtifactError> {
    list_url_artifacts(urls_dir)
        .await?
        .pop()
        .ok_or_else(|| ArtifactError::NoArtifacts {
            dir: urls_dir.to_path_buf(),
        })
}

/// Write a run's URL artifact, one URL per line
///
/// The file appears under its final name only once fully written.
///
/// # Errors
///
/// Fails on any I/O error creating the directory or writing the file.
pub async fn write_url_artifact(
    urls_dir: &Path,
    run: &RunId,
    urls: &[Url],
) -> Result<PathBuf, ArtifactError> {
    tokio::fs::create_dir_all(urls_dir)
        .await
        .map_err(|e| ArtifactError::io(urls_dir, e))?;

    let mut contents = String::with_capacity(urls.len() * 80);
    for url in urls {
        contents.push_str(url.as_str());
        contents.push('\n');
    }

    let path = url_artifact_path(urls_dir, run);
    write_file_atomically(&path, contents).await?;

    tracing::debug!(path = %path.display(), urls = urls.len(), "Wrote URL artifact");
    Ok(path)
}

/// Read a run's URL artifact
///
/// Blank lines are skipped, and so are lines that are not absolute URLs
/// (with a warning naming the line).
///
/// # Errors
///
/// `NotFound` when the run has no artifact; `Io` on other read failures.
pub async fn read_url_artifact(urls_dir: &Path, run: &RunId) -> Result<Vec<Url>, ArtifactError> {
    let path = url_artifact_path(urls_dir, run);
    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ArtifactError::io(&path, e))?;

    let mut urls = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match Url::parse(line) {
            Ok(url) => urls.push(url),
            Err(e) => tracing::warn!(
                path = %path.display(),
                line = index + 1,
                error = %e,
                "Skipping malformed URL in artifact"
            ),
        }
    }
    Ok(urls)
}

/// Result of [`sample_url_artifact`]
#[derive(Debug, Clone)]
pub struct SampleOutcome {
    pub run_id: RunId,
    pub path: PathBuf,
    /// Distinct URLs in the source artifact
    pub source_urls: usize,
    /// URLs written to the sample
    pub sampled: usize,
}

/// Write a random subset of a URL artifact as a new run
///
/// Draws `size` distinct URLs (all of them when the source is smaller) and
/// keeps them in source order. The sample gets its own run id so it can be
/// extracted like any crawl output.
///
/// # Errors
///
/// Fails if the source cannot be read, if `target` already has an
/// artifact, or on write errors.
pub async fn sample_url_artifact(
    urls_dir: &Path,
    source: &RunId,
    target: &RunId,
    size: usize,
) -> Result<SampleOutcome, ArtifactError> {
    let target_path = url_artifact_path(urls_dir, target);
    if tokio::fs::try_exists(&target_path).await.unwrap_or(false) {
        return Err(ArtifactError::AlreadyExists { path: target_path });
    }

    let distinct: IndexSet<Url> = read_url_artifact(urls_dir, source)
        .await?
        .into_iter()
        .collect();
    let distinct: Vec<Url> = distinct.into_iter().collect();

    let amount = size.min(distinct.len());
    let mut picked = rand::seq::index::sample(&mut rand::rng(), distinct.len(), amount).into_vec();
    picked.sort_unstable();
    let sample: Vec<Url> = picked.into_iter().map(|i| distinct[i].clone()).collect();

    let path = write_url_artifact(urls_dir, target, &sample).await?;
    Ok(SampleOutcome {
        run_id: target.clone(),
        path,
        source_urls: distinct.len(),
        sampled: sample.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_validation() {
        assert!(RunId::parse("20230126155023").is_ok());
        assert!(RunId::parse("2023012615502").is_err());
        assert!(RunId::parse("2023012615502x").is_err());
        // Not a calendar date, still a run id
        assert!(RunId::parse("20230126156000").is_ok());
    }

    #[test]
    fn ids_order_as_strings() {
        let crawl = RunId::parse("20230126155023").expect("valid");
        let sample = RunId::parse("20230126156000").expect("valid");
        assert!(sample > crawl);
    }

    #[test]
    fn now_is_a_valid_id() {
        let id = RunId::now();
        assert_eq!(RunId::parse(id.as_str()).expect("valid"), id);
    }

    #[test]
    fn artifact_names() {
        let run = RunId::parse("20230126155023").expect("valid");
        assert_eq!(
            url_artifact_path(Path::new("out/extracted_urls"), &run),
            PathBuf::from("out/extracted_urls/URLs_20230126155023.txt")
        );
        assert_eq!(
            record_table_path(Path::new("out/raw_datasets"), &run),
            PathBuf::from("out/raw_datasets/data_20230126155023.csv")
        );
    }

    #[test]
    fn only_exact_names_are_runs() {
        assert!(run_id_from_file_name("URLs_20230126155023.txt").is_some());
        assert!(run_id_from_file_name("URLs_20230126155023.txt.bak").is_none());
        assert!(run_id_from_file_name(".URLs_20230126155023.txt.tmp").is_none());
        assert!(run_id_from_file_name("URLs_latest.txt").is_none());
        assert!(run_id_from_file_name("data_20230126155023.csv").is_none());
    }
}
