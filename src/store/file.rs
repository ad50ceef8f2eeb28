use super::{AnalysisStore, LOG_TARGET};
use crate::Result;
use crate::analysis::AggregateAnalysis;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};

/// On-disk representation of a record.
#[derive(Debug, Deserialize, Serialize)]
struct Envelope<T> {
    timestamp: DateTime<Utc>,
    payload: T,
}

/// A store keeping one JSON file per repository under a directory.
///
/// Records are written to a uniquely named temporary file and renamed into place, so
/// readers see either the old record or the new one, even while writers race.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: Utf8PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).into_app_err_with(|| format!("creating store directory '{dir}'"))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    fn record_path(&self, repository_id: u64) -> Utf8PathBuf {
        self.dir.join(format!("{repository_id}.json"))
    }
}

impl AnalysisStore for FileStore {
    fn get(&self, repository_id: u64) -> Result<Option<AggregateAnalysis>> {
        let path = self.record_path(repository_id);

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!(target: LOG_TARGET, "No stored analysis for repository {repository_id}");
                return Ok(None);
            }
            Err(e) => return Err(e).into_app_err_with(|| format!("opening '{path}'")),
        };

        let envelope: Envelope<AggregateAnalysis> =
            serde_json::from_reader(BufReader::new(file)).into_app_err_with(|| format!("reading stored analysis '{path}'"))?;

        log::debug!(target: LOG_TARGET, "Loaded analysis for repository {repository_id} written at {}", envelope.timestamp);
        Ok(Some(envelope.payload))
    }

    fn put(&self, analysis: &AggregateAnalysis) -> Result<()> {
        let path = self.record_path(analysis.repository.id);

        let envelope = Envelope {
            timestamp: Utc::now(),
            payload: analysis,
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{}.", analysis.repository.id))
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .into_app_err_with(|| format!("creating a temporary file in '{}'", self.dir))?;

        let tmp_path = tmp.path().display().to_string();
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, &envelope).into_app_err_with(|| format!("writing '{tmp_path}'"))?;
            writer.flush().into_app_err_with(|| format!("flushing '{tmp_path}'"))?;
        }

        let _ = tmp
            .persist(&path)
            .map_err(|e| e.error)
            .into_app_err_with(|| format!("replacing '{path}'"))?;

        log::debug!(target: LOG_TARGET, "Stored analysis for '{}' in '{path}'", analysis.repository.full_name);
        Ok(())
    }
}
