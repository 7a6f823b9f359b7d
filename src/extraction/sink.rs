//! Record table persistence

use std::future::Future;
use std::path::PathBuf;

use crate::config::ScrapeConfig;
use crate::page_extractor::RecordTable;
use crate::run_store::{ArtifactError, RunId, record_table_path, write_file_atomically};

/// Destination for a finished record table
pub trait RecordSink {
    /// Persist `table` for `run_id`, returning where it went
    ///
    /// # Errors
    ///
    /// Any failure to store the table.
    fn write_table(
        &mut self,
        run_id: &RunId,
        table: &RecordTable,
    ) -> impl Future<Output = Result<PathBuf, ArtifactError>> + Send;
}

/// Writes `data_<run>.csv` into the records directory
///
/// Header is the table's column union; a record lacking a column gets an
/// empty cell.
#[derive(Debug, Clone)]
pub struct CsvRecordSink {
    records_dir: PathBuf,
}

impl CsvRecordSink {
    pub fn new(records_dir: impl Into<PathBuf>) -> Self {
        Self {
            records_dir: records_dir.into(),
        }
    }

    #[must_use]
    pub fn for_config(config: &ScrapeConfig) -> Self {
        Self::new(config.records_dir())
    }
}

/// Render the table as CSV bytes
fn render_csv(table: &RecordTable, columns: &[String]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if !columns.is_empty() {
        writer.write_record(columns)?;
        for row in table.rows(columns) {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

impl RecordSink for CsvRecordSink {
    fn write_table(
        &mut self,
        run_id: &RunId,
        table: &RecordTable,
    ) -> impl Future<Output = Result<PathBuf, ArtifactError>> + Send {
        let records_dir = self.records_dir.clone();
        let path = record_table_path(&records_dir, run_id);
        let columns = table.columns();
        let rows = table.len();
        let rendered = render_csv(table, &columns);

        async move {
            let bytes = rendered?;
            tokio::fs::create_dir_all(&records_dir)
                .await
                .map_err(|source| ArtifactError::Io {
                    path: records_dir.clone(),
                    source,
                })?;
            write_file_atomically(&path, bytes).await?;

            tracing::debug!(
                path = %path.display(),
                rows,
                columns = columns.len(),
                "Wrote record table"
            );
            Ok(path)
        }
    }
}
