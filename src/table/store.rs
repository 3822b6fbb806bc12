// src/table/store.rs

use csv::{ReaderBuilder, WriterBuilder};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use super::record::{NormalizedRecord, HEADER};
use crate::error::{IngestError, Result};

/// Persistence for the normalized table.
pub trait TableStore {
    /// `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<Vec<NormalizedRecord>>>;
    /// Replace the persisted table with `records`.
    fn save(&self, records: &[NormalizedRecord]) -> Result<()>;
}

/// Flat CSV file with the fixed 19-column header. Cells go through
/// [`cell`](super::record::cell), so missing values and empty strings stay distinct.
#[derive(Debug, Clone)]
pub struct CsvTableStore {
    path: PathBuf,
}

impl CsvTableStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "table.csv".into());
        self.path.with_file_name(format!(".{}.tmp", name))
    }
}

impl TableStore for CsvTableStore {
    fn load(&self) -> Result<Option<Vec<NormalizedRecord>>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no persisted table");
            return Ok(None);
        }
        let mut rdr = ReaderBuilder::new().has_headers(true).from_path(&self.path)?;

        let headers = rdr.headers()?;
        if !headers.iter().eq(HEADER.iter().copied()) {
            return Err(IngestError::Table(format!(
                "{}: unexpected header {:?}",
                self.path.display(),
                headers.iter().collect::<Vec<_>>()
            )));
        }

        let records = rdr
            .deserialize::<NormalizedRecord>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        info!(path = %self.path.display(), records = records.len(), "loaded table");
        Ok(Some(records))
    }

    fn save(&self, records: &[NormalizedRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write to a sibling tmp file, then rename over the target
        replace_via_tmp(&self.tmp_path(), &self.path, |tmp| write_rows(tmp, records))?;

        info!(path = %self.path.display(), records = records.len(), "persisted table");
        Ok(())
    }
}

/// Run `write` against `tmp`, then rename it over `target`. A failed write
/// removes `tmp` and leaves `target` as it was.
fn replace_via_tmp<F>(tmp: &Path, target: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    if let Err(e) = write(tmp) {
        if let Err(rm) = fs::remove_file(tmp) {
            debug!(path = %tmp.display(), error = %rm, "tmp file not removed");
        }
        return Err(e);
    }
    fs::rename(tmp, target)?;
    Ok(())
}

fn write_rows(path: &Path, records: &[NormalizedRecord]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;
    wtr.write_record(HEADER)?;
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}
