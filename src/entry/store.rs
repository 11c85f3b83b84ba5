// Reading and writing the data file.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Deserialize;
use tempfile::NamedTempFile;

use crate::entry::io_common::format_value;
use crate::entry::*;

/// A row of the data file, with the column names of the file.
#[derive(PartialEq, Debug, Clone, Deserialize)]
struct CsvRecord {
    #[serde(rename = "Period")]
    period: String,
    #[serde(rename = "Metric")]
    metric: String,
    #[serde(rename = "Region")]
    region: String,
    #[serde(rename = "Value")]
    value: f64,
}

/// The data file: the whole table, stored as CSV.
///
/// There is no locking. If two processes save the same file, the last one
/// wins. A save never leaves a half-written file behind.
#[derive(Debug, Clone)]
pub struct TableStore {
    path: PathBuf,
}

impl TableStore {
    pub fn new(path: impl Into<PathBuf>) -> TableStore {
        TableStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    /// Reads the whole table. A missing file is an empty table.
    pub fn load(&self) -> EntryResult<Table> {
        let path = self.display_path();
        let file = match File::open(&self.path) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Data file {} not found, starting with an empty table", path);
                return Ok(Table::new());
            }
            r => r.context(OpeningFileSnafu { path: &path })?,
        };
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

        let mut table = Table::new();
        for (idx, row) in rdr.deserialize::<CsvRecord>().enumerate() {
            // The header is line 1.
            let lineno = (idx + 2) as u64;
            let row = row.context(CsvLineParseSnafu {
                path: &path,
                lineno,
            })?;
            let period = parse_period(&row.period).context(CsvBadPeriodSnafu {
                path: &path,
                lineno,
                content: &row.period,
            })?;
            ensure!(
                row.value.is_finite(),
                CsvBadValueSnafu {
                    path: &path,
                    lineno,
                    value: row.value,
                }
            );
            debug!("load: line {}: {:?}", lineno, row);
            table.push(Record {
                period,
                metric: row.metric,
                region: row.region,
                value: row.value,
            });
        }
        info!("Read {} records from {}", table.len(), path);
        Ok(table)
    }

    /// Rewrites the whole file with the content of the table.
    ///
    /// The rows are written to a temporary file next to the target, which then
    /// replaces it. The new file gets the permissions of the file it replaces.
    /// When the data path is a symbolic link, the file it points to is replaced
    /// and the link is kept.
    pub fn save(&self, table: &Table) -> EntryResult<()> {
        let path = self.display_path();
        let target = match fs::canonicalize(&self.path) {
            Ok(p) => p,
            Err(_) => self.path.clone(),
        };
        let dir = match target.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = NamedTempFile::new_in(&dir).context(WritingSnafu { path: &path })?;
        {
            let mut wtr = csv::Writer::from_writer(tmp.as_file_mut());
            wtr.write_record(["Period", "Metric", "Region", "Value"])
                .context(CsvWriteSnafu { path: &path })?;
            for rec in table.records() {
                wtr.write_record([
                    rec.period.to_string(),
                    rec.metric.clone(),
                    rec.region.clone(),
                    format_value(rec.value),
                ])
                .context(CsvWriteSnafu { path: &path })?;
            }
            wtr.flush().context(WritingSnafu { path: &path })?;
        }
        tmp.as_file_mut()
            .sync_all()
            .context(WritingSnafu { path: &path })?;
        match fs::metadata(&target) {
            Ok(meta) => tmp
                .as_file()
                .set_permissions(meta.permissions())
                .context(WritingSnafu { path: &path })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            r => {
                r.context(OpeningFileSnafu { path: &path })?;
            }
        }
        tmp.persist(&target)
            .context(PersistingSnafu { path: &path })?;
        info!("Wrote {} records to {}", table.len(), path);
        Ok(())
    }
}

/// A period read from the file: exactly six digits, with a month between 1 and 12.
fn parse_period(s: &str) -> Option<PeriodKey> {
    let t = s.trim();
    if t.len() != 6 || !t.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let key: u32 = t.parse().ok()?;
    Month::from_number(key % 100)?;
    Some(PeriodKey(key))
}
