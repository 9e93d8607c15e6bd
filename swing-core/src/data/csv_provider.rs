//! CSV directory provider.
//!
//! Reads `{dir}/{SYMBOL}.csv` with a `date,open,high,low,close,volume`
//! header. Rows may be unordered; duplicate dates keep the last row.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::provider::{window, DataError, DataSource, SeriesProvider};
use crate::domain::{Bar, PriceSeries};

/// Parse bars from CSV text.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    rdr.deserialize()
        .collect::<Result<Vec<Bar>, _>>()
        .map_err(|e| DataError::Other(format!("malformed CSV: {e}")))
}

/// Write bars as CSV with a header row.
pub fn write_bars<W: Write>(writer: W, bars: &[Bar]) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for bar in bars {
        wtr.serialize(bar)
            .map_err(|e| DataError::Other(format!("CSV write failed: {e}")))?;
    }
    wtr.flush().map_err(|e| DataError::Io(e.to_string()))
}

pub struct CsvDirProvider {
    dir: PathBuf,
}

impl CsvDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl SeriesProvider for CsvDirProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn source(&self) -> DataSource {
        DataSource::Csv
    }

    fn get_series(&self, symbol: &str, lookback_days: usize, as_of: NaiveDate) -> Result<PriceSeries, DataError> {
        let path = self.path_for(symbol);
        let file = File::open(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            _ => DataError::Io(format!("{}: {e}", path.display())),
        })?;
        let series = PriceSeries::from_unsorted(symbol, read_bars(file)?)?;
        window(&series, lookback_days, as_of)
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}
