use anyhow::Context;
use rider_stats::{header_row, to_row, RiderAggregate};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

/// CSV sink for rider rows
pub struct RowWriter {
    writer: csv::Writer<Box<dyn Write + Send>>,
    target: String,
}

impl RowWriter {
    /// Write to `path`, or to stdout when no path is given
    pub fn open(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create output file {}", path.display()))?;
                Ok(Self::from_writer(Box::new(file), path.display().to_string()))
            }
            None => Ok(Self::from_writer(Box::new(io::stdout()), "stdout".to_string())),
        }
    }

    pub fn from_writer(writer: Box<dyn Write + Send>, target: String) -> Self {
        info!("Writing to {}", target);
        Self { writer: csv::Writer::from_writer(writer), target }
    }

    pub fn write_row(&mut self, fields: &[String]) -> anyhow::Result<()> {
        self.writer
            .write_record(fields)
            .with_context(|| format!("Failed to write row to {}", self.target))
    }

    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.writer.flush().with_context(|| format!("Failed to flush {}", self.target))
    }

    /// Header followed by one row per rider, in the given order
    pub fn write_table(
        &mut self,
        window_days: &[u32],
        riders: &[RiderAggregate],
    ) -> anyhow::Result<()> {
        self.write_row(&header_row(window_days))?;
        for rider in riders {
            self.write_row(&to_row(rider))?;
        }
        self.flush()?;
        info!("Wrote {} rows to {}", riders.len(), self.target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rider_stats::{RiderAggregator, RosterRider};

    #[test]
    fn test_write_table_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let aggregator = RiderAggregator::new(vec![30, 90], now);
        let riders: Vec<_> = [11, 22]
            .into_iter()
            .map(|id| aggregator.aggregate(&RosterRider::with_id(id), &[]).unwrap())
            .collect();

        let mut writer = RowWriter::open(Some(&path)).unwrap();
        writer.write_table(&[30, 90], &riders).unwrap();
        drop(writer);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 6 + 2 * 16);
        assert_eq!(&headers[6], "Races30Days");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "11");
        assert_eq!(&rows[1][1], "22");
        assert_eq!(&rows[1][2], "https://zwiftpower.com/profile.php?z=22");
        assert_eq!(&rows[0][5], "0.0");
    }

    #[test]
    fn test_names_with_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quoted.csv");

        let mut writer = RowWriter::open(Some(&path)).unwrap();
        writer.write_row(&["Smith, Jo".to_string(), "1".to_string()]).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "\"Smith, Jo\",1\n");
    }

    #[test]
    fn test_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("results.csv");
        assert!(RowWriter::open(Some(&path)).is_err());
    }
}
