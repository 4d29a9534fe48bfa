//! # Event Log
//!
//! Append-only record of what happened during a session. Each row holds a
//! wall-clock timestamp, the session time of the event, the number of manual
//! records so far, the exposure reading and a free-text label.
//!
//! The session only sees the [`EventSink`] trait. [`CsvEventLog`] writes the
//! on-disk file; [`MemoryEventLog`] keeps rows in memory for tests and headless
//! runs.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

use crate::error::StudyResult;

/// Column names, written once when a log file is created.
pub const HEADER: [&str; 5] = ["DateTime", "TimeToResponse", "ResponseTimes", "Exposure", "Event"];

/// Timestamp format of the `DateTime` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One logged event.
#[derive(Clone, Debug, PartialEq)]
pub struct EventRecord {
    /// Wall-clock time of the event.
    pub timestamp: DateTime<Local>,
    /// Session time of the event (s).
    pub elapsed: f64,
    /// Manual records requested so far (`ResponseTimes`).
    pub counter: u32,
    /// Exposure reading at the event.
    pub exposure: f64,
    /// Event label, e.g. `TARGET_COMPLETED_BurstPoint_1`.
    pub label: String,
}

impl EventRecord {
    /// Creates a record stamped with the current local time.
    #[must_use]
    pub fn now(elapsed: f64, counter: u32, exposure: f64, label: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            elapsed,
            counter,
            exposure,
            label: label.into(),
        }
    }

    /// Row fields in [`HEADER`] order.
    #[must_use]
    pub fn fields(&self) -> [String; 5] {
        [
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.3}", self.elapsed),
            self.counter.to_string(),
            format!("{:.3}", self.exposure),
            self.label.clone(),
        ]
    }
}

/// Destination for event records.
pub trait EventSink: Send {
    /// Appends one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be stored. The session logs
    /// it and carries on.
    fn append(&mut self, record: &EventRecord) -> StudyResult<()>;
}

/// CSV file log.
pub struct CsvEventLog {
    path: PathBuf,
    writer: csv::Writer<std::fs::File>,
}

impl CsvEventLog {
    /// File name for a participant and construction type.
    #[must_use]
    pub fn file_name(participant_id: u32, construction: &str) -> String {
        format!("Data_PID{participant_id}_{construction}.csv")
    }

    /// Opens (or creates) the log for a participant inside `directory`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub fn for_participant(
        directory: impl AsRef<Path>,
        participant_id: u32,
        construction: &str,
    ) -> StudyResult<Self> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory)?;
        Self::open(directory.join(Self::file_name(participant_id, construction)))
    }

    /// Opens `path` for appending. The header is written only if the file is
    /// new or empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the header written.
    pub fn open(path: impl AsRef<Path>) -> StudyResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            writer.write_record(HEADER)?;
            writer.flush()?;
            tracing::info!("Created event log {}", path.display());
        } else {
            tracing::info!("Appending to event log {}", path.display());
        }

        Ok(Self { path, writer })
    }

    /// Log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for CsvEventLog {
    fn append(&mut self, record: &EventRecord) -> StudyResult<()> {
        self.writer.write_record(record.fields())?;
        self.writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for CsvEventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvEventLog").field("path", &self.path).finish()
    }
}

/// In-memory log. Clones share the same rows.
#[derive(Clone, Debug, Default)]
pub struct MemoryEventLog {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl MemoryEventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all rows.
    #[must_use]
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().clone()
    }

    /// Labels of all rows, in order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.label.clone()).collect()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// No rows yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl EventSink for MemoryEventLog {
    fn append(&mut self, record: &EventRecord) -> StudyResult<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Writes rows to any `Write` (stdout, a pipe) without a header.
pub struct WriterEventLog<W: Write + Send> {
    writer: csv::Writer<W>,
}

impl<W: Write + Send> WriterEventLog<W> {
    /// Wraps a writer.
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().has_headers(false).from_writer(inner),
        }
    }
}

impl<W: Write + Send> EventSink for WriterEventLog<W> {
    fn append(&mut self, record: &EventRecord) -> StudyResult<()> {
        self.writer.write_record(record.fields())?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        assert_eq!(
            CsvEventLog::file_name(7, "ActiveDrilling"),
            "Data_PID7_ActiveDrilling.csv"
        );
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        {
            let mut log = CsvEventLog::open(&path).unwrap();
            log.append(&EventRecord::now(1.5, 1, 1.0, "MANUAL_RECORD")).unwrap();
        }
        {
            let mut log = CsvEventLog::open(&path).unwrap();
            log.append(&EventRecord::now(2.5, 2, 1.25, "SESSION_COMPLETED")).unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "DateTime,TimeToResponse,ResponseTimes,Exposure,Event");
        assert!(lines[1].ends_with(",1.500,1,1.000,MANUAL_RECORD"));
        assert!(lines[2].ends_with(",2.500,2,1.250,SESSION_COMPLETED"));
    }

    #[test]
    fn test_for_participant_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("Data_Collected");

        let log = CsvEventLog::for_participant(&nested, 3, "PassiveMoving").unwrap();
        assert_eq!(log.path(), nested.join("Data_PID3_PassiveMoving.csv"));
        assert!(log.path().exists());
    }

    #[test]
    fn test_memory_log_shared_between_clones() {
        let log = MemoryEventLog::new();
        let mut sink = log.clone();
        sink.append(&EventRecord::now(0.0, 1, 1.0, "MODE_Study")).unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(log.labels(), vec!["MODE_Study".to_string()]);
    }

    #[test]
    fn test_timestamp_format() {
        let record = EventRecord::now(0.0, 0, 0.0, "X");
        let stamp = &record.fields()[0];
        // yyyy-MM-dd HH:mm:ss
        assert_eq!(stamp.len(), 19);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], " ");
    }
}
