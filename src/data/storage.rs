//! CSV export of a session.
//!
//! Layout (comma delimited, UTF-8, CRLF line endings):
//!
//! ```text
//! Sample_Number,Timestamp,Time_Elapsed_s,Temperature_C,Threshold_C,Valid,Checksum
//! 0,2026-10-17T09:30:00.000000,0.000,26.12,35.00,True,1a2b3c4d
//! ...
//!
//! --- Metadata ---
//! Session_Start,2026-10-17T09:30:00.000000
//! Total_Samples,20
//! Sampling_Rate_Hz,0.5
//! Base_Temperature_C,26
//! Threshold_C,35
//! Export_Time,2026-10-17T09:30:40.012345
//! Total_Alerts,0
//! ```
//!
//! Column names and order are a stable interface; spreadsheets are the intended reader.
//!
//! The file is assembled in a temporary file next to the destination and renamed into
//! place, so a reader never sees a partial export and a failed export leaves any
//! existing file at the destination as it was.

use crate::config::StorageConfig;
use crate::error::{AppResult, DaqError};
use crate::session::{format_timestamp, Session};
use chrono::{DateTime, Local};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Column names of the sample table.
pub const HEADER: [&str; 7] = [
    "Sample_Number",
    "Timestamp",
    "Time_Elapsed_s",
    "Temperature_C",
    "Threshold_C",
    "Valid",
    "Checksum",
];

/// Label row that opens the metadata block.
pub const METADATA_LABEL: &str = "--- Metadata ---";

/// Number of rows in the metadata block, label included.
pub const METADATA_ROWS: usize = 8;

/// Result of a successful export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    /// Where the file was written
    pub path: PathBuf,
    /// Samples written
    pub samples: usize,
    /// Samples that passed validation
    pub valid: usize,
    /// Alerts recorded in the session
    pub alerts: usize,
    /// `valid / samples` as a percentage
    pub data_quality_percent: f64,
}

/// A writer for CSV session logs.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new(".")
    }
}

impl CsvExporter {
    /// Exporter that places generated file names in `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Exporter configured from [`StorageConfig`].
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.output_dir.clone())
    }

    /// Generated file name for an export started at `now`.
    pub fn default_file_name(now: &DateTime<Local>) -> String {
        format!("temperature_log_{}.csv", now.format("%Y%m%d_%H%M%S"))
    }

    /// Writes `session` to `destination`, or to a generated name in the output
    /// directory when `destination` is `None`.
    ///
    /// # Errors
    ///
    /// [`DaqError::Export`] if the file cannot be created or written. The session is
    /// not modified and the call can be repeated with another destination.
    pub fn export(&self, session: &Session, destination: Option<&Path>) -> AppResult<ExportReport> {
        let export_time = Local::now();
        let path = match destination {
            Some(p) => p.to_path_buf(),
            None => {
                std::fs::create_dir_all(&self.output_dir)
                    .map_err(|e| DaqError::export(&self.output_dir, e))?;
                self.output_dir.join(Self::default_file_name(&export_time))
            }
        };

        write_atomically(&path, |file| write_session(file, session, &export_time))
            .map_err(|e| DaqError::export(&path, e))?;

        let report = ExportReport {
            path,
            samples: session.samples().len(),
            valid: session.valid_count(),
            alerts: session.alerts().len(),
            data_quality_percent: session.data_quality_percent(),
        };
        info!(
            path = %report.path.display(),
            samples = report.samples,
            valid = report.valid,
            alerts = report.alerts,
            "Data exported ({:.1}% valid)",
            report.data_quality_percent
        );
        Ok(report)
    }
}

fn write_atomically<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut NamedTempFile) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    fill(&mut file)?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer)
}

fn flag(valid: bool) -> &'static str {
    if valid {
        "True"
    } else {
        "False"
    }
}

/// Writes the full export layout for `session` to `writer`.
pub fn write_session<W: Write>(
    writer: W,
    session: &Session,
    export_time: &DateTime<Local>,
) -> io::Result<()> {
    let config = session.config();
    let threshold = format!("{:.2}", config.threshold_c);

    let mut wtr = csv_writer(writer);
    wtr.write_record(HEADER)?;
    for s in session.samples() {
        let index = s.index.to_string();
        let elapsed = format!("{:.3}", s.elapsed_s);
        let temperature = format!("{:.2}", s.temperature);
        wtr.write_record([
            index.as_str(),
            s.timestamp_text.as_str(),
            elapsed.as_str(),
            temperature.as_str(),
            threshold.as_str(),
            flag(s.valid),
            s.tag.as_str(),
        ])?;
    }

    // csv writes an empty record as `""`, so the separator goes out raw
    let mut inner = wtr.into_inner().map_err(|e| e.into_error())?;
    inner.write_all(b"\r\n")?;

    let session_start = session
        .session_start()
        .map(|t| format_timestamp(&t))
        .unwrap_or_default();

    let metadata = [
        ("Session_Start", session_start),
        ("Total_Samples", session.sample_count().to_string()),
        ("Sampling_Rate_Hz", config.sampling_rate_hz.to_string()),
        ("Base_Temperature_C", config.base_temperature_c.to_string()),
        ("Threshold_C", config.threshold_c.to_string()),
        ("Export_Time", format_timestamp(export_time)),
        ("Total_Alerts", session.alerts().len().to_string()),
    ];

    let mut wtr = csv_writer(inner);
    wtr.write_record([METADATA_LABEL])?;
    for (key, value) in &metadata {
        wtr.write_record([*key, value.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AcquisitionConfig;
    use crate::session::ManualClock;
    use chrono::TimeZone;
    use std::time::Duration;
    use tempfile::tempdir;

    fn session(readings: &[f64]) -> Session {
        let start = Local
            .with_ymd_and_hms(2026, 10, 17, 9, 30, 0)
            .single()
            .unwrap();
        let clock = ManualClock::new(start);
        let mut session =
            Session::with_clock(AcquisitionConfig::new(26.0, 35.0, 0.5), clock.clone()).unwrap();
        for &t in readings {
            session.record_reading(t);
            clock.advance(Duration::from_millis(2_000));
        }
        session
    }

    fn render(session: &Session) -> String {
        let mut buf = Vec::new();
        write_session(&mut buf, session, &Local::now()).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn layout_row_counts() {
        let s = session(&[26.0, 36.0, 37.0, 20.0, 36.5]);
        let text = render(&s);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 5 + 1 + METADATA_ROWS);
        assert_eq!(lines[0], HEADER.join(","));
        assert_eq!(lines[6], "");
        assert_eq!(lines[7], METADATA_LABEL);
        assert!(lines.contains(&"Total_Samples,5"));
        assert!(lines.contains(&"Total_Alerts,2"));
    }

    #[test]
    fn data_row_formatting() {
        let s = session(&[26.0, 151.25]);
        let text = render(&s);
        let lines: Vec<&str> = text.lines().collect();
        let first = &s.samples()[0];
        assert_eq!(
            lines[1],
            format!("0,2026-10-17T09:30:00.000000,0.000,26.00,35.00,True,{}", first.tag)
        );
        let second = &s.samples()[1];
        assert_eq!(
            lines[2],
            format!("1,2026-10-17T09:30:02.000000,2.000,151.25,35.00,False,{}", second.tag)
        );
    }

    #[test]
    fn metadata_values() {
        let s = session(&[26.0]);
        let text = render(&s);
        assert!(text.contains("Session_Start,2026-10-17T09:30:00.000000\r\n"));
        assert!(text.contains("Sampling_Rate_Hz,0.5\r\n"));
        assert!(text.contains("Base_Temperature_C,26\r\n"));
        assert!(text.contains("Threshold_C,35\r\n"));
        assert!(text.contains("Export_Time,"));
    }

    #[test]
    fn empty_session_exports_header_and_metadata() {
        let s = session(&[]);
        let text = render(&s);
        assert_eq!(text.lines().count(), 1 + 1 + METADATA_ROWS);
        assert!(text.contains("Session_Start,\r\n"));
        assert!(text.contains("Total_Samples,0\r\n"));
    }

    #[test]
    fn export_to_explicit_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.csv");
        let s = session(&[26.0, 40.0]);
        let report = CsvExporter::default().export(&s, Some(&path)).unwrap();
        assert_eq!(report.path, path);
        assert_eq!(report.samples, 2);
        assert_eq!(report.alerts, 1);
        assert_eq!(report.valid, 2);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Sample_Number,"));
        // only the export itself is left in the directory
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn export_to_generated_name() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("logs");
        let s = session(&[26.0]);
        let report = CsvExporter::new(&out).export(&s, None).unwrap();
        assert_eq!(report.path.parent(), Some(out.as_path()));
        let name = report.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("temperature_log_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "temperature_log_20261017_093000.csv".len());
        assert!(report.path.exists());
    }

    #[test]
    fn unwritable_destination_is_an_export_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("run.csv");
        let s = session(&[26.0, 40.0]);
        let err = CsvExporter::default().export(&s, Some(&path)).unwrap_err();
        match err {
            DaqError::Export { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!path.exists());
        // session untouched, retry elsewhere works
        assert_eq!(s.sample_count(), 2);
        let retry = dir.path().join("run.csv");
        assert!(CsvExporter::default().export(&s, Some(&retry)).is_ok());
    }

    #[test]
    fn failed_export_leaves_existing_target_alone() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("occupied");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep.txt"), "keep").unwrap();

        let s = session(&[26.0]);
        assert!(CsvExporter::default().export(&s, Some(&target)).is_err());
        assert!(target.is_dir());
        assert_eq!(std::fs::read_to_string(target.join("keep.txt")).unwrap(), "keep");
        // no temporary files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn default_file_name_format() {
        let t = Local
            .with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
            .single()
            .unwrap();
        assert_eq!(
            CsvExporter::default_file_name(&t),
            "temperature_log_20260102_030405.csv"
        );
    }
}
