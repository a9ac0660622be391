//! Local handling of a pair of recording files (heart rate + uterine
//! activity) before they go anywhere: presence and type checks, and a plain
//! two-column CSV reader for reviewing raw traces without the backend.
use std::fs;
use std::path::{Path, PathBuf};
use log::info;
use crate::drivers::payload::{Records, SeriesBatch, UploadResponse};
use crate::drivers::MonitorError;
/// Checked pair of input files.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadPair {
    pub bpm: PathBuf,
    pub uc: PathBuf,
}
/// Reject the pair before any work happens if a file is missing or is not a
/// `.csv` file.
pub fn validate_pair(bpm: Option<&Path>, uc: Option<&Path>) -> Result<UploadPair, MonitorError> {
    let bpm = bpm.ok_or(MonitorError::MissingFile("heart rate"))?;
    let uc = uc.ok_or(MonitorError::MissingFile("uterine activity"))?;
    for path in [bpm, uc] {
        if !is_csv(path) {
            return Err(MonitorError::NotCsv(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(MonitorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
    }
    Ok(UploadPair {
        bpm: bpm.to_path_buf(),
        uc: uc.to_path_buf(),
    })
}
fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}
/// Read a `time_sec,value` file. A non-numeric first row is taken as the
/// header; blank lines are skipped; columns past the second are ignored.
pub fn read_channel_csv(path: &Path) -> Result<SeriesBatch, MonitorError> {
    let text = fs::read_to_string(path)?;
    parse_channel_csv(&text, path)
}
fn parse_channel_csv(text: &str, path: &Path) -> Result<SeriesBatch, MonitorError> {
    let mut batch = SeriesBatch::default();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let mut cols = line.split(',').map(str::trim);
        let row_err = |message: &str| MonitorError::Csv {
            path: path.to_path_buf(),
            line: idx + 1,
            message: message.to_owned(),
        };
        let (Some(t), Some(v)) = (cols.next(), cols.next()) else {
            return Err(row_err("expected two columns"));
        };
        match (t.parse::<f64>(), v.parse::<f64>()) {
            (Ok(t), Ok(v)) => {
                batch.time_sec.push(t);
                batch.value.push(v);
            }
            _ if idx == 0 => continue,
            _ => return Err(row_err("expected numbers")),
        }
    }
    Ok(batch)
}
/// Build a reviewable recording straight from a validated file pair.
pub fn load_csv_pair(pair: &UploadPair, session_id: &str) -> Result<UploadResponse, MonitorError> {
    let bpm = read_channel_csv(&pair.bpm)?;
    let uc = read_channel_csv(&pair.uc)?;
    info!(
        "read {} hr rows from {} and {} uc rows from {}",
        bpm.len(),
        pair.bpm.display(),
        uc.len(),
        pair.uc.display()
    );
    Ok(UploadResponse {
        session_id: session_id.to_owned(),
        status: "local".to_owned(),
        records: Records {
            filtered_bpm_batch: bpm,
            filtered_uterus_batch: uc,
            ..Records::default()
        },
        prediction: None,
        message: None,
    })
}
