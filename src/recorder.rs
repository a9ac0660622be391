// src/recorder.rs
// 会话保存：两个通道各写一份 CSV，指标与事件写 JSON，可选导出 PNG
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::drivers::{
    render_session_png, ChannelBuffer, EventMarker, MonitorSession, PlotStyle, SummaryMetrics,
};

/// Files written by one save, all sharing `stem`.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedSession {
    pub stem: String,
    pub bpm: PathBuf,
    pub uc: PathBuf,
    pub metrics: PathBuf,
}

#[derive(Serialize)]
struct SessionSummary<'a> {
    label: &'a str,
    saved_at: u64,
    hr_samples: usize,
    uc_samples: usize,
    time_range: Option<(f64, f64)>,
    metrics: &'a SummaryMetrics,
    markers: &'a [EventMarker],
}

pub struct SessionRecorder {
    dir: PathBuf,
}

impl SessionRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the whole session history, not just the live window.
    pub fn save(&self, session: &MonitorSession, label: &str) -> Result<SavedSession> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let saved_at = unix_now();
        let stem = self.unique_stem(label, saved_at);
        let saved = SavedSession {
            bpm: self.dir.join(format!("{stem}_bpm.csv")),
            uc: self.dir.join(format!("{stem}_uc.csv")),
            metrics: self.dir.join(format!("{stem}_metrics.json")),
            stem,
        };
        let hr = session.heart_rate_history();
        let uc = session.uterine_history();
        write_channel(&saved.bpm, hr)?;
        write_channel(&saved.uc, uc)?;

        let summary = SessionSummary {
            label,
            saved_at,
            hr_samples: hr.len(),
            uc_samples: uc.len(),
            time_range: session.time_range(),
            metrics: session.metrics(),
            markers: session.markers(),
        };
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(&saved.metrics, json)
            .with_context(|| format!("Failed to write {}", saved.metrics.display()))?;
        info!("session saved: {} ({} hr samples)", saved.stem, hr.len());
        Ok(saved)
    }

    /// Chart snapshot next to the files of an earlier save.
    pub fn export_png(
        &self,
        session: &MonitorSession,
        saved: &SavedSession,
        style: PlotStyle,
    ) -> Result<PathBuf> {
        let path = self.dir.join(format!("{}.png", saved.stem));
        let png = render_session_png(session, style)?;
        fs::write(&path, png).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("chart exported: {}", path.display());
        Ok(path)
    }

    // 同一秒内重复保存时追加序号，避免覆盖
    fn unique_stem(&self, label: &str, saved_at: u64) -> String {
        let base = format!("ctg_{}_{}", sanitize_label(label), saved_at);
        let taken = |stem: &str| self.dir.join(format!("{stem}_metrics.json")).exists();
        if !taken(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{base}_{n}"))
            .find(|stem| !taken(stem))
            .unwrap_or(base)
    }
}

fn write_channel(path: &Path, buffer: &ChannelBuffer) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    writeln!(w, "time_sec,value")?;
    for sample in buffer.iter() {
        writeln!(w, "{},{}", sample.time, sample.value)?;
    }
    w.flush()?;
    Ok(())
}

// 文件名只保留字母数字，其余替换为下划线
fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "session".to_owned()
    } else {
        cleaned
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
