use serde::{Deserialize, Serialize};
use crate::drivers::payload::Records;
/// Three-level display status of a metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Normal,
    Caution,
    Critical,
}
/// Latest scalar values reported by the backend. No history is kept.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub stv: Option<f64>,
    pub ltv: Option<f64>,
    pub baseline_heart_rate: Option<f64>,
    pub late_deceleration_ratio: Option<f64>,
    pub total_accelerations: Option<u32>,
    pub total_decelerations: Option<u32>,
    pub total_contractions: Option<u32>,
    pub mean_contraction_amplitude: Option<f64>,
    pub prediction: Option<f64>,
}
impl SummaryMetrics {
    pub fn from_records(records: &Records, prediction: Option<f64>) -> Self {
        let amplitudes: Vec<f64> = records
            .contractions
            .iter()
            .filter_map(|c| c.amplitude)
            .collect();
        let mean_contraction_amplitude = if amplitudes.is_empty() {
            None
        } else {
            Some(amplitudes.iter().sum::<f64>() / amplitudes.len() as f64)
        };
        Self {
            stv: records.stv,
            ltv: records.ltv,
            baseline_heart_rate: records.baseline_heart_rate,
            late_deceleration_ratio: records.late_deceleration_ratio,
            total_accelerations: records.total_accelerations,
            total_decelerations: records.total_decelerations,
            total_contractions: records.total_contractions,
            mean_contraction_amplitude,
            prediction,
        }
    }
    /// Display rows in dashboard order: label, formatted value, status.
    pub fn rows(&self) -> Vec<(&'static str, String, Option<Status>)> {
        let fmt = |v: Option<f64>, digits: usize| {
            v.map(|v| format!("{v:.digits$}"))
                .unwrap_or_else(|| "--".to_owned())
        };
        let count = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_else(|| "--".to_owned());
        vec![
            ("STV, ms", fmt(self.stv, 1), self.stv.map(stv_status)),
            ("LTV, ms", fmt(self.ltv, 1), self.ltv.map(ltv_status)),
            (
                "Baseline, bpm",
                fmt(self.baseline_heart_rate, 0),
                self.baseline_heart_rate.map(baseline_status),
            ),
            (
                "Late decelerations, %",
                fmt(self.late_deceleration_ratio, 1),
                self.late_deceleration_ratio.map(late_deceleration_status),
            ),
            (
                "Accelerations",
                count(self.total_accelerations),
                self.total_accelerations.map(acceleration_status),
            ),
            ("Decelerations", count(self.total_decelerations), None),
            ("Contractions", count(self.total_contractions), None),
            (
                "Contraction amplitude, %",
                fmt(self.mean_contraction_amplitude, 1),
                self.mean_contraction_amplitude.map(contraction_amplitude_status),
            ),
        ]
    }
}
pub fn stv_status(value: f64) -> Status {
    if value > 4.0 {
        Status::Normal
    } else if value > 3.0 {
        Status::Caution
    } else {
        Status::Critical
    }
}
pub fn ltv_status(value: f64) -> Status {
    if value > 40.0 {
        Status::Normal
    } else if value > 30.0 {
        Status::Caution
    } else {
        Status::Critical
    }
}
pub fn baseline_status(value: f64) -> Status {
    if value > 160.0 || value < 110.0 {
        Status::Caution
    } else {
        Status::Normal
    }
}
pub fn late_deceleration_status(percent: f64) -> Status {
    if percent > 50.0 {
        Status::Critical
    } else if percent > 10.0 {
        Status::Caution
    } else {
        Status::Normal
    }
}
pub fn contraction_amplitude_status(value: f64) -> Status {
    if value > 20.0 {
        Status::Normal
    } else if value > 10.0 {
        Status::Caution
    } else {
        Status::Critical
    }
}
pub fn acceleration_status(count: u32) -> Status {
    if count > 2 {
        Status::Normal
    } else if count > 1 {
        Status::Caution
    } else {
        Status::Critical
    }
}
/// Status badge derived from the prediction score.
#[derive(Clone, Debug, PartialEq)]
pub struct Badge {
    pub status: Status,
    pub text: &'static str,
    /// Critical badges pulse to draw attention.
    pub pulse: bool,
}
pub fn prediction_badge(score: f64) -> Badge {
    if score > 0.8 {
        Badge {
            status: Status::Critical,
            text: "Emergency intervention",
            pulse: true,
        }
    } else if score > 0.2 {
        Badge {
            status: Status::Caution,
            text: "Elevated risk",
            pulse: false,
        }
    } else {
        Badge {
            status: Status::Normal,
            text: "All clear",
            pulse: false,
        }
    }
}
