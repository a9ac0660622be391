//! Typed schema of the analysis backend's records.
//!
//! Every field the backend may omit is defaulted so a partial live message
//! still deserializes; structural problems (wrong types, broken JSON) surface
//! as [`MonitorError::Payload`] at this boundary and nowhere else.
use serde::{Deserialize, Serialize};
use crate::drivers::buffer::Sample;
use crate::drivers::MonitorError;
/// Parallel `time_sec[]` / `value[]` arrays for one channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesBatch {
    #[serde(default)]
    pub time_sec: Vec<f64>,
    #[serde(default)]
    pub value: Vec<f64>,
}
impl SeriesBatch {
    pub fn new(time_sec: Vec<f64>, value: Vec<f64>) -> Self {
        Self { time_sec, value }
    }
    /// Number of usable pairs (the shorter of the two arrays).
    pub fn len(&self) -> usize {
        self.time_sec.len().min(self.value.len())
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn is_ragged(&self) -> bool {
        self.time_sec.len() != self.value.len()
    }
    /// Zip into samples, scaling time into the channel's unit.
    pub fn to_samples(&self, time_scale: f64) -> Vec<Sample> {
        self.time_sec
            .iter()
            .zip(&self.value)
            .map(|(&t, &v)| Sample::new(t * time_scale, v))
            .collect()
    }
}
/// A detected event, located by its start index into the filtered series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventIndex {
    pub start: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_late: Option<bool>,
}
impl EventIndex {
    pub fn at(start: usize) -> Self {
        Self {
            start,
            ..Self::default()
        }
    }
}
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Records {
    #[serde(default)]
    pub filtered_bpm_batch: SeriesBatch,
    #[serde(default)]
    pub filtered_uterus_batch: SeriesBatch,
    #[serde(default)]
    pub accelerations: Vec<EventIndex>,
    #[serde(default)]
    pub decelerations: Vec<EventIndex>,
    #[serde(default)]
    pub contractions: Vec<EventIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ltv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_heart_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_deceleration_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_accelerations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_decelerations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_contractions: Option<u32>,
}
/// Response to a batch upload of a complete recording.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub session_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub records: Records,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
impl UploadResponse {
    pub fn from_json(text: &str) -> Result<Self, MonitorError> {
        Ok(serde_json::from_str(text)?)
    }
}
/// One live-channel message, delivered per arriving batch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub records: Records,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<f64>,
}
impl StreamMessage {
    pub fn from_json(text: &str) -> Result<Self, MonitorError> {
        Ok(serde_json::from_str(text)?)
    }
    pub fn to_json(&self) -> Result<String, MonitorError> {
        Ok(serde_json::to_string(self)?)
    }
}
