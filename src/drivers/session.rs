use log::{debug, info, warn};
use crate::drivers::buffer::{ChannelBuffer, ValueRange};
use crate::drivers::events::{resolve_markers, EventKind, EventMarker};
use crate::drivers::metrics::SummaryMetrics;
use crate::drivers::payload::{SeriesBatch, StreamMessage, UploadResponse};
use crate::drivers::MonitorError;
/// Window and unit settings shared by both channels of a session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionLayout {
    /// Cap of the live rolling buffers, in samples.
    pub live_window: usize,
    /// Multiplier from backend seconds to the heart-rate chart's time unit.
    pub hr_time_scale: f64,
    /// Multiplier from backend seconds to the uterine chart's time unit.
    pub uc_time_scale: f64,
}
impl Default for SessionLayout {
    fn default() -> Self {
        Self {
            live_window: 52,
            hr_time_scale: 1.0,
            uc_time_scale: 1.0,
        }
    }
}
/// What one update changed, for axis rescaling.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateSummary {
    pub heart_rate: Option<ValueRange>,
    pub uterine: Option<ValueRange>,
    /// Combined time span of both channels after the update.
    pub time_range: Option<(f64, f64)>,
    pub markers: usize,
}
/// Point lists handed to the chart layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionSnapshot {
    pub heart_rate: Vec<[f64; 2]>,
    pub uterine: Vec<[f64; 2]>,
    pub markers: Vec<EventMarker>,
    pub time_range: Option<(f64, f64)>,
}
/// Both channel buffers of one recording plus everything derived from them.
///
/// The live buffers are capped at `live_window` and only feed the charts;
/// the history buffers keep every merged sample of the session for saving.
///
/// Created on session start and dropped (or [`reset`](Self::reset)) when a
/// new one begins. All mutation happens through `&mut self` on the thread
/// that owns the session.
#[derive(Clone, Debug)]
pub struct MonitorSession {
    layout: SessionLayout,
    heart_rate: ChannelBuffer,
    uterine: ChannelBuffer,
    hr_history: ChannelBuffer,
    uc_history: ChannelBuffer,
    /// Empty live buffer with the validated window, cloned on reset.
    live_template: ChannelBuffer,
    markers: Vec<EventMarker>,
    metrics: SummaryMetrics,
    time_range: Option<(f64, f64)>,
    batches: usize,
}
impl MonitorSession {
    pub fn new(layout: SessionLayout) -> Result<Self, MonitorError> {
        let live_template = ChannelBuffer::windowed(layout.live_window)?;
        Ok(Self {
            layout,
            heart_rate: live_template.clone(),
            uterine: live_template.clone(),
            hr_history: ChannelBuffer::unbounded(),
            uc_history: ChannelBuffer::unbounded(),
            live_template,
            markers: Vec::new(),
            metrics: SummaryMetrics::default(),
            time_range: None,
            batches: 0,
        })
    }
    pub fn layout(&self) -> SessionLayout {
        self.layout
    }
    pub fn heart_rate(&self) -> &ChannelBuffer {
        &self.heart_rate
    }
    pub fn uterine(&self) -> &ChannelBuffer {
        &self.uterine
    }
    /// Every heart-rate sample merged since the last reset.
    pub fn heart_rate_history(&self) -> &ChannelBuffer {
        &self.hr_history
    }
    pub fn uterine_history(&self) -> &ChannelBuffer {
        &self.uc_history
    }
    pub fn markers(&self) -> &[EventMarker] {
        &self.markers
    }
    pub fn metrics(&self) -> &SummaryMetrics {
        &self.metrics
    }
    pub fn time_range(&self) -> Option<(f64, f64)> {
        self.time_range
    }
    pub fn batches_applied(&self) -> usize {
        self.batches
    }
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            heart_rate: self.heart_rate.points(),
            uterine: self.uterine.points(),
            markers: self.markers.clone(),
            time_range: self.time_range,
        }
    }
    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_empty() && self.uterine.is_empty()
    }
    /// Discard everything and start over with fresh live buffers.
    pub fn reset(&mut self) {
        self.heart_rate = self.live_template.clone();
        self.uterine = self.live_template.clone();
        self.hr_history.clear();
        self.uc_history.clear();
        self.markers.clear();
        self.metrics = SummaryMetrics::default();
        self.time_range = None;
        self.batches = 0;
        info!("session reset");
    }
    /// Merge one live message into the session.
    ///
    /// The two channels are merged independently; only after both are done
    /// is the shared time range recomputed and the markers and metrics
    /// replaced.
    pub fn apply_update(&mut self, message: &StreamMessage) -> UpdateSummary {
        let records = &message.records;
        warn_if_ragged("heart rate", &records.filtered_bpm_batch);
        warn_if_ragged("uterine", &records.filtered_uterus_batch);
        let hr_batch = records.filtered_bpm_batch.to_samples(self.layout.hr_time_scale);
        let uc_batch = records.filtered_uterus_batch.to_samples(self.layout.uc_time_scale);
        let hr = self.heart_rate.merge(&hr_batch);
        let uc = self.uterine.merge(&uc_batch);
        self.hr_history.merge(&hr_batch);
        self.uc_history.merge(&uc_batch);
        self.batches += 1;
        debug!(
            "batch {}: hr {} samples ({} retained), uc {} samples ({} retained)",
            self.batches,
            records.filtered_bpm_batch.len(),
            self.heart_rate.len(),
            records.filtered_uterus_batch.len(),
            self.uterine.len()
        );
        self.finish_update(message, hr, uc)
    }
    /// Load a complete recording for offline review, keeping all samples.
    pub fn load_recording(&mut self, response: &UploadResponse) -> UpdateSummary {
        self.reset();
        let records = &response.records;
        let hr = self.heart_rate.load_full(
            &records.filtered_bpm_batch.time_sec,
            &records.filtered_bpm_batch.value,
            self.layout.hr_time_scale,
        );
        let uc = self.uterine.load_full(
            &records.filtered_uterus_batch.time_sec,
            &records.filtered_uterus_batch.value,
            self.layout.uc_time_scale,
        );
        self.hr_history = self.heart_rate.clone();
        self.uc_history = self.uterine.clone();
        self.batches = 1;
        info!(
            "loaded recording {}: {} hr / {} uc samples",
            response.session_id,
            self.heart_rate.len(),
            self.uterine.len()
        );
        let message = StreamMessage {
            session_id: Some(response.session_id.clone()),
            records: records.clone(),
            prediction: response.prediction,
        };
        self.finish_update(&message, hr, uc)
    }
    fn finish_update(
        &mut self,
        message: &StreamMessage,
        hr: Option<ValueRange>,
        uc: Option<ValueRange>,
    ) -> UpdateSummary {
        self.time_range = combined_time_range(&self.heart_rate, &self.uterine);
        let records = &message.records;
        let mut markers =
            resolve_markers(&self.heart_rate, &records.accelerations, EventKind::Acceleration);
        markers.extend(resolve_markers(
            &self.heart_rate,
            &records.decelerations,
            EventKind::Deceleration,
        ));
        markers.extend(resolve_markers(
            &self.uterine,
            &records.contractions,
            EventKind::Contraction,
        ));
        self.markers = markers;
        self.metrics = SummaryMetrics::from_records(records, message.prediction);
        UpdateSummary {
            heart_rate: hr,
            uterine: uc,
            time_range: self.time_range,
            markers: self.markers.len(),
        }
    }
}
fn combined_time_range(a: &ChannelBuffer, b: &ChannelBuffer) -> Option<(f64, f64)> {
    let firsts = [a.first(), b.first()];
    let lasts = [a.last(), b.last()];
    let start = firsts
        .iter()
        .flatten()
        .map(|s| s.time)
        .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.min(t))))?;
    let end = lasts
        .iter()
        .flatten()
        .map(|s| s.time)
        .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.max(t))))?;
    Some((start, end))
}
fn warn_if_ragged(channel: &str, batch: &SeriesBatch) {
    if batch.is_ragged() {
        warn!(
            "{channel} batch has {} times but {} values; using the first {}",
            batch.time_sec.len(),
            batch.value.len(),
            batch.len()
        );
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::payload::{EventIndex, Records};
    fn message(hr: &[(f64, f64)], uc: &[(f64, f64)]) -> StreamMessage {
        let split = |pairs: &[(f64, f64)]| {
            SeriesBatch::new(
                pairs.iter().map(|p| p.0).collect(),
                pairs.iter().map(|p| p.1).collect(),
            )
        };
        StreamMessage {
            session_id: None,
            records: Records {
                filtered_bpm_batch: split(hr),
                filtered_uterus_batch: split(uc),
                ..Records::default()
            },
            prediction: None,
        }
    }
    #[test]
    fn update_merges_both_channels_and_combines_time_range() {
        let mut session = MonitorSession::new(SessionLayout::default()).unwrap();
        let summary = session.apply_update(&message(
            &[(1.0, 140.0), (2.0, 150.0)],
            &[(0.5, 10.0), (1.5, 30.0)],
        ));
        assert_eq!(summary.time_range, Some((0.5, 2.0)));
        let hr = ValueRange {
            min: 140.0,
            max: 150.0,
        };
        let uc = ValueRange {
            min: 10.0,
            max: 30.0,
        };
        assert_eq!(summary.heart_rate, Some(hr));
        assert_eq!(summary.uterine, Some(uc));
        assert_eq!(session.heart_rate().len(), 2);
        assert_eq!(session.batches_applied(), 1);
    }
    #[test]
    fn markers_are_replaced_not_accumulated() {
        let mut session = MonitorSession::new(SessionLayout::default()).unwrap();
        let mut first = message(&[(0.0, 140.0), (1.0, 160.0), (2.0, 120.0)], &[(0.0, 40.0)]);
        first.records.accelerations = vec![EventIndex::at(1)];
        first.records.contractions = vec![EventIndex::at(0)];
        session.apply_update(&first);
        assert_eq!(session.markers().len(), 2);

        let mut second = message(&[(3.0, 110.0)], &[]);
        second.records.decelerations = vec![EventIndex::at(3)];
        let summary = session.apply_update(&second);
        assert_eq!(summary.markers, 1);
        assert_eq!(
            session.markers(),
            &[EventMarker {
                time: 3.0,
                value: 110.0,
                kind: EventKind::Deceleration
            }]
        );
    }
    #[test]
    fn live_buffers_respect_window() {
        let layout = SessionLayout {
            live_window: 4,
            ..SessionLayout::default()
        };
        let mut session = MonitorSession::new(layout).unwrap();
        for i in 0..10 {
            let t = i as f64;
            session.apply_update(&message(&[(t, 140.0)], &[(t, 20.0)]));
        }
        assert_eq!(session.heart_rate().len(), 4);
        assert_eq!(session.uterine().first().unwrap().time, 6.0);
        assert_eq!(session.time_range(), Some((6.0, 9.0)));
    }
    #[test]
    fn recording_load_keeps_full_history_and_metrics() {
        let mut session = MonitorSession::new(SessionLayout {
            live_window: 2,
            ..SessionLayout::default()
        })
        .unwrap();
        let mut response = UploadResponse {
            session_id: "session_42".into(),
            prediction: Some(0.9),
            ..UploadResponse::default()
        };
        response.records.filtered_bpm_batch =
            SeriesBatch::new(vec![0.0, 1.0, 2.0, 3.0], vec![140.0, 141.0, 142.0, 143.0]);
        response.records.filtered_uterus_batch =
            SeriesBatch::new(vec![0.0, 1.0, 2.0], vec![5.0, 6.0]);
        response.records.stv = Some(6.0);
        let summary = session.load_recording(&response);
        assert_eq!(session.heart_rate().len(), 4);
        assert_eq!(session.uterine().len(), 2);
        assert_eq!(summary.time_range, Some((0.0, 3.0)));
        assert_eq!(session.metrics().stv, Some(6.0));
        assert_eq!(session.metrics().prediction, Some(0.9));
    }
    #[test]
    fn time_scale_is_applied_per_channel() {
        let layout = SessionLayout {
            hr_time_scale: 1000.0,
            ..SessionLayout::default()
        };
        let mut session = MonitorSession::new(layout).unwrap();
        session.apply_update(&message(&[(2.0, 140.0)], &[(2.0, 20.0)]));
        assert_eq!(session.heart_rate().first().unwrap().time, 2000.0);
        assert_eq!(session.uterine().first().unwrap().time, 2.0);
    }
    #[test]
    fn reset_discards_everything() {
        let mut session = MonitorSession::new(SessionLayout::default()).unwrap();
        session.apply_update(&message(&[(0.0, 140.0)], &[(0.0, 20.0)]));
        session.reset();
        assert!(session.is_empty());
        assert!(session.markers().is_empty());
        assert_eq!(session.time_range(), None);
        assert_eq!(session.heart_rate().max_len(), Some(52));
        assert!(session.heart_rate_history().is_empty());
    }
    #[test]
    fn reset_after_recording_load_restores_window() {
        let mut session = MonitorSession::new(SessionLayout {
            live_window: 3,
            ..SessionLayout::default()
        })
        .unwrap();
        let mut response = UploadResponse::default();
        response.records.filtered_bpm_batch = SeriesBatch::new(vec![0.0; 5], vec![140.0; 5]);
        session.load_recording(&response);
        assert_eq!(session.heart_rate().max_len(), None);
        session.reset();
        assert_eq!(session.heart_rate().max_len(), Some(3));
        assert_eq!(session.uterine().max_len(), Some(3));
    }
    #[test]
    fn history_keeps_samples_the_window_drops() {
        let layout = SessionLayout {
            live_window: 4,
            ..SessionLayout::default()
        };
        let mut session = MonitorSession::new(layout).unwrap();
        for i in 0..10 {
            let t = i as f64;
            session.apply_update(&message(&[(t, 140.0 + t)], &[(t, 20.0)]));
        }
        // Re-sent overlap is overwritten in history too.
        session.apply_update(&message(&[(9.0, 99.0)], &[]));
        assert_eq!(session.heart_rate().len(), 4);
        assert_eq!(session.heart_rate_history().len(), 10);
        assert_eq!(session.uterine_history().len(), 10);
        assert_eq!(session.heart_rate_history().first().unwrap().value, 140.0);
        assert_eq!(session.heart_rate_history().last().unwrap().value, 99.0);
    }
    #[test]
    fn snapshot_mirrors_buffers_and_markers() {
        let mut session = MonitorSession::new(SessionLayout::default()).unwrap();
        let mut msg = message(&[(0.0, 140.0), (1.0, 165.0)], &[(0.0, 20.0)]);
        msg.records.accelerations = vec![EventIndex::at(1)];
        session.apply_update(&msg);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.heart_rate, vec![[0.0, 140.0], [1.0, 165.0]]);
        assert_eq!(snapshot.uterine, vec![[0.0, 20.0]]);
        assert_eq!(snapshot.markers.len(), 1);
        assert_eq!(snapshot.time_range, Some((0.0, 1.0)));
    }
}
