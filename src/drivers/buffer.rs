use std::collections::VecDeque;
use serde::{Deserialize, Serialize};
use crate::drivers::MonitorError;
/// One timestamped measurement of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Elapsed time since observation start, in the channel's time unit.
    pub time: f64,
    /// BPM for the heart-rate channel, %-activity for the uterine channel.
    pub value: f64,
}
impl Sample {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}
/// Observed min/max of sample values, used for axis rescaling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}
impl ValueRange {
    pub fn point(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }
    pub fn include(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }
    pub fn union(self, other: ValueRange) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}
/// Ordered samples of one channel, optionally capped to a rolling window.
///
/// Live buffers are windowed: incoming batches overwrite the part of the
/// recent tail they cover and append the rest, then the oldest samples are
/// dropped once the cap is exceeded. Replay buffers are loaded once and keep
/// the whole history.
#[derive(Clone, Debug)]
pub struct ChannelBuffer {
    samples: VecDeque<Sample>,
    max_len: Option<usize>,
}
impl ChannelBuffer {
    pub fn windowed(max_len: usize) -> Result<Self, MonitorError> {
        if max_len == 0 {
            return Err(MonitorError::InvalidWindow);
        }
        Ok(Self {
            samples: VecDeque::with_capacity(max_len),
            max_len: Some(max_len),
        })
    }
    pub fn unbounded() -> Self {
        Self {
            samples: VecDeque::new(),
            max_len: None,
        }
    }
    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }
    pub fn first(&self) -> Option<&Sample> {
        self.samples.front()
    }
    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
    pub fn clear(&mut self) {
        self.samples.clear();
    }
    /// Point list in the `[x, y]` layout the chart layer consumes.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.samples.iter().map(|s| [s.time, s.value]).collect()
    }
    /// Min/max over everything currently retained.
    pub fn value_range(&self) -> Option<ValueRange> {
        let mut iter = self.samples.iter();
        let mut range = ValueRange::point(iter.next()?.value);
        for s in iter {
            range.include(s.value);
        }
        Some(range)
    }
    /// Merge a time-ordered batch into the buffer.
    ///
    /// Only the most recent `max_len - 1` samples are eligible for overwrite.
    /// Within that tail the write position starts at the first sample whose
    /// time is not older than the batch's first sample; from there each batch
    /// sample replaces the existing entry or is appended past the end.
    /// Returns the min/max value seen in the batch, `None` for an empty batch.
    ///
    /// A batch older than everything in the tail overwrites from the head of
    /// the tail. Batches are not re-sorted.
    pub fn merge(&mut self, batch: &[Sample]) -> Option<ValueRange> {
        let first = batch.first()?;
        let len = self.samples.len();
        let eligible = self.max_len.map_or(len, |max| max.saturating_sub(1));
        let mut j = len.saturating_sub(eligible);
        while j < len && self.samples[j].time < first.time {
            j += 1;
        }
        let mut range = ValueRange::point(first.value);
        for (k, sample) in batch.iter().enumerate() {
            range.include(sample.value);
            match self.samples.get_mut(j + k) {
                Some(slot) => *slot = *sample,
                None => self.samples.push_back(*sample),
            }
        }
        self.enforce_cap();
        Some(range)
    }
    /// Replace the contents with a complete recording given as parallel
    /// arrays. Pairs up to the shorter of the two are kept and the window cap
    /// is lifted so the full history stays reviewable.
    pub fn load_full(
        &mut self,
        time_sec: &[f64],
        values: &[f64],
        time_scale: f64,
    ) -> Option<ValueRange> {
        self.samples.clear();
        self.max_len = None;
        let mut range: Option<ValueRange> = None;
        for (&t, &v) in time_sec.iter().zip(values) {
            match range.as_mut() {
                Some(r) => r.include(v),
                None => range = Some(ValueRange::point(v)),
            }
            self.samples.push_back(Sample::new(t * time_scale, v));
        }
        range
    }
    fn enforce_cap(&mut self) {
        if let Some(max) = self.max_len {
            if self.samples.len() > max {
                let excess = self.samples.len() - max;
                self.samples.drain(..excess);
            }
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn buffer_of(max_len: usize, samples: &[(f64, f64)]) -> ChannelBuffer {
        let mut buffer = ChannelBuffer::windowed(max_len).unwrap();
        for &(t, v) in samples {
            buffer.samples.push_back(Sample::new(t, v));
        }
        buffer
    }
    fn pairs(buffer: &ChannelBuffer) -> Vec<(f64, f64)> {
        buffer.iter().map(|s| (s.time, s.value)).collect()
    }
    fn batch(samples: &[(f64, f64)]) -> Vec<Sample> {
        samples.iter().map(|&(t, v)| Sample::new(t, v)).collect()
    }
    #[test]
    fn zero_window_is_rejected() {
        assert!(matches!(
            ChannelBuffer::windowed(0),
            Err(MonitorError::InvalidWindow)
        ));
    }
    #[test]
    fn overlapping_sample_overwrites_in_place() {
        let mut buffer = buffer_of(10, &[(0.0, 10.0), (1.0, 11.0), (2.0, 12.0)]);
        buffer.merge(&batch(&[(1.0, 99.0)]));
        assert_eq!(pairs(&buffer), vec![(0.0, 10.0), (1.0, 99.0), (2.0, 12.0)]);
    }
    #[test]
    fn newer_sample_is_appended() {
        let mut buffer = buffer_of(10, &[(0.0, 10.0), (1.0, 11.0)]);
        buffer.merge(&batch(&[(2.0, 50.0)]));
        assert_eq!(pairs(&buffer), vec![(0.0, 10.0), (1.0, 11.0), (2.0, 50.0)]);
    }
    #[test]
    fn batch_straddling_the_tail_overwrites_then_appends() {
        let mut buffer = buffer_of(10, &[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);
        buffer.merge(&batch(&[(2.0, 30.0), (3.0, 40.0), (4.0, 50.0)]));
        assert_eq!(
            pairs(&buffer),
            vec![(0.0, 1.0), (1.0, 2.0), (2.0, 30.0), (3.0, 40.0), (4.0, 50.0)]
        );
    }
    #[test]
    fn full_buffer_drops_oldest_on_append() {
        let initial: Vec<(f64, f64)> = (0..5).map(|i| (i as f64, i as f64)).collect();
        let mut buffer = buffer_of(5, &initial);
        buffer.merge(&batch(&[(5.0, 5.0), (6.0, 6.0)]));
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.first().unwrap().time, 2.0);
        assert_eq!(buffer.last().unwrap().time, 6.0);
    }
    #[test]
    fn merge_reports_batch_min_max_only() {
        let mut buffer = buffer_of(10, &[(0.0, -1000.0), (1.0, 1000.0)]);
        let range = buffer.merge(&batch(&[(2.0, 5.0), (3.0, 200.0)])).unwrap();
        assert_eq!(
            range,
            ValueRange {
                min: 5.0,
                max: 200.0
            }
        );
    }
    #[test]
    fn empty_batch_is_a_no_op() {
        let mut buffer = buffer_of(10, &[(0.0, 10.0)]);
        assert!(buffer.merge(&[]).is_none());
        assert_eq!(pairs(&buffer), vec![(0.0, 10.0)]);
    }
    #[test]
    fn empty_buffer_appends_everything() {
        let mut buffer = ChannelBuffer::windowed(4).unwrap();
        buffer.merge(&batch(&[(0.0, 1.0), (1.0, 2.0)]));
        assert_eq!(pairs(&buffer), vec![(0.0, 1.0), (1.0, 2.0)]);
    }
    #[test]
    fn stale_batch_overwrites_from_window_head() {
        let mut buffer = buffer_of(10, &[(5.0, 1.0), (6.0, 2.0), (7.0, 3.0)]);
        buffer.merge(&batch(&[(1.0, 9.0)]));
        assert_eq!(pairs(&buffer), vec![(1.0, 9.0), (6.0, 2.0), (7.0, 3.0)]);
    }
    #[test]
    fn history_before_the_window_tail_is_never_touched() {
        let initial: Vec<(f64, f64)> = (0..4).map(|i| (i as f64, 0.0)).collect();
        let mut buffer = buffer_of(3, &initial);
        // Eligible tail starts at index 2 (len 4 - (3 - 1)).
        buffer.merge(&batch(&[(0.0, 7.0)]));
        assert_eq!(buffer.len(), 3);
        assert_eq!(pairs(&buffer), vec![(1.0, 0.0), (0.0, 7.0), (3.0, 0.0)]);
    }
    #[test]
    fn streaming_keeps_cap_and_order() {
        let mut buffer = ChannelBuffer::windowed(52).unwrap();
        let mut t = 0.0;
        for round in 0..40 {
            // Each batch re-sends the last two samples and adds five new ones.
            let start = (t - 2.0f64).max(0.0);
            let samples: Vec<Sample> = (0..7)
                .map(|i| Sample::new(start + i as f64, (round * 7 + i) as f64))
                .collect();
            t = start + 7.0;
            buffer.merge(&samples);
            assert!(buffer.len() <= 52);
            let times: Vec<f64> = buffer.iter().map(|s| s.time).collect();
            assert!(times.windows(2).all(|w| w[0] <= w[1]), "unordered: {times:?}");
        }
        assert_eq!(buffer.len(), 52);
        assert_eq!(buffer.last().unwrap().time, t - 1.0);
    }
    #[test]
    fn full_load_truncates_to_shorter_array() {
        let mut buffer = ChannelBuffer::windowed(1).unwrap();
        let range = buffer.load_full(&[0.0, 1.0, 2.0], &[5.0, 6.0], 1.0).unwrap();
        assert_eq!(pairs(&buffer), vec![(0.0, 5.0), (1.0, 6.0)]);
        assert_eq!(buffer.max_len(), None);
        assert_eq!(
            range,
            ValueRange {
                min: 5.0,
                max: 6.0
            }
        );
    }
    #[test]
    fn full_load_applies_time_scale() {
        let mut buffer = ChannelBuffer::unbounded();
        buffer.load_full(&[1.0, 2.0], &[3.0, 4.0], 1000.0);
        assert_eq!(buffer.points(), vec![[1000.0, 3.0], [2000.0, 4.0]]);
    }
    #[test]
    fn full_load_of_empty_arrays_yields_empty_buffer() {
        let mut buffer = buffer_of(10, &[(0.0, 1.0)]);
        assert!(buffer.load_full(&[], &[1.0], 1.0).is_none());
        assert!(buffer.is_empty());
    }
}
