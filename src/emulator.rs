// src/emulator.rs
// 模拟后端：生成胎心率 / 宫缩批次，格式与实时通道的消息一致
use std::collections::VecDeque;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::config::EmulatorConfig;
use crate::drivers::{
    BatchSource, EventIndex, MonitorError, Records, SeriesBatch, StreamMessage,
};
/// Distance from baseline (bpm) that counts as an acceleration/deceleration.
const EVENT_THRESHOLD_BPM: f64 = 15.0;
/// Uterine activity (%) above which a peak counts as a contraction.
const CONTRACTION_THRESHOLD: f64 = 50.0;
/// Synthetic producer of live messages.
///
/// It keeps a mirror of the last `window` samples it sent so the event
/// indices it reports line up with a live buffer of the same cap.
pub struct Emulator {
    config: EmulatorConfig,
    rng: StdRng,
    window: usize,
    next_index: u64,
    hr: VecDeque<f64>,
    uc: VecDeque<f64>,
    total_accelerations: u32,
    total_decelerations: u32,
    late_decelerations: u32,
    total_contractions: u32,
}
impl Emulator {
    pub fn new(config: EmulatorConfig, window: usize) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            window: window.max(1),
            next_index: 0,
            hr: VecDeque::new(),
            uc: VecDeque::new(),
            total_accelerations: 0,
            total_decelerations: 0,
            late_decelerations: 0,
            total_contractions: 0,
        }
    }
    pub fn samples_sent(&self) -> u64 {
        self.next_index
    }
    fn next_heart_rate(&mut self, t: f64) -> f64 {
        let cfg = &self.config;
        // Slow wander plus occasional excursions so events show up.
        let wander = (t / 40.0).sin() * cfg.variability_bpm * 0.5;
        let excursion = match (t / 90.0).sin() {
            s if s > 0.97 => 25.0,
            s if s < -0.97 => -30.0,
            _ => 0.0,
        };
        let jitter = self
            .rng
            .gen_range(-cfg.variability_bpm..=cfg.variability_bpm);
        (cfg.base_bpm + wander + excursion + jitter).clamp(cfg.min_bpm, cfg.max_bpm)
    }
    fn next_uterine(&mut self, t: f64) -> f64 {
        let period = self.config.contraction_period_sec.max(1.0);
        let phase = t % period;
        let width = period / 10.0;
        let bump = (-((phase - period / 2.0) / width).powi(2)).exp();
        let noise = self.rng.gen_range(-2.0..=2.0);
        (10.0 + 60.0 * bump + noise).clamp(0.0, 100.0)
    }
    fn push_mirror(buf: &mut VecDeque<f64>, value: f64, window: usize) {
        buf.push_back(value);
        if buf.len() > window {
            buf.pop_front();
        }
    }
    fn generate(&mut self) -> StreamMessage {
        let dt = 1.0 / self.config.sample_rate_hz;
        let n = self.config.batch_size;
        let mut time_sec = Vec::with_capacity(n);
        let mut bpm = Vec::with_capacity(n);
        let mut uterus = Vec::with_capacity(n);
        for _ in 0..n {
            let t = self.next_index as f64 * dt;
            let h = self.next_heart_rate(t);
            let u = self.next_uterine(t);
            time_sec.push(t);
            bpm.push(h);
            uterus.push(u);
            Self::push_mirror(&mut self.hr, h, self.window);
            Self::push_mirror(&mut self.uc, u, self.window);
            self.next_index += 1;
        }
        let base = self.config.base_bpm;
        let accelerations =
            local_extrema(&self.hr, |v, peak| peak && v > base + EVENT_THRESHOLD_BPM);
        let decelerations =
            local_extrema(&self.hr, |v, peak| !peak && v < base - EVENT_THRESHOLD_BPM);
        let contractions: Vec<EventIndex> =
            local_extrema(&self.uc, |v, peak| peak && v > CONTRACTION_THRESHOLD)
                .into_iter()
                .map(|mut e| {
                    e.amplitude = self.uc.get(e.start).map(|v| v - 10.0);
                    e
                })
                .collect();
        // Only events that appeared in the fresh tail count towards totals.
        let fresh = self.hr.len().saturating_sub(n);
        let new_in = |events: &[EventIndex]| {
            events.iter().filter(|e| e.start >= fresh).count() as u32
        };
        self.total_accelerations += new_in(&accelerations);
        let new_decels = new_in(&decelerations);
        self.total_decelerations += new_decels;
        let uc_peak_now = self.uc.iter().skip(fresh).any(|&v| v > CONTRACTION_THRESHOLD);
        if uc_peak_now {
            self.late_decelerations += new_decels;
        }
        self.total_contractions += new_in(&contractions);
        let stv = mean_abs_successive_diff(&self.hr);
        let (lo, hi) = self
            .hr
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let baseline = self.hr.iter().sum::<f64>() / self.hr.len() as f64;
        let late_ratio = if self.total_decelerations == 0 {
            0.0
        } else {
            100.0 * self.late_decelerations as f64 / self.total_decelerations as f64
        };
        let prediction = (0.05
            + 0.1 * self.total_decelerations as f64
            + late_ratio / 200.0
            - 0.02 * self.total_accelerations as f64)
            .clamp(0.0, 1.0);
        StreamMessage {
            session_id: None,
            records: Records {
                filtered_bpm_batch: SeriesBatch::new(time_sec.clone(), bpm),
                filtered_uterus_batch: SeriesBatch::new(time_sec, uterus),
                accelerations,
                decelerations: decelerations
                    .into_iter()
                    .map(|mut e| {
                        e.is_late = Some(uc_peak_now);
                        e
                    })
                    .collect(),
                contractions,
                stv: Some(stv),
                ltv: Some(hi - lo),
                baseline_heart_rate: Some(baseline),
                late_deceleration_ratio: Some(late_ratio),
                total_accelerations: Some(self.total_accelerations),
                total_decelerations: Some(self.total_decelerations),
                total_contractions: Some(self.total_contractions),
            },
            prediction: Some(prediction),
        }
    }
}
impl BatchSource for Emulator {
    fn next_batch(&mut self) -> Result<Option<StreamMessage>, MonitorError> {
        Ok(Some(self.generate()))
    }
}
/// Indices of strict local maxima (`peak == true`) or minima that pass `keep`.
fn local_extrema(values: &VecDeque<f64>, keep: impl Fn(f64, bool) -> bool) -> Vec<EventIndex> {
    let mut out = Vec::new();
    for i in 1..values.len().saturating_sub(1) {
        let (prev, cur, next) = (values[i - 1], values[i], values[i + 1]);
        if cur > prev && cur > next && keep(cur, true) {
            out.push(EventIndex::at(i));
        } else if cur < prev && cur < next && keep(cur, false) {
            out.push(EventIndex::at(i));
        }
    }
    out
}
fn mean_abs_successive_diff(values: &VecDeque<f64>) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sum: f64 = values
        .iter()
        .zip(values.iter().skip(1))
        .map(|(a, b)| (b - a).abs())
        .sum();
    sum / (values.len() - 1) as f64
}
