// src/gui.rs
use eframe::egui;
use egui::{Color32, RichText};
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotBounds, PlotPoints, Points};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

use crate::config::{AxisBounds, MonitorConfig};
use crate::drivers::events::marker_points;
use crate::drivers::{
    load_csv_pair, prediction_badge, validate_pair, EventKind, MonitorError, MonitorSession,
    PlotStyle, PrimaryButton, RecordingAction, RecordingMachine, RecordingState, Status,
    UiState, UploadResponse, ValueRange,
};
use crate::engine;
use crate::recorder::SessionRecorder;
use crate::types::*;

const MAX_LOG_LINES: usize = 12;
const MAX_MESSAGES_PER_FRAME: usize = 50;

// 选择数据源（回放路径单独保存）
#[derive(PartialEq, Clone, Copy, Debug)]
enum SourceChoice {
    Emulator,
    Replay,
}

pub struct CtgMonitorApp {
    config: MonitorConfig,
    session: MonitorSession,
    machine: RecordingMachine,
    ui_state: UiState,
    connected: bool,
    // 最近一批数据的取值范围，用于实时缩放
    latest_hr: Option<ValueRange>,
    latest_uc: Option<ValueRange>,

    // 表单
    source_choice: SourceChoice,
    replay_path: String,
    bpm_path: String,
    uc_path: String,
    response_path: String,
    session_label: String,
    confirm_reset: bool,

    log_messages: Vec<String>,

    // 通讯管道
    rx: Receiver<FeedMessage>,
    tx_cmd: Sender<GuiCommand>,
}

impl CtgMonitorApp {
    pub fn new(config: MonitorConfig) -> Result<Self, MonitorError> {
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();

        // 启动后台数据线程
        engine::spawn_thread(tx, rx_cmd, config.clone());
        Self::with_channels(config, rx, tx_cmd)
    }

    fn with_channels(
        config: MonitorConfig,
        rx: Receiver<FeedMessage>,
        tx_cmd: Sender<GuiCommand>,
    ) -> Result<Self, MonitorError> {
        let session = MonitorSession::new(config.live_layout())?;
        let machine = RecordingMachine::new();
        Ok(Self {
            session,
            ui_state: machine.ui(),
            machine,
            connected: false,
            latest_hr: None,
            latest_uc: None,
            source_choice: SourceChoice::Emulator,
            replay_path: String::new(),
            bpm_path: String::new(),
            uc_path: String::new(),
            response_path: String::new(),
            session_label: "session".to_owned(),
            confirm_reset: false,
            log_messages: vec!["CTG Monitor ready.".to_owned()],
            config,
            rx,
            tx_cmd,
        })
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > MAX_LOG_LINES {
            self.log_messages.remove(0);
        }
    }

    fn transition(&mut self, action: RecordingAction) -> bool {
        match self.machine.apply(action) {
            Ok(ui_state) => {
                self.ui_state = ui_state;
                true
            }
            Err(MonitorError::NeedsConfirmation) => {
                self.log("Unsaved data: tick the confirmation box to discard it.");
                false
            }
            Err(e) => {
                warn!("{}", e);
                self.log(&e.to_string());
                false
            }
        }
    }

    fn feed_mode(&self) -> FeedMode {
        match self.source_choice {
            SourceChoice::Emulator => FeedMode::Emulator,
            SourceChoice::Replay => FeedMode::Replay(PathBuf::from(self.replay_path.trim())),
        }
    }

    fn start_feed(&mut self) {
        let mode = self.feed_mode();
        match MonitorSession::new(mode.layout(&self.config)) {
            Ok(session) => {
                self.session = session;
                self.latest_hr = None;
                self.latest_uc = None;
            }
            Err(e) => {
                self.log(&e.to_string());
                return;
            }
        }
        if self.transition(RecordingAction::Start) {
            self.tx_cmd.send(GuiCommand::StartFeed(mode)).ok();
        }
    }

    fn stop_feed(&mut self) {
        self.tx_cmd.send(GuiCommand::StopFeed).ok();
        self.transition(RecordingAction::Stop);
    }

    fn save_session(&mut self) {
        let recorder = SessionRecorder::new(&self.config.output_dir);
        match recorder.save(&self.session, &self.session_label) {
            Ok(saved) => {
                self.log(&format!("Saved {}", saved.metrics.display()));
                let style = PlotStyle {
                    hr_axis: self.config.hr_axis.range(),
                    uc_axis: self.config.uc_axis.range(),
                    ..PlotStyle::default()
                };
                // 图片导出失败不影响保存结果
                match recorder.export_png(&self.session, &saved, style) {
                    Ok(path) => self.log(&format!("Chart {}", path.display())),
                    Err(e) => warn!("chart export failed: {:#}", e),
                }
                self.transition(RecordingAction::Save);
            }
            Err(e) => self.log(&format!("Save failed: {:#}", e)),
        }
    }

    fn reset_session(&mut self) {
        if self.transition(RecordingAction::Reset { confirmed: self.confirm_reset }) {
            self.session.reset();
            self.latest_hr = None;
            self.latest_uc = None;
            self.confirm_reset = false;
            self.log("Session cleared.");
        }
    }

    fn import_csv_pair(&mut self) {
        let result = validate_pair(non_empty_path(&self.bpm_path), non_empty_path(&self.uc_path))
            .and_then(|pair| load_csv_pair(&pair, &self.session_label));
        self.finish_import(result);
    }

    fn import_response(&mut self) {
        let path = self.response_path.trim().to_owned();
        let result = fs::read_to_string(&path)
            .map_err(MonitorError::from)
            .and_then(|text| UploadResponse::from_json(&text));
        self.finish_import(result);
    }

    fn finish_import(&mut self, result: Result<UploadResponse, MonitorError>) {
        match result {
            Ok(response) => {
                let summary = self.session.load_recording(&response);
                info!("imported recording {} ({})", response.session_id, response.status);
                self.log(&format!(
                    "Imported {} heart-rate samples, {} markers",
                    self.session.heart_rate().len(),
                    summary.markers
                ));
                if let Some(message) = &response.message {
                    self.log(message);
                }
                self.transition(RecordingAction::Import);
            }
            Err(e) => {
                warn!("import rejected: {}", e);
                self.log(&format!("Import failed: {}", e));
            }
        }
    }

    fn handle_messages(&mut self) {
        for _ in 0..MAX_MESSAGES_PER_FRAME {
            let Ok(msg) = self.rx.try_recv() else { break };
            match msg {
                FeedMessage::Log(s) => self.log(&s),
                FeedMessage::Connected(b) => self.connected = b,
                FeedMessage::Update(message) => {
                    // 停止后不再合并
                    if self.machine.state() == RecordingState::Recording {
                        let summary = self.session.apply_update(&message);
                        self.latest_hr = summary.heart_rate.or(self.latest_hr);
                        self.latest_uc = summary.uterine.or(self.latest_uc);
                    }
                }
                FeedMessage::Error(e) => {
                    self.log(&format!("Feed error: {}", e));
                    if self.machine.state() == RecordingState::Recording {
                        self.transition(RecordingAction::Stop);
                    }
                }
                FeedMessage::Finished => {
                    self.log("Feed finished.");
                    if self.machine.state() == RecordingState::Recording {
                        self.transition(RecordingAction::Stop);
                    }
                }
            }
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        let idle = self.machine.state() == RecordingState::Idle;
        ui.add_enabled_ui(idle, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.source_choice, SourceChoice::Emulator, "EMULATOR");
                ui.selectable_value(&mut self.source_choice, SourceChoice::Replay, "REPLAY");
            });
            if self.source_choice == SourceChoice::Replay {
                ui.label("Stream file (.jsonl)");
                ui.text_edit_singleline(&mut self.replay_path);
            }
        });

        ui.add_space(6.0);
        ui.label("Session label");
        ui.text_edit_singleline(&mut self.session_label);
        ui.add_space(6.0);

        let (text, fill) = match self.ui_state.primary {
            PrimaryButton::Play => ("▶ START", Color32::from_rgb(0, 120, 130)),
            PrimaryButton::Stop => ("⏹ STOP", Color32::RED),
            PrimaryButton::Save => ("💾 SAVE", Color32::from_rgb(0, 110, 60)),
            PrimaryButton::Saved => ("✔ SAVED", Color32::DARK_GRAY),
        };
        let enabled = self.ui_state.primary != PrimaryButton::Saved;
        let button = egui::Button::new(RichText::new(text).color(Color32::WHITE)).fill(fill);
        if ui.add_enabled(enabled, button).clicked() {
            match self.ui_state.primary {
                PrimaryButton::Play => self.start_feed(),
                PrimaryButton::Stop => self.stop_feed(),
                PrimaryButton::Save => self.save_session(),
                PrimaryButton::Saved => {}
            }
        }

        if self.ui_state.reset_visible {
            if self.ui_state.primary == PrimaryButton::Save {
                ui.checkbox(&mut self.confirm_reset, "Discard unsaved data");
            }
            if ui.button("🔄 RESET").clicked() {
                self.reset_session();
            }
        }

        ui.add_space(12.0);
        ui.separator();
        ui.label("IMPORT RECORDING");
        ui.add_enabled_ui(self.ui_state.import_enabled, |ui| {
            ui.label("Heart rate (.csv)");
            ui.text_edit_singleline(&mut self.bpm_path);
            ui.label("Uterine activity (.csv)");
            ui.text_edit_singleline(&mut self.uc_path);
            if ui.button("Import CSV pair").clicked() {
                self.import_csv_pair();
            }
            ui.add_space(4.0);
            ui.label("Analysis result (.json)");
            ui.text_edit_singleline(&mut self.response_path);
            if ui.button("Import result").clicked() {
                self.import_response();
            }
        });
    }

    fn metrics_panel(&self, ui: &mut egui::Ui) {
        let metrics = self.session.metrics();
        if let Some(score) = metrics.prediction {
            let badge = prediction_badge(score);
            let mut color = status_color(Some(badge.status));
            if badge.pulse {
                let t = ui.input(|i| i.time);
                color = color.gamma_multiply((0.65 + 0.35 * (t * 4.0).sin()) as f32);
                ui.ctx().request_repaint();
            }
            let text = format!("{}  ({:.2})", badge.text, score);
            ui.label(RichText::new(text).strong().color(color));
        }
        egui::Grid::new("metrics").striped(true).show(ui, |ui| {
            for (name, value, status) in metrics.rows() {
                ui.label(name);
                ui.label(RichText::new(value).color(status_color(status)));
                ui.end_row();
            }
        });
    }

    fn charts(&self, ui: &mut egui::Ui) {
        let snapshot = self.session.snapshot();
        let markers = &snapshot.markers;
        let height = (ui.available_height() / 2.0 - 8.0).max(120.0);
        // 录制中视图跟随数据；停止后允许自由缩放
        let following = self.machine.state() == RecordingState::Recording;
        let time_range = snapshot.time_range;
        let hr_bounds = follow_bounds(time_range, &self.config.hr_axis, self.latest_hr);
        let uc_bounds = follow_bounds(time_range, &self.config.uc_axis, self.latest_uc);
        let trace_color = Color32::from_rgb(0, 150, 166);

        Plot::new("hr_plot")
            .height(height)
            .link_axis("ctg", true, false)
            .include_y(self.config.hr_axis.min)
            .include_y(self.config.hr_axis.max)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                if let (true, Some((min, max))) = (following, hr_bounds) {
                    plot_ui.set_plot_bounds(PlotBounds::from_min_max(min, max));
                }
                let trace = PlotPoints::new(snapshot.heart_rate.clone());
                plot_ui.line(Line::new(trace).name("FHR (bpm)").color(trace_color));
                plot_ui.points(
                    Points::new(marker_points(markers, EventKind::Acceleration))
                        .name(EventKind::Acceleration.label())
                        .shape(MarkerShape::Up)
                        .filled(true)
                        .radius(5.0)
                        .color(status_color(Some(Status::Normal))),
                );
                plot_ui.points(
                    Points::new(marker_points(markers, EventKind::Deceleration))
                        .name(EventKind::Deceleration.label())
                        .shape(MarkerShape::Down)
                        .filled(true)
                        .radius(5.0)
                        .color(status_color(Some(Status::Critical))),
                );
            });

        Plot::new("uc_plot")
            .height(height)
            .link_axis("ctg", true, false)
            .include_y(self.config.uc_axis.min)
            .include_y(self.config.uc_axis.max)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                if let (true, Some((min, max))) = (following, uc_bounds) {
                    plot_ui.set_plot_bounds(PlotBounds::from_min_max(min, max));
                }
                let trace = PlotPoints::new(snapshot.uterine.clone());
                plot_ui.line(Line::new(trace).name("UC (%)").color(trace_color));
                plot_ui.points(
                    Points::new(marker_points(markers, EventKind::Contraction))
                        .name(EventKind::Contraction.label())
                        .shape(MarkerShape::Up)
                        .filled(true)
                        .radius(5.0)
                        .color(status_color(Some(Status::Caution))),
                );
            });
    }
}

impl Drop for CtgMonitorApp {
    fn drop(&mut self) {
        self.tx_cmd.send(GuiCommand::Shutdown).ok();
    }
}

impl eframe::App for CtgMonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 1. 消息处理
        self.handle_messages();
        if self.connected {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        // 2. UI 绘制
        egui::SidePanel::left("controls").min_width(280.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("CTG Monitor");
            let status = if self.connected { "● feed connected" } else { "○ no feed" };
            ui.label(RichText::new(status).small());
            ui.separator();

            self.controls(ui);

            ui.add_space(10.0);
            ui.separator();
            egui::ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
                for m in &self.log_messages {
                    ui.monospace(m);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(self.ui_state.content_enabled, |ui| {
                self.metrics_panel(ui);
                ui.separator();
                self.charts(ui);
            });
        });
    }
}

fn status_color(status: Option<Status>) -> Color32 {
    match status {
        Some(Status::Normal) => Color32::from_rgb(76, 175, 80),
        Some(Status::Caution) => Color32::from_rgb(255, 152, 0),
        Some(Status::Critical) => Color32::from_rgb(244, 67, 54),
        None => Color32::GRAY,
    }
}

/// Chart bounds as `(min, max)` corners: the shared time span on x, the preset
/// axis widened by the latest batch on y.
fn follow_bounds(
    time_range: Option<(f64, f64)>,
    axis: &AxisBounds,
    latest: Option<ValueRange>,
) -> Option<([f64; 2], [f64; 2])> {
    let (start, end) = time_range?;
    let end = if end > start { end } else { start + 1.0 };
    let (low, high) = match latest {
        Some(range) => (axis.min.min(range.min), axis.max.max(range.max)),
        None => (axis.min, axis.max),
    };
    Some(([start, low], [end, high]))
}

fn non_empty_path(text: &str) -> Option<&Path> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| Path::new(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{SeriesBatch, StreamMessage};

    #[test]
    fn blank_fields_count_as_missing_files() {
        assert_eq!(non_empty_path("   "), None);
        assert_eq!(non_empty_path(" a.csv "), Some(Path::new("a.csv")));
        let err = validate_pair(non_empty_path(""), non_empty_path("uc.csv")).unwrap_err();
        assert!(matches!(err, MonitorError::MissingFile(_)));
    }

    fn update(times: &[f64], bpm: f64) -> FeedMessage {
        let mut msg = StreamMessage::default();
        let n = times.len();
        msg.records.filtered_bpm_batch = SeriesBatch::new(times.to_vec(), vec![bpm; n]);
        msg.records.filtered_uterus_batch = SeriesBatch::new(times.to_vec(), vec![20.0; n]);
        FeedMessage::Update(msg)
    }

    #[test]
    fn updates_after_stop_are_not_merged() {
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        let config = MonitorConfig::default();
        let mut app = CtgMonitorApp::with_channels(config, rx, tx_cmd).unwrap();
        app.start_feed();
        assert!(matches!(rx_cmd.try_recv(), Ok(GuiCommand::StartFeed(FeedMode::Emulator))));

        tx.send(update(&[0.0, 1.0], 140.0)).unwrap();
        app.handle_messages();
        assert_eq!(app.session.heart_rate().len(), 2);

        app.stop_feed();
        assert!(matches!(rx_cmd.try_recv(), Ok(GuiCommand::StopFeed)));
        assert_eq!(app.machine.state(), RecordingState::Stopped { saved: false });
        tx.send(update(&[2.0, 3.0], 150.0)).unwrap();
        app.handle_messages();
        assert_eq!(app.session.heart_rate().len(), 2);
        assert_eq!(app.session.heart_rate_history().len(), 2);
        assert_eq!(app.session.heart_rate().last().unwrap().value, 140.0);
    }

    #[test]
    fn feed_error_stops_recording() {
        let (tx, rx) = channel();
        let (tx_cmd, _rx_cmd) = channel();
        let config = MonitorConfig::default();
        let mut app = CtgMonitorApp::with_channels(config, rx, tx_cmd).unwrap();
        app.start_feed();
        tx.send(FeedMessage::Error("socket closed".to_owned())).unwrap();
        tx.send(update(&[0.0], 140.0)).unwrap();
        app.handle_messages();
        assert_eq!(app.ui_state.primary, PrimaryButton::Save);
        assert!(app.session.is_empty());
    }

    #[test]
    fn live_bounds_follow_time_span_and_latest_batch() {
        let (tx, rx) = channel();
        let (tx_cmd, _rx_cmd) = channel();
        let config = MonitorConfig::default();
        let mut app = CtgMonitorApp::with_channels(config, rx, tx_cmd).unwrap();
        app.start_feed();
        tx.send(update(&[10.0, 11.0, 12.0], 215.0)).unwrap();
        app.handle_messages();
        let span = app.session.time_range();
        let hr = follow_bounds(span, &app.config.hr_axis, app.latest_hr);
        assert_eq!(hr, Some(([10.0, 50.0], [12.0, 215.0])));
        let uc = follow_bounds(span, &app.config.uc_axis, app.latest_uc);
        assert_eq!(uc, Some(([10.0, 0.0], [12.0, 100.0])));
    }

    #[test]
    fn single_instant_still_gets_a_time_span() {
        let axis = AxisBounds {
            min: 0.0,
            max: 100.0,
        };
        assert_eq!(follow_bounds(None, &axis, None), None);
        assert_eq!(
            follow_bounds(Some((5.0, 5.0)), &axis, None),
            Some(([5.0, 0.0], [6.0, 100.0]))
        );
    }

    #[test]
    fn imported_recording_enables_saving() {
        let mut app = CtgMonitorApp::new(MonitorConfig::default()).unwrap();
        let mut response = UploadResponse::default();
        response.records.filtered_bpm_batch.time_sec = vec![0.0, 1.0];
        response.records.filtered_bpm_batch.value = vec![140.0, 141.0];
        app.finish_import(Ok(response));
        assert_eq!(app.ui_state.primary, PrimaryButton::Save);
        assert_eq!(app.session.heart_rate().len(), 2);
        // Reset needs confirmation while unsaved.
        app.reset_session();
        assert_eq!(app.session.heart_rate().len(), 2);
        app.confirm_reset = true;
        app.reset_session();
        assert!(app.session.is_empty());
        assert_eq!(app.ui_state.primary, PrimaryButton::Play);
    }
}
