// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
use anyhow::{anyhow, Context};
use ctg_monitor::config::MonitorConfig;
use ctg_monitor::gui::CtgMonitorApp;
use eframe::egui;

// 入口函数
fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config =
        MonitorConfig::from_args(std::env::args()).context("Failed to load configuration")?;
    log::info!("output dir: {}", config.output_dir.display());
    let app = CtgMonitorApp::new(config)?;

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1280.0, 820.0])
        .with_min_inner_size([960.0, 640.0])
        .with_title("CTG Monitor");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native("CTG Monitor", options, Box::new(move |_cc| Box::new(app)))
        .map_err(|e| anyhow!("UI exited with error: {e}"))
}
