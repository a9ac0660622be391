// src/engine.rs
use crate::config::MonitorConfig;
use crate::drivers::{BatchSource, JsonlReplaySource, MonitorError};
use crate::emulator::Emulator;
use crate::types::*;
use log::{info, warn};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const IDLE_SLEEP: Duration = Duration::from_millis(50);

pub fn spawn_thread(
    tx: Sender<FeedMessage>,
    rx_cmd: Receiver<GuiCommand>,
    config: MonitorConfig,
) -> JoinHandle<()> {
    thread::spawn(move || {
        tx.send(FeedMessage::Log("Feed engine ready.".to_owned())).ok();
        let tick = Duration::from_millis(config.emulator.tick_ms);
        let mut source: Option<Box<dyn BatchSource>> = None;

        loop {
            // 1. 处理 GUI 发来的命令
            for _ in 0..10 {
                match rx_cmd.try_recv() {
                    Ok(GuiCommand::StartFeed(mode)) => match open_source(&mode, &config) {
                        Ok(opened) => {
                            info!("feed started: {:?}", mode);
                            source = Some(opened);
                            tx.send(FeedMessage::Connected(true)).ok();
                            tx.send(FeedMessage::Log(describe(&mode))).ok();
                        }
                        Err(e) => {
                            warn!("could not open feed {:?}: {}", mode, e);
                            tx.send(FeedMessage::Error(e.to_string())).ok();
                        }
                    },
                    Ok(GuiCommand::StopFeed) => {
                        if source.take().is_some() {
                            info!("feed stopped");
                            tx.send(FeedMessage::Connected(false)).ok();
                            tx.send(FeedMessage::Log("Feed stopped".to_owned())).ok();
                        }
                    }
                    Ok(GuiCommand::Shutdown) | Err(TryRecvError::Disconnected) => {
                        info!("feed engine shutting down");
                        return;
                    }
                    Err(TryRecvError::Empty) => break,
                }
            }

            // 2. 拉取下一批数据
            let Some(step) = source.as_mut().map(|s| s.next_batch()) else {
                thread::sleep(IDLE_SLEEP);
                continue;
            };
            match step {
                Ok(Some(message)) => {
                    if tx.send(FeedMessage::Update(message)).is_err() {
                        return;
                    }
                }
                Ok(None) => {
                    info!("feed exhausted");
                    source = None;
                    tx.send(FeedMessage::Finished).ok();
                    tx.send(FeedMessage::Connected(false)).ok();
                }
                Err(e) => {
                    warn!("feed failed: {}", e);
                    source = None;
                    tx.send(FeedMessage::Error(e.to_string())).ok();
                    tx.send(FeedMessage::Connected(false)).ok();
                }
            }
            thread::sleep(tick);
        }
    })
}

fn open_source(
    mode: &FeedMode,
    config: &MonitorConfig,
) -> Result<Box<dyn BatchSource>, MonitorError> {
    Ok(match mode {
        FeedMode::Emulator => Box::new(Emulator::new(
            config.emulator.clone(),
            mode.layout(config).live_window,
        )),
        FeedMode::Replay(path) if path.as_os_str().is_empty() => {
            return Err(MonitorError::Feed("no stream file selected".to_owned()))
        }
        FeedMode::Replay(path) => Box::new(JsonlReplaySource::open(path)?),
    })
}

fn describe(mode: &FeedMode) -> String {
    match mode {
        FeedMode::Emulator => "Emulator connected".to_owned(),
        FeedMode::Replay(path) => format!("Replaying {}", path.display()),
    }
}
