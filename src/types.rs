// src/types.rs
use std::path::PathBuf;
use crate::config::MonitorConfig;
use crate::drivers::{SessionLayout, StreamMessage};

// 数据来源
#[derive(PartialEq, Clone, Debug)]
pub enum FeedMode {
    Emulator,
    // 回放之前录下的 JSONL 消息流
    Replay(PathBuf),
}

impl FeedMode {
    pub fn layout(&self, config: &MonitorConfig) -> SessionLayout {
        match self {
            FeedMode::Emulator => config.live_layout(),
            FeedMode::Replay(_) => config.replay_layout(),
        }
    }
}

// GUI 发给后台的命令
#[derive(Clone, Debug)]
pub enum GuiCommand {
    StartFeed(FeedMode),
    StopFeed,
    Shutdown,
}

// 后台发给 GUI 的消息
#[derive(Clone, Debug)]
pub enum FeedMessage {
    Log(String),
    Connected(bool),  // 数据源状态
    Update(StreamMessage),
    // 数据源出错，只报告一次，不自动重连
    Error(String),
    Finished,
}
