// src/drivers/mod.rs
// 数据层：缓冲区合并、后端数据结构、会话与录制状态
pub mod buffer;
pub mod error;
pub mod events;
pub mod metrics;
pub mod payload;
pub mod pipeline;
pub mod plot;
pub mod recording;
pub mod session;
pub mod source;
pub mod upload;
// 公开导出常用类型，方便外部调用
pub use buffer::{ChannelBuffer, Sample, ValueRange};
pub use error::MonitorError;
pub use events::{resolve_markers, EventKind, EventMarker};
pub use metrics::{prediction_badge, Badge, Status, SummaryMetrics};
pub use payload::{EventIndex, Records, SeriesBatch, StreamMessage, UploadResponse};
pub use pipeline::MonitorPipeline;
pub use plot::{render_session_png, PlotStyle};
pub use recording::{PrimaryButton, RecordingAction, RecordingMachine, RecordingState, UiState};
pub use session::{MonitorSession, SessionLayout, SessionSnapshot, UpdateSummary};
pub use source::{BatchSource, JsonlReplaySource, ManualSource};
pub use upload::{load_csv_pair, read_channel_csv, validate_pair, UploadPair};
