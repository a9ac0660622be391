use std::path::PathBuf;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("malformed payload: {0}")]
    Payload(String),
    #[error("malformed payload on line {line}: {message}")]
    PayloadLine { line: usize, message: String },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad csv row {line} in {}: {message}", .path.display())]
    Csv {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("{0} file is missing; select both files")]
    MissingFile(&'static str),
    #[error("{} is not a .csv file", .0.display())]
    NotCsv(PathBuf),
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
    #[error("the current recording is not saved; confirm the reset to discard it")]
    NeedsConfirmation,
    #[error("window size must be greater than zero")]
    InvalidWindow,
    #[error("failed to render plot: {0}")]
    Plot(String),
    #[error("feed error: {0}")]
    Feed(String),
}
impl From<serde_json::Error> for MonitorError {
    fn from(value: serde_json::Error) -> Self {
        MonitorError::Payload(value.to_string())
    }
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for MonitorError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        MonitorError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for MonitorError {
    fn from(value: image::ImageError) -> Self {
        MonitorError::Plot(value.to_string())
    }
}
