use crate::drivers::error::MonitorError;
use crate::drivers::session::{MonitorSession, SessionLayout, UpdateSummary};
use crate::drivers::source::BatchSource;
/// High level pipeline that pulls messages from a source into a session.
pub struct MonitorPipeline<S: BatchSource> {
    source: S,
    session: MonitorSession,
}
impl<S: BatchSource> MonitorPipeline<S> {
    pub fn new(source: S, layout: SessionLayout) -> Result<Self, MonitorError> {
        Ok(Self {
            source,
            session: MonitorSession::new(layout)?,
        })
    }
    pub fn pump_once(&mut self) -> Result<Option<UpdateSummary>, MonitorError> {
        let Some(message) = self.source.next_batch()? else {
            return Ok(None);
        };
        Ok(Some(self.session.apply_update(&message)))
    }
    /// Pump until the source is exhausted; returns how many messages merged.
    pub fn drain(&mut self) -> Result<usize, MonitorError> {
        let mut count = 0;
        while self.pump_once()?.is_some() {
            count += 1;
        }
        Ok(count)
    }
    pub fn session(&self) -> &MonitorSession {
        &self.session
    }
    pub fn into_session(self) -> MonitorSession {
        self.session
    }
}
