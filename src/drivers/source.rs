use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use crate::drivers::payload::StreamMessage;
use crate::drivers::MonitorError;
/// Something that yields live messages on demand, in delivery order.
pub trait BatchSource {
    fn next_batch(&mut self) -> Result<Option<StreamMessage>, MonitorError>;
}
/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<StreamMessage>,
}
impl ManualSource {
    pub fn new(batches: impl IntoIterator<Item = StreamMessage>) -> Self {
        Self {
            queue: batches.into_iter().collect(),
        }
    }
}
impl BatchSource for ManualSource {
    fn next_batch(&mut self) -> Result<Option<StreamMessage>, MonitorError> {
        Ok(self.queue.pop_front())
    }
}
/// Replays a captured live stream: one JSON message per line.
pub struct JsonlReplaySource<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
}
impl JsonlReplaySource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MonitorError> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}
impl<R: BufRead> JsonlReplaySource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}
impl<R: BufRead> BatchSource for JsonlReplaySource<R> {
    fn next_batch(&mut self) -> Result<Option<StreamMessage>, MonitorError> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return StreamMessage::from_json(trimmed)
                .map(Some)
                .map_err(|e| MonitorError::PayloadLine {
                    line: self.line_no,
                    message: e.to_string(),
                });
        }
        Ok(None)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    #[test]
    fn manual_source_drains_in_order() {
        let mut a = StreamMessage::default();
        a.prediction = Some(0.1);
        let mut b = StreamMessage::default();
        b.prediction = Some(0.2);
        let mut source = ManualSource::new(vec![a, b]);
        assert_eq!(source.next_batch().unwrap().unwrap().prediction, Some(0.1));
        assert_eq!(source.next_batch().unwrap().unwrap().prediction, Some(0.2));
        assert!(source.next_batch().unwrap().is_none());
    }
    #[test]
    fn jsonl_skips_blank_lines() {
        let text = "\n{\"prediction\": 0.3}\n   \n{\"records\": {\"stv\": 4.2}}\n";
        let mut source = JsonlReplaySource::from_reader(Cursor::new(text));
        assert_eq!(source.next_batch().unwrap().unwrap().prediction, Some(0.3));
        assert_eq!(source.next_batch().unwrap().unwrap().records.stv, Some(4.2));
        assert!(source.next_batch().unwrap().is_none());
    }
    #[test]
    fn jsonl_reports_line_of_malformed_message() {
        let text = "{\"prediction\": 0.3}\n\n{not json}\n";
        let mut source = JsonlReplaySource::from_reader(Cursor::new(text));
        source.next_batch().unwrap();
        match source.next_batch() {
            Err(MonitorError::PayloadLine { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected {other:?}"),
        }
    }
}
