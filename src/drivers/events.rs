use log::warn;
use serde::Serialize;
use crate::drivers::buffer::ChannelBuffer;
use crate::drivers::payload::EventIndex;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Acceleration,
    Deceleration,
    Contraction,
}
impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Acceleration => "Acceleration",
            EventKind::Deceleration => "Deceleration",
            EventKind::Contraction => "Contraction",
        }
    }
}
/// Event resolved to concrete chart coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EventMarker {
    pub time: f64,
    pub value: f64,
    pub kind: EventKind,
}
/// Resolve backend start indices against the buffer as it is right now.
///
/// Indices past the end of the buffer are skipped (the backend may refer to
/// samples that were already windowed out).
pub fn resolve_markers(
    buffer: &ChannelBuffer,
    events: &[EventIndex],
    kind: EventKind,
) -> Vec<EventMarker> {
    let mut markers = Vec::with_capacity(events.len());
    for event in events {
        match buffer.get(event.start) {
            Some(sample) => markers.push(EventMarker {
                time: sample.time,
                value: sample.value,
                kind,
            }),
            None => warn!(
                "skipping {} at index {} (buffer holds {})",
                kind.label(),
                event.start,
                buffer.len()
            ),
        }
    }
    markers
}
/// Markers of one kind as `[x, y]` points.
pub fn marker_points(markers: &[EventMarker], kind: EventKind) -> Vec<[f64; 2]> {
    markers
        .iter()
        .filter(|m| m.kind == kind)
        .map(|m| [m.time, m.value])
        .collect()
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::buffer::Sample;
    #[test]
    fn resolves_indices_and_skips_out_of_range() {
        let mut buffer = ChannelBuffer::unbounded();
        buffer.merge(&[Sample::new(0.0, 140.0), Sample::new(1.0, 160.0)]);
        let markers = resolve_markers(
            &buffer,
            &[EventIndex::at(1), EventIndex::at(7)],
            EventKind::Acceleration,
        );
        assert_eq!(
            markers,
            vec![EventMarker {
                time: 1.0,
                value: 160.0,
                kind: EventKind::Acceleration
            }]
        );
    }
    #[test]
    fn marker_points_filter_by_kind() {
        let markers = vec![
            EventMarker {
                time: 1.0,
                value: 2.0,
                kind: EventKind::Acceleration,
            },
            EventMarker {
                time: 3.0,
                value: 4.0,
                kind: EventKind::Deceleration,
            },
        ];
        assert_eq!(marker_points(&markers, EventKind::Deceleration), vec![[3.0, 4.0]]);
        assert!(marker_points(&markers, EventKind::Contraction).is_empty());
    }
}
