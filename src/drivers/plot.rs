use std::io::Cursor;
use std::ops::Range;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::coord::Shift;
use plotters::prelude::*;
use crate::drivers::buffer::ChannelBuffer;
use crate::drivers::error::MonitorError;
use crate::drivers::events::{marker_points, EventKind};
use crate::drivers::session::MonitorSession;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub trace: RGBColor,
    pub acceleration: RGBColor,
    pub deceleration: RGBColor,
    pub contraction: RGBColor,
    /// Heart-rate axis used unless the data leaves it.
    pub hr_axis: Range<f64>,
    pub uc_axis: Range<f64>,
    /// Captions and tick labels need a system font.
    pub labels: bool,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            background: RGBColor(255, 255, 255),
            trace: RGBColor(0, 150, 166),
            acceleration: RGBColor(76, 175, 80),
            deceleration: RGBColor(244, 67, 54),
            contraction: RGBColor(255, 152, 0),
            hr_axis: 50.0..200.0,
            uc_axis: 0.0..100.0,
            labels: true,
        }
    }
}
/// Render both channels of a session, stacked, with event markers.
pub fn render_session_png(
    session: &MonitorSession,
    style: PlotStyle,
) -> Result<Vec<u8>, MonitorError> {
    if session.is_empty() {
        return Err(MonitorError::Plot("session has no samples".into()));
    }
    let x_range = match session.time_range() {
        Some((start, end)) if end > start => start..end,
        Some((start, _)) => start..start + 1.0,
        None => 0.0..1.0,
    };
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let areas = root.split_evenly((2, 1));
        let markers = session.markers();
        draw_channel(
            &areas[0],
            &style,
            "Fetal heart rate, bpm",
            session.heart_rate(),
            x_range.clone(),
            style.hr_axis.clone(),
            &[
                (marker_points(markers, EventKind::Acceleration), style.acceleration),
                (marker_points(markers, EventKind::Deceleration), style.deceleration),
            ],
        )?;
        draw_channel(
            &areas[1],
            &style,
            "Uterine activity, %",
            session.uterine(),
            x_range,
            style.uc_axis.clone(),
            &[(marker_points(markers, EventKind::Contraction), style.contraction)],
        )?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn draw_channel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    style: &PlotStyle,
    caption: &str,
    channel: &ChannelBuffer,
    x_range: Range<f64>,
    axis: Range<f64>,
    markers: &[(Vec<[f64; 2]>, RGBColor)],
) -> Result<(), MonitorError>
where
    DB::ErrorType: 'static,
{
    // Widen the preset axis if the data leaves it.
    let y_range = match channel.value_range() {
        Some(r) => axis.start.min(r.min)..axis.end.max(r.max),
        None => axis,
    };
    let mut builder = ChartBuilder::on(area);
    builder.margin(10);
    if style.labels {
        builder
            .caption(caption, ("sans-serif", 18).into_font())
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 30);
    }
    let mut chart = builder.build_cartesian_2d(x_range, y_range)?;
    if style.labels {
        chart
            .configure_mesh()
            .light_line_style(&BLACK.mix(0.05))
            .draw()?;
    }
    let trace = channel.iter().map(|s| (s.time, s.value));
    chart.draw_series(LineSeries::new(trace, style.trace.stroke_width(2)))?;
    for (points, color) in markers {
        chart.draw_series(
            points
                .iter()
                .map(|p| TriangleMarker::new((p[0], p[1]), 6, color.filled())),
        )?;
    }
    Ok(())
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, MonitorError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| MonitorError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::session::SessionLayout;
    #[test]
    fn empty_session_is_rejected() {
        let session = MonitorSession::new(SessionLayout::default()).unwrap();
        assert!(matches!(
            render_session_png(&session, PlotStyle::default()),
            Err(MonitorError::Plot(_))
        ));
    }
}
