use crate::chart::{Chart, HistogramChart, LineChart, PanelGrid, ScatterChart};
use chrono::{Datelike, NaiveDate};
use configuration::RenderConfig;

const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 36.0;
const MARGIN_BOTTOM: f64 = 48.0;
const TICKS: usize = 5;
const PALETTE: [&str; 4] = ["#348dc1", "#ff9933", "#5aa469", "#8c564b"];
const GUIDE_COLOR: &str = "#d62728";
const GRID_COLOR: &str = "#e5e5e5";

/// The pixel rectangle a single chart is drawn into.
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn left(&self) -> f64 {
        self.x + MARGIN_LEFT
    }

    fn right(&self) -> f64 {
        self.x + self.width - MARGIN_RIGHT
    }

    fn top(&self) -> f64 {
        self.y + MARGIN_TOP
    }

    fn bottom(&self) -> f64 {
        self.y + self.height - MARGIN_BOTTOM
    }

    fn project_x(&self, value: f64, (lo, hi): (f64, f64)) -> f64 {
        self.left() + (value - lo) / (hi - lo) * (self.right() - self.left())
    }

    fn project_y(&self, value: f64, (lo, hi): (f64, f64)) -> f64 {
        self.bottom() - (value - lo) / (hi - lo) * (self.bottom() - self.top())
    }
}

/// Turns chart descriptions into standalone SVG documents.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    config: RenderConfig,
}

impl SvgRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, chart: &Chart) -> String {
        let width = self.config.width as f64;
        let height = self.config.height as f64;

        let mut svg = format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><style>text{{font-family:Arial,sans-serif;font-size:12px;fill:#444}}</style><rect width="100%" height="100%" fill="#ffffff" />"##,
            w = self.config.width,
            h = self.config.height
        );
        draw(
            &mut svg,
            chart,
            Frame {
                x: 0.0,
                y: 0.0,
                width,
                height,
            },
        );
        svg.push_str("</svg>\n");
        svg
    }
}

fn draw(svg: &mut String, chart: &Chart, frame: Frame) {
    match chart {
        Chart::Line(line) => draw_line(svg, line, frame),
        Chart::Histogram(histogram) => draw_histogram(svg, histogram, frame),
        Chart::Scatter(scatter) => draw_scatter(svg, scatter, frame),
        Chart::Panels(grid) => draw_panels(svg, grid, frame),
    }
}

fn draw_panels(svg: &mut String, grid: &PanelGrid, frame: Frame) {
    let columns = grid.columns.max(1);
    let rows = grid.rows.max(1);
    let cell_width = frame.width / columns as f64;
    let cell_height = frame.height / rows as f64;

    for (index, panel) in grid.panels.iter().enumerate().take(rows * columns) {
        let cell = Frame {
            x: frame.x + (index % columns) as f64 * cell_width,
            y: frame.y + (index / columns) as f64 * cell_height,
            width: cell_width,
            height: cell_height,
        };
        draw(svg, panel, cell);
    }
}

fn draw_line(svg: &mut String, chart: &LineChart, frame: Frame) {
    let x_extent = extent(
        chart
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|(d, _)| day_number(*d))),
        false,
    );
    let y_extent = extent(
        chart
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|(_, v)| *v)),
        chart.zero_line,
    );

    draw_title(svg, &chart.title, frame);
    let (Some(xs), Some(ys)) = (x_extent, y_extent) else {
        draw_empty_notice(svg, frame);
        return;
    };

    draw_axes(svg, frame, xs, ys, &format_date_tick, &format_value_tick);
    draw_axis_labels(svg, frame, "", &chart.y_label);

    if chart.zero_line {
        draw_horizontal_guide(svg, frame, frame.project_y(0.0, ys));
    }

    for (index, series) in chart.series.iter().enumerate() {
        let points = series
            .points
            .iter()
            .filter(|(_, v)| v.is_finite())
            .map(|(d, v)| (frame.project_x(day_number(*d), xs), frame.project_y(*v, ys)));
        draw_polyline(svg, points, color(index));
    }

    draw_legend(svg, frame, chart.series.iter().map(|s| s.label.as_str()));
}

fn draw_scatter(svg: &mut String, chart: &ScatterChart, frame: Frame) {
    let finite: Vec<(f64, f64)> = chart
        .points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();

    draw_title(svg, &chart.title, frame);
    let (Some(xs), Some(ys)) = (
        extent(finite.iter().map(|(x, _)| *x), false),
        extent(finite.iter().map(|(_, y)| *y), false),
    ) else {
        draw_empty_notice(svg, frame);
        return;
    };

    draw_axes(svg, frame, xs, ys, &format_value_tick, &format_value_tick);
    draw_axis_labels(svg, frame, &chart.x_label, &chart.y_label);

    for (x, y) in finite {
        svg.push_str(&format!(
            r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="3" fill="{color}" fill-opacity="0.6" />"#,
            cx = frame.project_x(x, xs),
            cy = frame.project_y(y, ys),
            color = color(0)
        ));
    }
}

fn draw_histogram(svg: &mut String, chart: &HistogramChart, frame: Frame) {
    let bins = chart.bins.max(1);
    let data = extent(
        chart.series.iter().flat_map(|s| s.values.iter().copied()),
        false,
    );

    draw_title(svg, &chart.title, frame);
    let Some(data) = data else {
        draw_empty_notice(svg, frame);
        return;
    };
    // Bins always span every value; `x_range` only narrows what is shown.
    let xs = chart.x_range.unwrap_or(data);

    let heights: Vec<Vec<f64>> = chart
        .series
        .iter()
        .map(|s| bin_heights(&s.values, bins, data, chart.density, chart.cumulative))
        .collect();
    let Some(ys) = extent(heights.iter().flatten().copied(), true) else {
        draw_empty_notice(svg, frame);
        return;
    };
    let ys = (0.0, ys.1);

    draw_axes(svg, frame, xs, ys, &format_value_tick, &format_value_tick);
    draw_axis_labels(svg, frame, &chart.x_label, &chart.y_label);

    let bin_width = (data.1 - data.0) / bins as f64;
    let clip = |value: f64| frame.project_x(value.clamp(xs.0, xs.1), xs);
    for (index, series) in heights.iter().enumerate() {
        if chart.cumulative {
            // Step outline: flat across each bin, rising at its right edge.
            let mut points = vec![(clip(data.0), frame.project_y(0.0, ys))];
            for (bin, height) in series.iter().enumerate() {
                let lo = data.0 + bin as f64 * bin_width;
                let y = frame.project_y(*height, ys);
                points.push((clip(lo), y));
                points.push((clip(lo + bin_width), y));
            }
            draw_polyline(svg, points.into_iter(), color(index));
        } else {
            for (bin, height) in series.iter().enumerate() {
                let lo = data.0 + bin as f64 * bin_width;
                let (left, right) = (clip(lo), clip(lo + bin_width));
                if *height <= 0.0 || right - left < 0.01 {
                    continue;
                }
                let y = frame.project_y(*height, ys);
                svg.push_str(&format!(
                    r#"<rect x="{left:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{color}" fill-opacity="0.5" />"#,
                    w = right - left,
                    h = frame.bottom() - y,
                    color = color(index)
                ));
            }
        }
    }

    if chart.zero_marker && xs.0 <= 0.0 && 0.0 <= xs.1 {
        let x = frame.project_x(0.0, xs);
        svg.push_str(&format!(
            r#"<line x1="{x:.2}" y1="{y1:.2}" x2="{x:.2}" y2="{y2:.2}" stroke="{GUIDE_COLOR}" stroke-width="1.5" stroke-dasharray="6 4" />"#,
            y1 = frame.top(),
            y2 = frame.bottom()
        ));
    }

    draw_legend(svg, frame, chart.series.iter().map(|s| s.label.as_str()));
}

/// Counts `values` into `bins` equal-width bins spanning `range`.
///
/// Values outside the range (or non-finite) are not counted. The right edge
/// belongs to the last bin.
pub fn histogram_counts(values: &[f64], bins: usize, (lo, hi): (f64, f64)) -> Vec<usize> {
    let mut counts = vec![0; bins];
    if bins == 0 || !(hi > lo) {
        return counts;
    }

    let width = (hi - lo) / bins as f64;
    for &value in values {
        if !value.is_finite() || value < lo || value > hi {
            continue;
        }
        let index = (((value - lo) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }
    counts
}

/// Bar heights for one series.
///
/// With `density` the bars integrate to one over the counted values; with
/// `cumulative` each height also includes every bin to its left, so a
/// cumulative density ends at one.
fn bin_heights(
    values: &[f64],
    bins: usize,
    range: (f64, f64),
    density: bool,
    cumulative: bool,
) -> Vec<f64> {
    let counts = histogram_counts(values, bins, range);
    let total: usize = counts.iter().sum();
    let bin_width = (range.1 - range.0) / bins as f64;

    let mut running = 0.0;
    counts
        .into_iter()
        .map(|count| {
            let count = count as f64;
            match (density && total > 0, cumulative) {
                (true, true) => {
                    running += count / total as f64;
                    running
                }
                (true, false) => count / (total as f64 * bin_width),
                (false, true) => {
                    running += count;
                    running
                }
                (false, false) => count,
            }
        })
        .collect()
}

fn extent(values: impl Iterator<Item = f64>, include_zero: bool) -> Option<(f64, f64)> {
    let (mut lo, mut hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        lo -= pad;
        hi += pad;
    }
    Some((lo, hi))
}

fn draw_title(svg: &mut String, title: &str, frame: Frame) {
    svg.push_str(&format!(
        r##"<text x="{x:.2}" y="{y:.2}" text-anchor="middle" font-size="15" fill="#222">{title}</text>"##,
        x = frame.x + frame.width / 2.0,
        y = frame.y + MARGIN_TOP / 2.0 + 5.0,
        title = escape(title)
    ));
}

fn draw_empty_notice(svg: &mut String, frame: Frame) {
    svg.push_str(&format!(
        r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">no data</text>"#,
        x = frame.x + frame.width / 2.0,
        y = frame.y + frame.height / 2.0
    ));
}

fn draw_axes(
    svg: &mut String,
    frame: Frame,
    xs: (f64, f64),
    ys: (f64, f64),
    x_format: &dyn Fn(f64) -> String,
    y_format: &dyn Fn(f64) -> String,
) {
    for step in 0..TICKS {
        let fraction = step as f64 / (TICKS - 1) as f64;

        let x_value = xs.0 + fraction * (xs.1 - xs.0);
        let x = frame.project_x(x_value, xs);
        svg.push_str(&format!(
            r#"<line x1="{x:.2}" y1="{top:.2}" x2="{x:.2}" y2="{bottom:.2}" stroke="{GRID_COLOR}" stroke-width="1" />"#,
            top = frame.top(),
            bottom = frame.bottom()
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            y = frame.bottom() + 16.0,
            label = escape(&x_format(x_value))
        ));

        let y_value = ys.0 + fraction * (ys.1 - ys.0);
        let y = frame.project_y(y_value, ys);
        svg.push_str(&format!(
            r#"<line x1="{left:.2}" y1="{y:.2}" x2="{right:.2}" y2="{y:.2}" stroke="{GRID_COLOR}" stroke-width="1" />"#,
            left = frame.left(),
            right = frame.right()
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end">{label}</text>"#,
            x = frame.left() - 6.0,
            y = y + 4.0,
            label = escape(&y_format(y_value))
        ));
    }

    svg.push_str(&format!(
        r##"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="none" stroke="#999" stroke-width="1" />"##,
        x = frame.left(),
        y = frame.top(),
        w = frame.right() - frame.left(),
        h = frame.bottom() - frame.top()
    ));
}

fn draw_axis_labels(svg: &mut String, frame: Frame, x_label: &str, y_label: &str) {
    if !x_label.is_empty() {
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            x = (frame.left() + frame.right()) / 2.0,
            y = frame.bottom() + 36.0,
            label = escape(x_label)
        ));
    }
    if !y_label.is_empty() {
        let x = frame.x + 14.0;
        let y = (frame.top() + frame.bottom()) / 2.0;
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle" transform="rotate(-90 {x:.2} {y:.2})">{label}</text>"#,
            label = escape(y_label)
        ));
    }
}

fn draw_horizontal_guide(svg: &mut String, frame: Frame, y: f64) {
    svg.push_str(&format!(
        r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{GUIDE_COLOR}" stroke-width="1" />"#,
        x1 = frame.left(),
        x2 = frame.right()
    ));
}

fn draw_polyline(svg: &mut String, points: impl Iterator<Item = (f64, f64)>, color: &str) {
    let points = points
        .map(|(x, y)| format!("{x:.2},{y:.2}"))
        .collect::<Vec<_>>()
        .join(" ");
    if points.is_empty() {
        return;
    }
    svg.push_str(&format!(
        r#"<polyline fill="none" stroke="{color}" stroke-width="1.5" points="{points}" />"#
    ));
}

fn draw_legend<'a>(svg: &mut String, frame: Frame, labels: impl Iterator<Item = &'a str>) {
    let x = frame.left() + 10.0;
    let mut y = frame.top() + 16.0;
    for (index, label) in labels.enumerate() {
        if label.is_empty() {
            continue;
        }
        svg.push_str(&format!(
            r#"<line x1="{x:.2}" y1="{ly:.2}" x2="{x2:.2}" y2="{ly:.2}" stroke="{color}" stroke-width="3" />"#,
            ly = y - 4.0,
            x2 = x + 20.0,
            color = color(index)
        ));
        svg.push_str(&format!(
            r#"<text x="{tx:.2}" y="{y:.2}" text-anchor="start">{label}</text>"#,
            tx = x + 26.0,
            label = escape(label)
        ));
        y += 18.0;
    }
}

fn color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn format_date_tick(value: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(value.round() as i32)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

fn format_value_tick(value: f64) -> String {
    if value.abs() >= 100.0 {
        format!("{value:.0}")
    } else if value.abs() >= 1.0 {
        format!("{value:.2}")
    } else {
        format!("{value:.3}")
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{HistogramSeries, LineSeries};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn renderer() -> SvgRenderer {
        SvgRenderer::new(RenderConfig::default())
    }

    #[test]
    fn counts_include_right_edge_and_skip_outliers() {
        let counts = histogram_counts(&[-0.2, -0.05, 0.0, 0.2, 0.5, f64::NAN], 4, (-0.2, 0.2));
        assert_eq!(counts, vec![1, 1, 1, 1]);
    }

    #[test]
    fn cumulative_density_ends_at_one() {
        let heights = bin_heights(&[0.1, 0.2, 0.3, 0.4], 3, (0.1, 0.4), true, true);
        assert!((heights.last().copied().unwrap() - 1.0).abs() < 1e-12);
        assert!(heights.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn density_integrates_to_one() {
        let values = [0.0, 0.1, 0.1, 0.3, 0.9];
        let bins = 5;
        let heights = bin_heights(&values, bins, (0.0, 1.0), true, false);
        let area: f64 = heights.iter().map(|h| h * 0.2).sum();
        assert!((area - 1.0).abs() < 1e-12);
    }

    #[test]
    fn windowed_density_counts_values_outside_the_window() {
        let chart = Chart::Histogram(HistogramChart {
            title: "TLT if SPY < 0".to_string(),
            x_label: "Performance".to_string(),
            y_label: "Density".to_string(),
            series: vec![HistogramSeries {
                label: "TLT".to_string(),
                values: vec![-0.1, 0.1, 0.5],
            }],
            bins: 2,
            cumulative: false,
            density: true,
            x_range: Some((-0.2, 0.2)),
            zero_marker: false,
        });

        let svg = renderer().render(&chart);
        // Bins of width 0.3 over [-0.1, 0.5]: the left bin holds two of three
        // values, so its density is 2 / (3 * 0.3) rather than 1 / (2 * 0.2).
        assert!(svg.contains(">2.22</text>"));
        assert!(!svg.contains(">2.50</text>"));
        // The axis stops at the window and the outlier's bar is clipped away.
        assert!(svg.contains(">0.200</text>"));
        assert!(!svg.contains(">0.500</text>"));
        assert_eq!(svg.matches(r#"fill-opacity="0.5""#).count(), 1);
    }

    #[test]
    fn line_chart_escapes_labels_and_draws_zero_guide() {
        let chart = Chart::Line(LineChart {
            title: "TLT if SPY < 0".to_string(),
            y_label: "Returns".to_string(),
            series: vec![LineSeries {
                label: "TLT".to_string(),
                points: vec![(d(2021, 1, 29), 0.1), (d(2021, 2, 26), -0.05)],
            }],
            zero_line: true,
        });

        let svg = renderer().render(&chart);
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("TLT if SPY &lt; 0"));
        assert!(svg.contains(GUIDE_COLOR));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("2021-01"));
    }

    #[test]
    fn empty_series_render_a_notice_instead_of_failing() {
        let chart = Chart::Histogram(HistogramChart {
            title: "Histogram".to_string(),
            x_label: String::new(),
            y_label: String::new(),
            series: vec![HistogramSeries {
                label: "SPY".to_string(),
                values: vec![],
            }],
            bins: 50,
            cumulative: false,
            density: false,
            x_range: None,
            zero_marker: true,
        });

        assert!(renderer().render(&chart).contains("no data"));
    }

    #[test]
    fn panels_draw_every_sub_chart() {
        let panel = |title: &str| {
            Chart::Scatter(ScatterChart {
                title: title.to_string(),
                x_label: "x".to_string(),
                y_label: "y".to_string(),
                points: vec![(0.1, 0.2), (-0.1, 0.0)],
            })
        };
        let chart = Chart::Panels(PanelGrid {
            rows: 2,
            columns: 2,
            panels: vec![panel("one"), panel("two"), panel("three"), panel("four")],
        });

        let svg = renderer().render(&chart);
        for title in ["one", "two", "three", "four"] {
            assert!(svg.contains(&format!(">{title}</text>")));
        }
        assert_eq!(svg.matches("<circle").count(), 8);
    }
}
