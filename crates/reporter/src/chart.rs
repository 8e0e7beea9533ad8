use chrono::NaiveDate;

/// A chart description: only data and labels, never styling.
#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    Line(LineChart),
    Histogram(HistogramChart),
    Scatter(ScatterChart),
    Panels(PanelGrid),
}

/// The rendering kinds the assembler asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Histogram,
    CumulativeHistogram,
    Scatter,
    MultiPanelLine,
    MultiPanelHistogram,
}

impl Chart {
    pub fn kind(&self) -> ChartKind {
        match self {
            Chart::Line(_) => ChartKind::Line,
            Chart::Histogram(h) if h.cumulative => ChartKind::CumulativeHistogram,
            Chart::Histogram(_) => ChartKind::Histogram,
            Chart::Scatter(_) => ChartKind::Scatter,
            Chart::Panels(grid) => match grid.panels.first() {
                Some(Chart::Histogram(_)) => ChartKind::MultiPanelHistogram,
                _ => ChartKind::MultiPanelLine,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub label: String,
    pub points: Vec<(NaiveDate, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub y_label: String,
    pub series: Vec<LineSeries>,
    /// Draws a horizontal guide at zero.
    pub zero_line: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<HistogramSeries>,
    pub bins: usize,
    pub cumulative: bool,
    /// Scales bars so each series integrates to one.
    pub density: bool,
    /// Visible x window. Bins still span every value, so densities count
    /// the values drawn outside it.
    pub x_range: Option<(f64, f64)>,
    /// Draws a dashed vertical marker at zero.
    pub zero_marker: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(f64, f64)>,
}

/// Charts laid out row-major on a `rows` x `columns` grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelGrid {
    pub rows: usize,
    pub columns: usize,
    pub panels: Vec<Chart>,
}
