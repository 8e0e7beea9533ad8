use crate::chart::{
    Chart, HistogramChart, HistogramSeries, LineChart, LineSeries, PanelGrid, ScatterChart,
};
use crate::render::SvgRenderer;
use crate::text;
use analytics::{ComparisonReport, ConditionalSubSeries};
use chrono::{NaiveDate, NaiveDateTime};
use configuration::RenderConfig;
use core_types::{Leg, PairRow, PairedTable, PriceTable, SignRegime, SymbolPair};

/// `strftime` pattern shared by the run directory and every file name.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// What identifies one run in its artifacts.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub symbols: SymbolPair,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub timestamp: String,
}

impl RunContext {
    pub fn new(symbols: SymbolPair, from: NaiveDate, to: NaiveDate, started: NaiveDateTime) -> Self {
        Self {
            symbols,
            from,
            to,
            timestamp: started.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactBody {
    Text(String),
    /// The chart description and its rendered SVG.
    Image { chart: Chart, svg: String },
}

/// One numbered output of a run, fully rendered and ready to write.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub ordinal: u8,
    pub stem: String,
    pub file_name: String,
    pub body: ArtifactBody,
}

impl Artifact {
    pub fn is_image(&self) -> bool {
        matches!(self.body, ArtifactBody::Image { .. })
    }
}

/// Sequences a `ComparisonReport` into the fixed, numbered artifact list.
///
/// Everything is rendered up front, so a run that fails to assemble writes nothing.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    config: RenderConfig,
    renderer: SvgRenderer,
}

impl ReportAssembler {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            renderer: SvgRenderer::new(config.clone()),
            config,
        }
    }

    pub fn assemble(&self, ctx: &RunContext, report: &ComparisonReport) -> Vec<Artifact> {
        let symbols = &report.symbols;
        let mut out = Output {
            ctx,
            renderer: &self.renderer,
            artifacts: Vec::new(),
        };

        // I. Configuration and prices
        out.text(1, "analysis_configuration", configuration_text(ctx, report));
        out.image(
            2,
            "yearly_prices_normalized_evolution",
            price_chart(
                "Prices normalized evolution",
                "Normalized price (base 100)",
                &report.normalized,
            ),
        );
        out.image(
            3,
            "monthly_prices_non_normalized_evolution",
            price_chart(
                "Monthly prices evolution (non-normalized)",
                "Price",
                &report.monthly,
            ),
        );

        // II. Return distribution
        out.text(
            4,
            "monthly_performance",
            format!(
                "MONTHLY PERFORMANCE\n\n{}\n",
                text::describe_table(symbols, &report.stats)
            ),
        );
        out.text(
            5,
            "monthly_positive_performance",
            text::sign_count_table(symbols, &report.sign_counts, SignRegime::NonNegative),
        );
        out.text(
            6,
            "monthly_negative_performance",
            text::sign_count_table(symbols, &report.sign_counts, SignRegime::Negative),
        );
        match &report.correlation {
            Some(matrix) => out.text(7, "correlations", text::correlation_table(matrix)),
            None => tracing::warn!("Correlation matrix unavailable; artifact 07 omitted."),
        }
        out.image(8, "histogram", self.returns_histogram(report, false));
        out.image(9, "cumulated_histogram", self.returns_histogram(report, true));
        out.image(
            10,
            "returns",
            Chart::Scatter(ScatterChart {
                title: "Monthly returns".to_string(),
                x_label: format!("{} returns", symbols.first),
                y_label: format!("{} returns", symbols.second),
                points: report.returns.rows().iter().map(|r| (r.first, r.second)).collect(),
            }),
        );

        // III. Co-movement
        match &report.rolling_correlation {
            Some(points) => out.image(
                11,
                "rolling_correlation",
                Chart::Line(LineChart {
                    title: format!("{}-month rolling correlation", report.rolling_window),
                    y_label: "Correlation".to_string(),
                    series: vec![LineSeries {
                        label: format!("{} vs {}", symbols.first, symbols.second),
                        points: points
                            .iter()
                            .filter_map(|p| p.correlation.map(|c| (p.date, c)))
                            .collect(),
                    }],
                    zero_line: true,
                }),
            ),
            None => tracing::warn!("Rolling correlation unavailable; artifact 11 omitted."),
        }
        out.text(
            12,
            "monthly_frequency",
            text::quadrant_text(symbols, &report.quadrants),
        );

        // IV. Conditional behaviour
        let panels = report.conditional.panels();
        out.text(
            13,
            "correlation_details",
            panels
                .iter()
                .map(|sub| text::sub_series_text(sub))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        out.image(
            13,
            "correlation_details",
            panel_grid(panels.map(|sub| observed_line(sub, false))),
        );
        out.image(
            13,
            "correlation_details_cumulated",
            panel_grid(panels.map(|sub| observed_line(sub, true))),
        );
        out.image(
            14,
            "correlation_details_histogram",
            panel_grid(panels.map(|sub| self.observed_histogram(sub))),
        );

        let hedges = [
            (15, "symbol1_profit_vs_symbol2_losses", &report.hedges.first_gains_second_loses),
            (17, "symbol2_profit_vs_symbol1_losses", &report.hedges.second_gains_first_loses),
        ];
        for (ordinal, stem, sub) in hedges {
            out.text(ordinal, stem, text::sub_series_text(sub));
            out.image(ordinal + 1, &format!("{stem}_graph"), cumulative_chart(sub));
        }

        tracing::info!(artifacts = out.artifacts.len(), "Report assembled.");
        out.artifacts
    }

    fn returns_histogram(&self, report: &ComparisonReport, cumulative: bool) -> Chart {
        let series = [Leg::First, Leg::Second]
            .into_iter()
            .map(|leg| HistogramSeries {
                label: report.symbols.get(leg).to_string(),
                values: report.returns.column(leg),
            })
            .collect();

        Chart::Histogram(HistogramChart {
            title: if cumulative {
                "Cumulated histogram of monthly returns".to_string()
            } else {
                "Histogram of monthly returns".to_string()
            },
            x_label: "Performance".to_string(),
            y_label: if cumulative { "Probability" } else { "Occurrences" }.to_string(),
            series,
            bins: self.config.histogram_bins,
            cumulative,
            density: cumulative,
            x_range: None,
            zero_marker: !cumulative,
        })
    }

    fn observed_histogram(&self, sub: &ConditionalSubSeries) -> Chart {
        let leg = observed(sub);
        let range = self.config.conditional_range;

        Chart::Histogram(HistogramChart {
            title: sub.label(),
            x_label: "Performance".to_string(),
            y_label: "Density".to_string(),
            series: vec![HistogramSeries {
                label: sub.rows.symbols().get(leg).to_string(),
                values: sub.rows.column(leg),
            }],
            bins: self.config.conditional_histogram_bins,
            cumulative: false,
            density: true,
            x_range: Some((-range, range)),
            zero_marker: true,
        })
    }
}

/// Accumulates artifacts with their final file names.
struct Output<'a> {
    ctx: &'a RunContext,
    renderer: &'a SvgRenderer,
    artifacts: Vec<Artifact>,
}

impl Output<'_> {
    fn text(&mut self, ordinal: u8, stem: &str, content: String) {
        self.push(ordinal, stem, "txt", ArtifactBody::Text(content));
    }

    fn image(&mut self, ordinal: u8, stem: &str, chart: Chart) {
        let svg = self.renderer.render(&chart);
        self.push(ordinal, stem, "svg", ArtifactBody::Image { chart, svg });
    }

    fn push(&mut self, ordinal: u8, stem: &str, extension: &str, body: ArtifactBody) {
        self.artifacts.push(Artifact {
            ordinal,
            stem: stem.to_string(),
            file_name: file_name(ordinal, stem, &self.ctx.timestamp, extension),
            body,
        });
    }
}

/// `{ordinal:02}-{stem}_{timestamp}.{extension}`
pub fn file_name(ordinal: u8, stem: &str, timestamp: &str, extension: &str) -> String {
    format!("{ordinal:02}-{stem}_{timestamp}.{extension}")
}

fn configuration_text(ctx: &RunContext, report: &ComparisonReport) -> String {
    format!(
        "ANALYSIS CONFIGURATION\n\n\
         timestamp: {}\n\
         symbol1: {}\n\
         symbol2: {}\n\
         fromDate: {}\n\
         toDate: {}\n\
         rollingWindow: {}\n",
        ctx.timestamp,
        ctx.symbols.first,
        ctx.symbols.second,
        ctx.from,
        ctx.to,
        report.rolling_window
    )
}

fn price_chart(title: &str, y_label: &str, table: &PriceTable) -> Chart {
    Chart::Line(LineChart {
        title: title.to_string(),
        y_label: y_label.to_string(),
        series: both_columns(table.symbols(), table.rows()),
        zero_line: false,
    })
}

fn both_columns(symbols: &SymbolPair, rows: &[PairRow]) -> Vec<LineSeries> {
    [Leg::First, Leg::Second]
        .into_iter()
        .map(|leg| LineSeries {
            label: symbols.get(leg).to_string(),
            points: rows.iter().map(|r| (r.date, r.get(leg))).collect(),
        })
        .collect()
}

fn observed(sub: &ConditionalSubSeries) -> Leg {
    sub.condition.observed_leg().unwrap_or(Leg::Second)
}

/// The observed column of a sign-conditioned sub-series, raw or as a running total.
fn observed_line(sub: &ConditionalSubSeries, cumulative: bool) -> Chart {
    let leg = observed(sub);
    let rows: &[PairRow] = if cumulative { &sub.cumulative } else { sub.rows.rows() };

    Chart::Line(LineChart {
        title: sub.label(),
        y_label: if cumulative { "Cumulated returns" } else { "Returns" }.to_string(),
        series: vec![LineSeries {
            label: sub.rows.symbols().get(leg).to_string(),
            points: rows.iter().map(|r| (r.date, r.get(leg))).collect(),
        }],
        zero_line: true,
    })
}

fn cumulative_chart(sub: &ConditionalSubSeries) -> Chart {
    Chart::Line(LineChart {
        title: sub.label(),
        y_label: "Cumulated returns".to_string(),
        series: both_columns(sub.rows.symbols(), &sub.cumulative),
        zero_line: true,
    })
}

/// Lays the four conditional panels out two by two.
///
/// `ConditionalSet::panels` lists them column by column; the grid is row-major.
fn panel_grid([top_left, bottom_left, top_right, bottom_right]: [Chart; 4]) -> Chart {
    Chart::Panels(PanelGrid {
        rows: 2,
        columns: 2,
        panels: vec![top_left, top_right, bottom_left, bottom_right],
    })
}
