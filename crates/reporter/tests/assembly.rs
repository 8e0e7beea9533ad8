use analytics::{ComparisonEngine, ComparisonReport};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use configuration::RenderConfig;
use core_types::{PairedTable, PricePoint, PriceSeries, SymbolPair};
use reporter::{ArtifactBody, ChartKind, MemorySink, ReportAssembler, RunContext, publish};

const TS: &str = "2022-03-04_05-06-07";

fn trading_days(days: u64) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    (0..days)
        .filter_map(|i| start.checked_add_days(Days::new(i)))
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

fn spy(i: usize) -> f64 {
    100.0 + 10.0 * (i as f64 / 7.0).sin() + i as f64 * 0.05
}

fn tlt(i: usize) -> f64 {
    80.0 + 6.0 * (i as f64 / 11.0).cos() - i as f64 * 0.01
}

fn report_over(days: u64) -> ComparisonReport {
    let dates = trading_days(days);
    let series = |symbol: &str, price: fn(usize) -> f64| {
        let points = dates
            .iter()
            .enumerate()
            .map(|(i, &d)| PricePoint::new(d, price(i)))
            .collect();
        PriceSeries::new(symbol, points).unwrap()
    };

    ComparisonEngine::default()
        .analyze(&series("SPY", spy), &series("TLT", tlt))
        .unwrap()
}

fn context() -> RunContext {
    let started = NaiveDate::from_ymd_opt(2022, 3, 4)
        .unwrap()
        .and_hms_opt(5, 6, 7)
        .unwrap();
    RunContext::new(
        SymbolPair::new("SPY", "TLT"),
        NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2019, 2, 28).unwrap(),
        started,
    )
}

fn assembler() -> ReportAssembler {
    ReportAssembler::new(RenderConfig::default())
}

#[test]
fn full_run_emits_the_fixed_sequence() {
    // 2018-01 through 2019-02: fourteen months, thirteen returns.
    let report = report_over(420);
    assert_eq!(report.returns.rows().len(), 13);

    let artifacts = assembler().assemble(&context(), &report);
    let names: Vec<&str> = artifacts.iter().map(|a| a.file_name.as_str()).collect();

    let expected: Vec<String> = [
        "01-analysis_configuration.txt",
        "02-yearly_prices_normalized_evolution.svg",
        "03-monthly_prices_non_normalized_evolution.svg",
        "04-monthly_performance.txt",
        "05-monthly_positive_performance.txt",
        "06-monthly_negative_performance.txt",
        "07-correlations.txt",
        "08-histogram.svg",
        "09-cumulated_histogram.svg",
        "10-returns.svg",
        "11-rolling_correlation.svg",
        "12-monthly_frequency.txt",
        "13-correlation_details.txt",
        "13-correlation_details.svg",
        "13-correlation_details_cumulated.svg",
        "14-correlation_details_histogram.svg",
        "15-symbol1_profit_vs_symbol2_losses.txt",
        "16-symbol1_profit_vs_symbol2_losses_graph.svg",
        "17-symbol2_profit_vs_symbol1_losses.txt",
        "18-symbol2_profit_vs_symbol1_losses_graph.svg",
    ]
    .iter()
    .map(|name| {
        let (stem, ext) = name.rsplit_once('.').unwrap();
        format!("{stem}_{TS}.{ext}")
    })
    .collect();

    assert_eq!(names, expected);
    assert!(artifacts.windows(2).all(|w| w[0].ordinal <= w[1].ordinal));
}

#[test]
fn chart_kinds_follow_the_artifact_table() {
    let artifacts = assembler().assemble(&context(), &report_over(420));
    let kind = |stem: &str| {
        artifacts
            .iter()
            .find_map(|a| match &a.body {
                ArtifactBody::Image { chart, .. } if a.stem == stem => Some(chart.kind()),
                _ => None,
            })
            .unwrap()
    };

    assert_eq!(kind("yearly_prices_normalized_evolution"), ChartKind::Line);
    assert_eq!(kind("histogram"), ChartKind::Histogram);
    assert_eq!(kind("cumulated_histogram"), ChartKind::CumulativeHistogram);
    assert_eq!(kind("returns"), ChartKind::Scatter);
    assert_eq!(kind("correlation_details"), ChartKind::MultiPanelLine);
    assert_eq!(kind("correlation_details_histogram"), ChartKind::MultiPanelHistogram);
}

#[test]
fn short_history_omits_only_the_correlation_matrix() {
    // Two months give a single return: no correlation, an empty rolling series.
    let report = report_over(45);
    assert!(report.correlation.is_none());

    let artifacts = assembler().assemble(&context(), &report);
    let ordinals: Vec<u8> = artifacts.iter().map(|a| a.ordinal).collect();

    assert!(!ordinals.contains(&7));
    assert!(ordinals.contains(&11));
    assert_eq!(artifacts.len(), 19);
}

#[test]
fn text_artifacts_carry_the_run_configuration_and_labels() {
    let artifacts = assembler().assemble(&context(), &report_over(420));
    let text = |ordinal: u8| {
        artifacts
            .iter()
            .find_map(|a| match &a.body {
                ArtifactBody::Text(t) if a.ordinal == ordinal => Some(t.clone()),
                _ => None,
            })
            .unwrap()
    };

    let config = text(1);
    assert!(config.contains(&format!("timestamp: {TS}")));
    assert!(config.contains("symbol1: SPY"));
    assert!(config.contains("toDate: 2019-02-28"));

    let details = text(13);
    for label in ["TLT if SPY < 0", "TLT if SPY >= 0", "SPY if TLT < 0", "SPY if TLT >= 0"] {
        assert!(details.contains(label), "missing {label}");
    }
    assert!(text(15).starts_with("SPY >= 0 and TLT < 0"));
    assert!(text(17).starts_with("SPY < 0 and TLT >= 0"));
}

#[test]
fn publish_writes_every_assembled_artifact() {
    let artifacts = assembler().assemble(&context(), &report_over(420));
    let mut sink = MemorySink::new();

    publish(&artifacts, &mut sink).unwrap();

    assert_eq!(sink.names().len(), artifacts.len());
    assert_eq!(sink.images.len(), artifacts.iter().filter(|a| a.is_image()).count());
    assert!(sink.images.values().all(|svg| svg.starts_with("<svg")));
}
