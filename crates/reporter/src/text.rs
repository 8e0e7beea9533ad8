//! Plain-text bodies for the tabular artifacts.

use analytics::{
    ColumnStats, ConditionalSubSeries, CorrelationMatrix, DescriptiveStats, PairSignCounts,
    QuadrantFrequencies,
};
use comfy_table::presets::ASCII_MARKDOWN;
use comfy_table::{Cell, CellAlignment, Table};
use core_types::{Leg, PairedTable, Quadrant, SignRegime, SymbolPair};

/// Renders `value` the way the summaries show every statistic.
fn number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.6}"),
        _ => "NaN".to_string(),
    }
}

fn table_with_header(first: &str, rest: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN);
    let mut header = vec![Cell::new(first)];
    header.extend(rest.iter().map(|h| Cell::new(h).set_alignment(CellAlignment::Right)));
    table.set_header(header);
    table
}

fn stat_row(name: &str, first: String, second: String) -> Vec<Cell> {
    vec![
        Cell::new(name),
        Cell::new(first).set_alignment(CellAlignment::Right),
        Cell::new(second).set_alignment(CellAlignment::Right),
    ]
}

/// The eight-row descriptive summary, one column per symbol.
pub fn describe_table(symbols: &SymbolPair, stats: &DescriptiveStats) -> String {
    let mut table = table_with_header("", &[symbols.first.as_str(), symbols.second.as_str()]);
    let (a, b) = (stats.get(Leg::First), stats.get(Leg::Second));

    table.add_row(stat_row("count", a.count.to_string(), b.count.to_string()));
    let rows: [(&str, fn(&ColumnStats) -> Option<f64>); 7] = [
        ("mean", |s| s.mean),
        ("std", |s| s.std),
        ("min", |s| s.min),
        ("25%", |s| s.q25),
        ("50%", |s| s.median),
        ("75%", |s| s.q75),
        ("max", |s| s.max),
    ];
    for (name, pick) in rows {
        table.add_row(stat_row(name, number(pick(a)), number(pick(b))));
    }
    table.to_string()
}

/// How many periods each symbol spent in `regime`.
pub fn sign_count_table(symbols: &SymbolPair, counts: &PairSignCounts, regime: SignRegime) -> String {
    let pick = |leg: Leg| {
        let c = counts.get(leg);
        match regime {
            SignRegime::Negative => c.negative,
            SignRegime::NonNegative => c.non_negative,
        }
    };

    let heading = format!("months {}", regime.operator());
    let mut table = table_with_header("symbol", &[heading.as_str()]);
    for leg in [Leg::First, Leg::Second] {
        table.add_row(vec![
            Cell::new(symbols.get(leg)),
            Cell::new(pick(leg)).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}

/// The symmetric 2x2 Pearson matrix.
pub fn correlation_table(matrix: &CorrelationMatrix) -> String {
    let symbols = &matrix.symbols;
    let mut table = table_with_header("", &[symbols.first.as_str(), symbols.second.as_str()]);
    for row in [Leg::First, Leg::Second] {
        table.add_row(stat_row(
            symbols.get(row),
            number(matrix.get(row, Leg::First)),
            number(matrix.get(row, Leg::Second)),
        ));
    }
    table.to_string()
}

/// One line per quadrant, in the fixed reading order.
pub fn quadrant_text(symbols: &SymbolPair, frequencies: &QuadrantFrequencies) -> String {
    [
        Quadrant::BothNonNegative,
        Quadrant::BothNegative,
        Quadrant::SecondUpFirstDown,
        Quadrant::SecondDownFirstUp,
    ]
    .into_iter()
    .map(|quadrant| {
        let (first, second) = quadrant.regimes();
        format!(
            "# months {} {} and {} {} is: {}\n",
            symbols.second,
            second.operator(),
            symbols.first,
            first.operator(),
            frequencies.count(quadrant)
        )
    })
    .collect()
}

/// A labelled block: the sub-series summary followed by its column sums.
pub fn sub_series_text(sub: &ConditionalSubSeries) -> String {
    let symbols = sub.rows.symbols();
    let mut sums = table_with_header("", &[symbols.first.as_str(), symbols.second.as_str()]);
    sums.add_row(stat_row(
        "sum",
        number(Some(sub.sums.first)),
        number(Some(sub.sums.second)),
    ));

    format!(
        "{label}\n\n{describe}\n\n{sums}\n",
        label = sub.label(),
        describe = describe_table(symbols, &sub.stats),
        sums = sums
    )
}
