use crate::error::AnalyticsError;
use chrono::NaiveDate;
use core_types::{Leg, PairRow, PairedTable, Quadrant, ReturnTable, SignRegime, SymbolPair};
use serde::{Deserialize, Serialize};

/// Summary statistics for one column.
///
/// `std` is the sample standard deviation and needs at least two values; every
/// other statistic is absent only when the column is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnStats {
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                count,
                mean: None,
                std: None,
                min: None,
                q25: None,
                median: None,
                q75: None,
                max: None,
            };
        }

        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (count >= 2).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        });

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Self {
            count,
            mean: Some(mean),
            std,
            min: sorted.first().copied(),
            q25: Some(percentile(&sorted, 0.25)),
            median: Some(percentile(&sorted, 0.50)),
            q75: Some(percentile(&sorted, 0.75)),
            max: sorted.last().copied(),
        }
    }
}

/// Linear interpolation between the closest ranks of an ascending, non-empty slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub first: ColumnStats,
    pub second: ColumnStats,
}

impl DescriptiveStats {
    pub fn get(&self, leg: Leg) -> &ColumnStats {
        match leg {
            Leg::First => &self.first,
            Leg::Second => &self.second,
        }
    }
}

pub fn describe(table: &ReturnTable) -> DescriptiveStats {
    DescriptiveStats {
        first: ColumnStats::from_values(&table.column(Leg::First)),
        second: ColumnStats::from_values(&table.column(Leg::Second)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignCounts {
    pub non_negative: usize,
    pub negative: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSignCounts {
    pub first: SignCounts,
    pub second: SignCounts,
}

impl PairSignCounts {
    pub fn get(&self, leg: Leg) -> SignCounts {
        match leg {
            Leg::First => self.first,
            Leg::Second => self.second,
        }
    }
}

/// Counts periods per column with a return `>= 0` versus `< 0`.
pub fn sign_counts(table: &ReturnTable) -> PairSignCounts {
    let count = |leg: Leg| {
        let negative = table
            .rows()
            .iter()
            .filter(|r| SignRegime::of(r.get(leg)) == SignRegime::Negative)
            .count();
        SignCounts {
            non_negative: table.len() - negative,
            negative,
        }
    };

    PairSignCounts {
        first: count(Leg::First),
        second: count(Leg::Second),
    }
}

/// Pearson correlation of two equally long slices.
///
/// `None` when there are fewer than two pairs or either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (cov, var_x, var_y) = x.iter().zip(y).fold((0.0, 0.0, 0.0), |(c, vx, vy), (a, b)| {
        let dx = a - mean_x;
        let dy = b - mean_y;
        (c + dx * dy, vx + dx * dx, vy + dy * dy)
    });

    if !(var_x > 0.0) || !(var_y > 0.0) {
        return None;
    }

    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

/// The 2x2 Pearson correlation matrix of a return table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub symbols: SymbolPair,
    /// Indexed `[row][column]` with `0 = first`, `1 = second`.
    pub values: [[Option<f64>; 2]; 2],
}

impl CorrelationMatrix {
    pub fn get(&self, row: Leg, column: Leg) -> Option<f64> {
        self.values[leg_index(row)][leg_index(column)]
    }

    /// The correlation between the two symbols.
    pub fn coefficient(&self) -> Option<f64> {
        self.values[0][1]
    }
}

fn leg_index(leg: Leg) -> usize {
    match leg {
        Leg::First => 0,
        Leg::Second => 1,
    }
}

pub fn correlation_matrix(table: &ReturnTable) -> Result<CorrelationMatrix, AnalyticsError> {
    if table.len() < 2 {
        return Err(AnalyticsError::InsufficientData(format!(
            "correlation needs at least 2 return periods, got {}",
            table.len()
        )));
    }

    let off = pearson(&table.column(Leg::First), &table.column(Leg::Second));
    Ok(CorrelationMatrix {
        symbols: table.symbols().clone(),
        values: [[Some(1.0), off], [off, Some(1.0)]],
    })
}

/// Correlation over the window ending at `date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub correlation: Option<f64>,
}

/// Pearson correlation over every trailing window of `window` consecutive rows.
///
/// A table shorter than the window simply has no full window and yields an
/// empty sequence.
pub fn rolling_correlation(
    table: &ReturnTable,
    window: usize,
) -> Result<Vec<RollingPoint>, AnalyticsError> {
    if window < 2 {
        return Err(AnalyticsError::InsufficientData(format!(
            "rolling correlation needs a window of at least 2, got {}",
            window
        )));
    }
    if table.len() < window {
        return Ok(Vec::new());
    }

    let first = table.column(Leg::First);
    let second = table.column(Leg::Second);
    let rows = table.rows();

    Ok((0..=rows.len() - window)
        .map(|start| {
            let end = start + window;
            RollingPoint {
                date: rows[end - 1].date,
                correlation: pearson(&first[start..end], &second[start..end]),
            }
        })
        .collect())
}

/// Row counts by the sign pair of (first, second) returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuadrantFrequencies {
    pub both_non_negative: usize,
    pub both_negative: usize,
    pub second_up_first_down: usize,
    pub second_down_first_up: usize,
}

impl QuadrantFrequencies {
    pub fn count(&self, quadrant: Quadrant) -> usize {
        match quadrant {
            Quadrant::BothNonNegative => self.both_non_negative,
            Quadrant::BothNegative => self.both_negative,
            Quadrant::SecondUpFirstDown => self.second_up_first_down,
            Quadrant::SecondDownFirstUp => self.second_down_first_up,
        }
    }

    pub fn total(&self) -> usize {
        self.both_non_negative
            + self.both_negative
            + self.second_up_first_down
            + self.second_down_first_up
    }
}

pub fn quadrant_frequencies(table: &ReturnTable) -> QuadrantFrequencies {
    table
        .rows()
        .iter()
        .fold(QuadrantFrequencies::default(), |mut acc, r| {
            match Quadrant::of(r.first, r.second) {
                Quadrant::BothNonNegative => acc.both_non_negative += 1,
                Quadrant::BothNegative => acc.both_negative += 1,
                Quadrant::SecondUpFirstDown => acc.second_up_first_down += 1,
                Quadrant::SecondDownFirstUp => acc.second_down_first_up += 1,
            }
            acc
        })
}

/// Running totals of both columns, in row order.
pub fn cumulative_sum(table: &ReturnTable) -> Vec<PairRow> {
    table
        .rows()
        .iter()
        .scan((0.0, 0.0), |(first, second), r| {
            *first += r.first;
            *second += r.second;
            Some(PairRow::new(r.date, *first, *second))
        })
        .collect()
}

/// The predicate that selected a conditional sub-series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// Rows where `pivot`'s return falls in `regime`.
    Sign { pivot: Leg, regime: SignRegime },
    /// Rows whose sign pair lands in the quadrant.
    Quadrant(Quadrant),
}

impl Condition {
    pub fn matches(&self, row: &PairRow) -> bool {
        match self {
            Condition::Sign { pivot, regime } => SignRegime::of(row.get(*pivot)) == *regime,
            Condition::Quadrant(quadrant) => Quadrant::of(row.first, row.second) == *quadrant,
        }
    }

    /// The column whose behaviour the condition is meant to examine.
    pub fn observed_leg(&self) -> Option<Leg> {
        match self {
            Condition::Sign { pivot, .. } => Some(pivot.other()),
            Condition::Quadrant(_) => None,
        }
    }

    /// A human label such as `TLT if SPY < 0`.
    pub fn label(&self, symbols: &SymbolPair) -> String {
        match self {
            Condition::Sign { pivot, regime } => format!(
                "{} if {} {}",
                symbols.get(pivot.other()),
                symbols.get(*pivot),
                regime.operator()
            ),
            Condition::Quadrant(quadrant) => {
                let (first, second) = quadrant.regimes();
                format!(
                    "{} {} and {} {}",
                    symbols.first,
                    first.operator(),
                    symbols.second,
                    second.operator()
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnTotals {
    pub first: f64,
    pub second: f64,
}

/// A row subset of a return table together with its own summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalSubSeries {
    pub condition: Condition,
    pub rows: ReturnTable,
    pub stats: DescriptiveStats,
    pub sums: ColumnTotals,
    pub cumulative: Vec<PairRow>,
}

impl ConditionalSubSeries {
    fn build(table: &ReturnTable, condition: Condition) -> Self {
        let rows = table.filter(|r| condition.matches(r));
        let cumulative = cumulative_sum(&rows);
        let sums = cumulative
            .last()
            .map(|last| ColumnTotals {
                first: last.first,
                second: last.second,
            })
            .unwrap_or(ColumnTotals {
                first: 0.0,
                second: 0.0,
            });

        Self {
            condition,
            stats: describe(&rows),
            sums,
            cumulative,
            rows,
        }
    }

    pub fn label(&self) -> String {
        self.condition.label(self.rows.symbols())
    }
}

/// Rows where `pivot` is negative (`want_negative`) or non-negative, with the
/// companion column kept row-aligned.
pub fn filter_by_sign(table: &ReturnTable, pivot: Leg, want_negative: bool) -> ConditionalSubSeries {
    let regime = SignRegime::from_negative_flag(want_negative);
    ConditionalSubSeries::build(table, Condition::Sign { pivot, regime })
}

/// Rows whose (first, second) sign pair lands in `quadrant`.
pub fn filter_by_quadrant(table: &ReturnTable, quadrant: Quadrant) -> ConditionalSubSeries {
    ConditionalSubSeries::build(table, Condition::Quadrant(quadrant))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, m, 28).unwrap()
    }

    fn returns(values: &[(f64, f64)]) -> ReturnTable {
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, &(a, b))| PairRow::new(d(i as u32 + 1), a, b))
            .collect();
        ReturnTable::new(SymbolPair::new("SPY", "TLT"), rows).unwrap()
    }

    #[test]
    fn describe_matches_linear_interpolation_quantiles() {
        let stats = ColumnStats::from_values(&[4.0, 1.0, 3.0, 2.0]);

        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, Some(2.5));
        assert!((stats.std.unwrap() - 1.290_994_448_735_805_6).abs() < 1e-12);
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.q25, Some(1.75));
        assert_eq!(stats.median, Some(2.5));
        assert_eq!(stats.q75, Some(3.25));
        assert_eq!(stats.max, Some(4.0));
    }

    #[test]
    fn describe_single_value_has_no_std() {
        let stats = ColumnStats::from_values(&[0.5]);
        assert_eq!(stats.std, None);
        assert_eq!(stats.median, Some(0.5));
    }

    #[test]
    fn describe_empty_has_only_a_count() {
        let stats = ColumnStats::from_values(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.max, None);
    }

    #[test]
    fn zero_counts_as_non_negative() {
        let t = returns(&[(0.0, -0.1), (-0.2, 0.0), (0.3, 0.1)]);

        let counts = sign_counts(&t);
        assert_eq!(counts.first, SignCounts { non_negative: 2, negative: 1 });
        assert_eq!(counts.second, SignCounts { non_negative: 2, negative: 1 });

        let q = quadrant_frequencies(&t);
        assert_eq!(q.both_non_negative, 1);
        assert_eq!(q.second_down_first_up, 1);
        assert_eq!(q.second_up_first_down, 1);
        assert_eq!(q.both_negative, 0);
        assert_eq!(q.total(), 3);
    }

    #[test]
    fn perfectly_inverse_columns_correlate_at_minus_one() {
        let t = returns(&[(0.1, -0.1), (0.2, -0.2), (-0.3, 0.3)]);
        let m = correlation_matrix(&t).unwrap();

        assert!((m.coefficient().unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(m.get(Leg::First, Leg::First), Some(1.0));
        assert_eq!(m.get(Leg::First, Leg::Second), m.get(Leg::Second, Leg::First));
    }

    #[test]
    fn correlation_needs_two_rows() {
        let t = returns(&[(0.1, 0.2)]);
        assert!(matches!(
            correlation_matrix(&t),
            Err(AnalyticsError::InsufficientData(_))
        ));
    }

    #[test]
    fn flat_column_has_undefined_correlation() {
        let t = returns(&[(0.0, 0.1), (0.0, 0.2), (0.0, -0.1)]);
        let m = correlation_matrix(&t).unwrap();
        assert_eq!(m.coefficient(), None);
        assert_eq!(m.get(Leg::Second, Leg::Second), Some(1.0));
    }

    #[test]
    fn rolling_window_is_dated_by_its_last_row() {
        let t = returns(&[(0.1, 0.2), (0.2, 0.1), (0.3, 0.4), (0.1, 0.0)]);
        let rolling = rolling_correlation(&t, 3).unwrap();

        assert_eq!(rolling.len(), 2);
        assert_eq!(rolling[0].date, d(3));
        assert_eq!(rolling[1].date, d(4));
    }

    #[test]
    fn rolling_window_below_two_is_rejected() {
        let t = returns(&[(0.1, 0.2), (0.2, 0.1)]);
        assert!(rolling_correlation(&t, 1).is_err());
    }

    #[test]
    fn cumulative_sum_runs_in_row_order() {
        let t = returns(&[(0.1, -0.1), (0.2, 0.0), (-0.05, 0.3)]);
        let cum = cumulative_sum(&t);

        assert_eq!(cum.len(), 3);
        assert!((cum[1].first - 0.3).abs() < 1e-12);
        assert!((cum[2].first - 0.25).abs() < 1e-12);
        assert!((cum[2].second - 0.2).abs() < 1e-12);
    }

    #[test]
    fn sign_filter_keeps_companion_values() {
        let t = returns(&[(-0.1, 0.3), (0.2, -0.4), (-0.3, -0.5)]);
        let sub = filter_by_sign(&t, Leg::First, true);

        assert_eq!(sub.rows.column(Leg::Second), vec![0.3, -0.5]);
        assert_eq!(sub.condition.observed_leg(), Some(Leg::Second));
        assert_eq!(sub.label(), "TLT if SPY < 0");
        assert!((sub.sums.second + 0.2).abs() < 1e-12);
        assert_eq!(sub.stats.second.count, 2);
    }

    #[test]
    fn quadrant_filter_matches_its_frequency() {
        let t = returns(&[(0.1, -0.1), (0.2, -0.2), (-0.3, 0.3), (0.0, 0.0)]);
        let sub = filter_by_quadrant(&t, Quadrant::SecondDownFirstUp);

        assert_eq!(sub.rows.len(), quadrant_frequencies(&t).second_down_first_up);
        assert_eq!(sub.label(), "SPY >= 0 and TLT < 0");
        assert!((sub.sums.first - 0.3).abs() < 1e-12);
    }

    #[test]
    fn empty_sub_series_sums_to_zero() {
        let t = returns(&[(0.1, 0.1)]);
        let sub = filter_by_sign(&t, Leg::Second, true);

        assert!(sub.rows.is_empty());
        assert!(sub.cumulative.is_empty());
        assert_eq!(sub.sums, ColumnTotals { first: 0.0, second: 0.0 });
    }
}
