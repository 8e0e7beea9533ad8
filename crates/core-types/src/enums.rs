use serde::{Deserialize, Serialize};

/// Selects one of the two columns of a paired table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leg {
    First,
    Second,
}

impl Leg {
    /// Returns the other column of the pair.
    pub fn other(&self) -> Self {
        match self {
            Leg::First => Leg::Second,
            Leg::Second => Leg::First,
        }
    }
}

/// The sign bucket a return falls into. Zero counts as non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignRegime {
    Negative,
    NonNegative,
}

impl SignRegime {
    pub fn of(value: f64) -> Self {
        if value < 0.0 {
            SignRegime::Negative
        } else {
            SignRegime::NonNegative
        }
    }

    pub fn from_negative_flag(want_negative: bool) -> Self {
        if want_negative {
            SignRegime::Negative
        } else {
            SignRegime::NonNegative
        }
    }

    /// The comparison operator used in labels, e.g. `SPY < 0`.
    pub fn operator(&self) -> &'static str {
        match self {
            SignRegime::Negative => "< 0",
            SignRegime::NonNegative => ">= 0",
        }
    }
}

/// The four sign combinations of a (first, second) pair of returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    BothNonNegative,
    BothNegative,
    /// Second leg up (or flat) while the first leg is down.
    SecondUpFirstDown,
    /// Second leg down while the first leg is up (or flat).
    SecondDownFirstUp,
}

impl Quadrant {
    pub fn of(first: f64, second: f64) -> Self {
        match (SignRegime::of(first), SignRegime::of(second)) {
            (SignRegime::NonNegative, SignRegime::NonNegative) => Quadrant::BothNonNegative,
            (SignRegime::Negative, SignRegime::Negative) => Quadrant::BothNegative,
            (SignRegime::Negative, SignRegime::NonNegative) => Quadrant::SecondUpFirstDown,
            (SignRegime::NonNegative, SignRegime::Negative) => Quadrant::SecondDownFirstUp,
        }
    }

    /// The regime each leg must be in for a row to land in this quadrant.
    pub fn regimes(&self) -> (SignRegime, SignRegime) {
        match self {
            Quadrant::BothNonNegative => (SignRegime::NonNegative, SignRegime::NonNegative),
            Quadrant::BothNegative => (SignRegime::Negative, SignRegime::Negative),
            Quadrant::SecondUpFirstDown => (SignRegime::Negative, SignRegime::NonNegative),
            Quadrant::SecondDownFirstUp => (SignRegime::NonNegative, SignRegime::Negative),
        }
    }
}
