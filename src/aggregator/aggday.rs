//! Day aggregation policies ("aggday").
//!
//! Several datapoints entered on the same day are reduced to a single value by one of the
//! policies below. Names match the values accepted in goal files.
use std::fmt;
use std::str::FromStr;

use crate::brain_errors::BrainError;
use crate::num_core::stats;

/// How the values entered on a single day are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggPolicy {
    Last,
    First,
    Min,
    Max,
    /// Plain arithmetic mean (`truemean`, `average`).
    TrueMean,
    /// Mean of the distinct values (`mean`, `uniqmean`).
    UniqMean,
    Median,
    /// Most frequent value, first one wins ties.
    Mode,
    /// Mean with the 10% lowest and highest values removed.
    TrimMean,
    Sum,
    /// 1 if anything was entered (`jolly`, `binary`).
    Binary,
    /// 1 if any value is non-zero.
    Nonzero,
    /// Triangular number of the sum.
    Triangle,
    /// Square of the sum.
    Square,
    /// Total of (stop - start) pairs.
    Clocky,
    Count,
    /// Sum capped at 2600.
    Kyshoc,
    /// Sum capped at the goal's daily rate.
    SkateSum,
    /// Sum capped at 1.
    Cap1,
}

/// Accepted names, in the order they are listed to users.
pub const AGGDAY_NAMES: [&str; 22] = [
    "last", "first", "min", "max", "truemean", "uniqmean", "average", "mean", "median", "mode",
    "trimmean", "sum", "jolly", "binary", "nonzero", "triangle", "square", "clocky", "count",
    "kyshoc", "skatesum", "cap1",
];

impl FromStr for AggPolicy {
    type Err = BrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use AggPolicy::*;
        Ok(match s {
            "last" => Last,
            "first" => First,
            "min" => Min,
            "max" => Max,
            "truemean" | "average" => TrueMean,
            "uniqmean" | "mean" => UniqMean,
            "median" => Median,
            "mode" => Mode,
            "trimmean" => TrimMean,
            "sum" => Sum,
            "jolly" | "binary" => Binary,
            "nonzero" => Nonzero,
            "triangle" => Triangle,
            "square" => Square,
            "clocky" => Clocky,
            "count" => Count,
            "kyshoc" => Kyshoc,
            "skatesum" => SkateSum,
            "cap1" => Cap1,
            other => {
                return Err(BrainError::ValidationError(format!(
                    "Unknown aggregation policy: {other}"
                )))
            }
        })
    }
}

impl fmt::Display for AggPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AggPolicy::*;
        let name = match self {
            Last => "last",
            First => "first",
            Min => "min",
            Max => "max",
            TrueMean => "truemean",
            UniqMean => "mean",
            Median => "median",
            Mode => "mode",
            TrimMean => "trimmean",
            Sum => "sum",
            Binary => "binary",
            Nonzero => "nonzero",
            Triangle => "triangle",
            Square => "square",
            Clocky => "clocky",
            Count => "count",
            Kyshoc => "kyshoc",
            SkateSum => "skatesum",
            Cap1 => "cap1",
        };
        write!(f, "{name}")
    }
}

/// Reduce the values of one day to a single value.
///
/// Arguments
/// ---------
/// * `values`: values entered on that day, in entry order (never empty in practice)
/// * `policy`: aggregation policy
/// * `daily_rate`: the goal's rate per day, only used by [`AggPolicy::SkateSum`]
pub fn reduce_day(values: &[f64], policy: AggPolicy, daily_rate: f64) -> f64 {
    use AggPolicy::*;
    let total = stats::sum(values);
    match policy {
        Last => values.last().copied().unwrap_or(f64::NAN),
        First => values.first().copied().unwrap_or(f64::NAN),
        Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        TrueMean => stats::mean(values),
        UniqMean => stats::mean(&stats::deldups(values)),
        Median => stats::median(values),
        Mode => stats::mode(values),
        TrimMean => stats::trimmean(values, 0.1),
        Sum => total,
        Binary => {
            if values.is_empty() {
                0.0
            } else {
                1.0
            }
        }
        Nonzero => stats::nonzero(values),
        Triangle => total * (total + 1.0) / 2.0,
        Square => total * total,
        Clocky => stats::clocky(values),
        Count => values.len() as f64,
        Kyshoc => total.min(2600.0),
        SkateSum => total.min(daily_rate),
        Cap1 => total.min(1.0),
    }
}
