//! # Road matrix rows
//!
//! A goal file describes its trajectory as a list of rows `(date, value, rate)` where exactly
//! one of the three entries is `null`. This module validates such rows and fills in the missing
//! entry of each row, chaining every row from the end point of the previous one.
use serde_json::Value;

use crate::brain_errors::BrainError;
use crate::constants::{UnixTime, BDUSK};
use crate::road::AutoField;
use crate::time::{daysnap, format_date};

/// One row of a road matrix as provided by the user, rate expressed per rate unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadRow {
    pub t: Option<UnixTime>,
    pub v: Option<f64>,
    pub r: Option<f64>,
}

impl RoadRow {
    pub fn new(t: Option<UnixTime>, v: Option<f64>, r: Option<f64>) -> Self {
        RoadRow { t, v, r }
    }

    /// A row is valid when exactly one of its entries is null.
    pub fn is_valid(&self) -> bool {
        let nulls = [self.t.is_none(), self.v.is_none(), self.r.is_none()]
            .iter()
            .filter(|n| **n)
            .count();
        nulls == 1
    }

    /// JSON rendering with the date shown as `YYYY.MM.DD`, used in error messages.
    pub fn show(&self) -> String {
        let t = self
            .t
            .map_or(Value::Null, |t| Value::String(format_date(t)));
        let v = self.v.map_or(Value::Null, number_value);
        let r = self.r.map_or(Value::Null, number_value);
        Value::Array(vec![t, v, r]).to_string()
    }
}

/// JSON number, integral values rendered without a fractional part.
pub(crate) fn number_value(x: f64) -> Value {
    if x.fract() == 0.0 && x.abs() < 9.0e15 {
        Value::from(x as i64)
    } else {
        Value::from(x)
    }
}

/// A road row with all three entries known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilledRow {
    pub t: UnixTime,
    pub v: f64,
    /// Rate per rate unit.
    pub r: f64,
    /// Which entry was originally missing.
    pub derived: AutoField,
}

/// Solve for the missing one of `t`, `v` and `r` given the previous end point.
///
/// Arguments
/// ---------
/// * `prev_t`, `prev_v`: end point of the previous row
/// * `t`, `v`, `r`: the current row, rate per second, exactly one of them `None`
///
/// Return
/// ----------
/// * the missing quantity; an unknown date with a zero rate is the far-future sentinel and a
///   zero-length segment has rate 0
pub fn solve_third(
    prev_t: UnixTime,
    prev_v: f64,
    t: Option<UnixTime>,
    v: Option<f64>,
    r: Option<f64>,
) -> f64 {
    match (t, v, r) {
        (None, Some(v), Some(r)) => {
            if r == 0.0 {
                BDUSK
            } else {
                daysnap(BDUSK.min(prev_t + (v - prev_v) / r))
            }
        }
        (Some(t), None, Some(r)) => prev_v + r * (t - prev_t),
        (Some(t), Some(v), None) => {
            if t == prev_t {
                0.0
            } else {
                (v - prev_v) / (t - prev_t)
            }
        }
        _ => 0.0,
    }
}

fn next_row(prev: (UnixTime, f64), row: &RoadRow, siru: f64) -> Result<FilledRow, BrainError> {
    let r = row.r.map(|r| r / siru);
    let x = solve_third(prev.0, prev.1, row.t, row.v, r);
    let (t, v, r, derived) = match (row.t, row.v, r) {
        (None, Some(v), Some(r)) => (x, v, r, AutoField::Date),
        (Some(t), None, Some(r)) => (t, x, r, AutoField::Value),
        (Some(t), Some(v), None) => (t, v, x, AutoField::Slope),
        _ => {
            return Err(BrainError::RoadConsistencyError(format!(
                "Invalid road matrix row: {}",
                row.show()
            )))
        }
    };
    Ok(FilledRow {
        t,
        v,
        r: r * siru,
        derived,
    })
}

fn chain(
    start: (UnixTime, f64),
    rows: &[RoadRow],
    siru: f64,
) -> Result<Vec<FilledRow>, BrainError> {
    let mut filled = Vec::with_capacity(rows.len());
    let mut prev = start;
    for row in rows {
        let next = next_row(prev, row, siru)?;
        prev = (next.t, next.v);
        filled.push(next);
    }
    Ok(filled)
}

/// Fill every row of a road matrix starting from `(tini, vini)`.
///
/// Arguments
/// ---------
/// * `rows`: road matrix including the final goal row
/// * `tini`, `vini`: start of the road
/// * `siru`: seconds in the rate unit the rates are expressed in
///
/// Return
/// ----------
/// * the filled rows, without the leading rows dated before `tini`
/// * [`BrainError::RoadConsistencyError`] if a row does not have exactly one null
pub fn materialize(
    rows: &[RoadRow],
    tini: UnixTime,
    vini: f64,
    siru: f64,
) -> Result<Vec<FilledRow>, BrainError> {
    let filled = chain((tini, vini), rows, siru)?;
    let first_kept = filled
        .iter()
        .position(|row| row.t >= tini)
        .unwrap_or(filled.len());
    Ok(filled[first_kept..].to_vec())
}

/// Fill a road matrix whose first row holds the start point.
///
/// The start row is kept as the first output row with a zero rate.
pub fn materialize_all(rows: &[RoadRow], siru: f64) -> Result<Vec<FilledRow>, BrainError> {
    let Some((head, rest)) = rows.split_first() else {
        return Ok(Vec::new());
    };
    let (Some(tini), Some(vini)) = (head.t, head.v) else {
        return Err(BrainError::RoadConsistencyError(format!(
            "Invalid road matrix row: {}",
            head.show()
        )));
    };
    let mut filled = vec![FilledRow {
        t: tini,
        v: vini,
        r: 0.0,
        derived: AutoField::Slope,
    }];
    filled.extend(chain((tini, vini), rest, siru)?);
    Ok(filled)
}
