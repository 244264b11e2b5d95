//! # Parameter validation
//!
//! Checks run in a fixed order and the first failure wins. Field checks report
//! `'<field>' <problem>: <json value>`; road and pink zone rows, the odometer/cumulative
//! exclusion and the display range are checked afterwards.
use serde_json::{Map, Value};

use crate::aggregator::AggPolicy;
use crate::brain_errors::BrainError;
use crate::constants::{RateUnit, UnixTime, BDUSK};
use crate::goal::params::GoalParams;
use crate::road::matrix::RoadRow;
use crate::time::format_date;

fn field<'a>(params: &'a Map<String, Value>, key: &str) -> &'a Value {
    params.get(key).unwrap_or(&Value::Null)
}

fn check<T>(
    params: &Map<String, Value>,
    key: &str,
    problem: &str,
    parse: impl Fn(&Value) -> Option<T>,
) -> Result<T, BrainError> {
    let v = field(params, key);
    parse(v).ok_or_else(|| BrainError::ValidationError(format!("'{key}' {problem}: {v}")))
}

fn number(v: &Value) -> Option<f64> {
    v.as_f64().filter(|x| x.is_finite())
}

fn number_or_null(v: &Value) -> Option<Option<f64>> {
    match v {
        Value::Null => Some(None),
        other => number(other).map(Some),
    }
}

fn timestamp(v: &Value) -> Option<UnixTime> {
    number(v).filter(|t| 0.0 < *t && *t < BDUSK)
}

fn timestamp_or_null(v: &Value) -> Option<Option<UnixTime>> {
    match v {
        Value::Null => Some(None),
        other => timestamp(other).map(Some),
    }
}

fn boolean(v: &Value) -> Option<bool> {
    v.as_bool()
}

fn string(v: &Value) -> Option<String> {
    v.as_str().map(str::to_string)
}

fn string_or_null(v: &Value) -> Option<Option<String>> {
    match v {
        Value::Null => Some(None),
        other => string(other).map(Some),
    }
}

/// Loose truthiness for the switches that are never validated.
fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// A row as shown in error messages: JSON with its date rendered as `YYYY.MM.DD`.
pub fn show_row(row: &Value) -> String {
    if let Value::Array(items) = row {
        if let Some(t) = items.first().and_then(Value::as_f64) {
            let mut shown = items.clone();
            shown[0] = Value::String(format_date(t));
            return Value::Array(shown).to_string();
        }
    }
    row.to_string()
}

/// A road matrix row with exactly one null among three numeric entries.
pub fn parse_row(row: &Value) -> Option<RoadRow> {
    let Value::Array(items) = row else {
        return None;
    };
    if items.len() != 3 {
        return None;
    }
    let mut cells = [None; 3];
    for (cell, item) in cells.iter_mut().zip(items) {
        *cell = match item {
            Value::Null => None,
            other => Some(number(other)?),
        };
    }
    let parsed = RoadRow::new(cells[0], cells[1], cells[2]);
    parsed.is_valid().then_some(parsed)
}

fn parse_rows(rows: &[Value], what: &str) -> Result<Vec<RoadRow>, BrainError> {
    rows.iter()
        .map(|row| {
            parse_row(row).ok_or_else(|| {
                BrainError::ValidationError(format!("Invalid {what} row: {}", show_row(row)))
            })
        })
        .collect()
}

/// Interior rows (all but the first and the last) must not repeat consecutively.
fn check_duplicates(rows: &[RoadRow], raw: &[Value]) -> Result<(), BrainError> {
    if rows.len() < 3 {
        return Ok(());
    }
    let interior = &rows[1..rows.len() - 1];
    if let Some(i) = (1..interior.len()).find(|&i| interior[i] == interior[i - 1]) {
        return Err(BrainError::ValidationError(format!(
            "Road matrix has duplicate row: {}",
            show_row(&raw[i + 1])
        )));
    }
    let distinct = interior
        .iter()
        .enumerate()
        .all(|(i, row)| !interior[..i].contains(row));
    if !distinct {
        return Err(BrainError::ValidationError(
            "Road matrix duplicate row error! Tell support!".into(),
        ));
    }
    Ok(())
}

/// Validate merged parameters and convert them to [`GoalParams`].
///
/// Arguments
/// ---------
/// * `params`: parameters as returned by [`crate::goal::params::with_defaults`], the road
///   matrix already extended with the final `[tfin, vfin, rfin]` row
///
/// Return
/// ----------
/// * the typed parameters, or the first [`BrainError::ValidationError`] in check order
pub fn vet_params(params: &Map<String, Value>) -> Result<GoalParams, BrainError> {
    let deadline = check(
        params,
        "deadline",
        "outside 6am earlybird to 6am nightowl",
        |v| number(v).filter(|d| (-18.0 * 3600.0..=6.0 * 3600.0).contains(d)),
    )?;
    check(params, "asof", "can't be null! Tell support!", |v| {
        (!v.is_null()).then_some(())
    })?;
    let asof = check(params, "asof", "isn't a valid timestamp", timestamp)?;
    let tini = check(params, "tini", "isn't a valid timestamp", timestamp)?;
    let vini = check(params, "vini", "isn't numeric", number)?;
    let road_raw = check(params, "road", "(road matrix) isn't a list", |v| {
        v.as_array().cloned()
    })?;
    let tfin = check(params, "tfin", "isn't a valid timestamp", timestamp_or_null)?;
    let vfin = check(params, "vfin", "isn't numeric or null", number_or_null)?;
    let rfin = check(params, "rfin", "isn't numeric or null", number_or_null)?;
    let runits = check(params, "runits", "isn't a valid rate unit", |v| {
        v.as_str().and_then(RateUnit::from_code)
    })?;
    let yaw = check(params, "yaw", "isn't in [0,-1,1]", |v| {
        number(v).filter(|y| [0.0, -1.0, 1.0].contains(y))
    })?;
    let dir = check(params, "dir", "isn't in -1,1]", |v| {
        number(v).filter(|d| [-1.0, 1.0].contains(d))
    })?;
    let tmin = check(params, "tmin", "isn't a number/timestamp", timestamp_or_null)?;
    let tmax = check(params, "tmax", "isn't a valid timestamp", timestamp_or_null)?;
    let vmin = check(params, "vmin", "isn't numeric or null", number_or_null)?;
    let vmax = check(params, "vmax", "isn't numeric or null", number_or_null)?;
    let kyoom = check(params, "kyoom", "isn't boolean", boolean)?;
    let odom = check(params, "odom", "isn't boolean", boolean)?;
    let monotone = check(params, "monotone", "isn't boolean", boolean)?;
    let aggday = check(params, "aggday", "isn't one of max, sum, last, mean, etc", |v| {
        v.as_str().and_then(|s| s.parse::<AggPolicy>().ok())
    })?;
    let plotall = check(params, "plotall", "isn't boolean", boolean)?;
    let steppy = check(params, "steppy", "isn't boolean", boolean)?;
    let rosy = check(params, "rosy", "isn't boolean", boolean)?;
    let movingav = check(params, "movingav", "isn't boolean", boolean)?;
    let aura = check(params, "aura", "isn't boolean", boolean)?;
    let yaxis = check(params, "yaxis", "isn't a string", string)?;
    check(params, "yaxis", "string is too long\\n", |_| {
        (yaxis.chars().count() < 80).then_some(())
    })?;
    let waterbuf = check(params, "waterbuf", "isn't a string or null", string_or_null)?;
    let waterbux = check(params, "waterbux", "isn't a string", string)?;
    let hidey = check(params, "hidey", "isn't boolean", boolean)?;
    let stathead = check(params, "stathead", "isn't boolean", boolean)?;
    let imgsz = check(params, "imgsz", "isn't numeric", number)?;
    let yoog = check(params, "yoog", "isn't a string", string)?;

    let road = parse_rows(&road_raw, "road matrix")?;
    check_duplicates(&road, &road_raw)?;

    let pinkzone_raw = field(params, "pinkzone").as_array().cloned().unwrap_or_default();
    let pinkzone = parse_rows(&pinkzone_raw, "pinkzone")?;

    if kyoom && odom {
        return Err(BrainError::ValidationError(
            "The odometer setting doesn't make sense for an auto-summing goal!".into(),
        ));
    }
    if tmin.is_some_and(|t| t > asof) {
        return Err(BrainError::ValidationError(format!(
            "'tmin' the display range cannot be entirely in the future: {}",
            field(params, "tmin")
        )));
    }

    Ok(GoalParams {
        quantum: number(field(params, "quantum")),
        timey: truthy(field(params, "timey")),
        ppr: truthy(field(params, "ppr")),
        deadline,
        sadlhole: truthy(field(params, "sadlhole")),
        asof,
        tini,
        vini,
        road,
        tfin,
        vfin,
        rfin,
        runits,
        gunits: string(field(params, "gunits")).unwrap_or_else(|| "units".into()),
        yaw,
        dir,
        pinkzone,
        tmin,
        tmax,
        vmin,
        vmax,
        kyoom,
        odom,
        maxflux: number(field(params, "maxflux")).unwrap_or(0.0),
        monotone,
        aggday,
        plotall,
        steppy,
        rosy,
        movingav,
        aura,
        hashtags: truthy(field(params, "hashtags")),
        yaxis,
        waterbuf,
        waterbux,
        hidey,
        stathead,
        imgsz,
        yoog,
    })
}
