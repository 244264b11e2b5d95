//! # Goal file parameters
//!
//! ## Overview
//!
//! A goal file (`.bb`) is a JSON object `{ "params": {...}, "data": [[t, v, comment], ...] }`.
//! Parameters stay untyped [`serde_json::Value`]s until [`crate::goal::validation`] has checked
//! them one by one, so that a type error can be reported against the field that caused it.
//!
//! Before validation the raw parameters go through:
//!
//! 1. [`legacy_in`]: deprecated names are mapped onto their current counterparts,
//! 2. [`stamp_in`]: daystamps become Unix timestamps and the data rows become
//!    [`RawEntry`]s,
//! 3. [`unknown_params`]: anything neither in the schema nor on the ignore list is reported,
//! 4. [`with_defaults`]: the schema defaults fill every missing parameter.
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::aggregator::{AggPolicy, RawEntry};
use crate::brain_errors::BrainError;
use crate::constants::{RateUnit, UnixTime};
use crate::road::matrix::RoadRow;
use crate::time::{dayparse, daysnap};

/// Raw content of a goal file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BrainInput {
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub data: Vec<Value>,
}

impl BrainInput {
    /// Parse a goal file from its JSON text.
    ///
    /// Return
    /// ----------
    /// * [`BrainError::InputParseError`] when the text is not a goal file
    pub fn from_json(text: &str) -> Result<Self, BrainError> {
        serde_json::from_str(text).map_err(|e| BrainError::InputParseError(e.to_string()))
    }

    /// Read and parse a goal file.
    ///
    /// Return
    /// ----------
    /// * [`BrainError::GoalFileNotFound`] when the file does not exist
    /// * [`BrainError::InputParseError`] when it is not a goal file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BrainError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(BrainError::GoalFileNotFound(path.display().to_string()));
        }
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// The goal identifier (`yoog`), honouring the legacy `usr` and `graph` fields.
    pub fn yoog(&self) -> String {
        let mut params = self.params.clone();
        legacy_in(&mut params);
        match params.get("yoog") {
            Some(Value::String(s)) => s.clone(),
            _ => "U/G".to_string(),
        }
    }
}

/// Parameters accepted in goal files; the values are their defaults.
///
/// `asof` defaults to the day of the injected "now" and `aggday` to `sum` for cumulative goals
/// and `last` otherwise, both filled in by [`with_defaults`].
pub fn schema() -> Map<String, Value> {
    let defaults: [(&str, Value); 43] = [
        ("quantum", json!(1e-5)),
        ("timey", json!(false)),
        ("ppr", json!(true)),
        ("deadline", json!(0)),
        ("sadlhole", json!(true)),
        ("asof", Value::Null),
        ("tini", Value::Null),
        ("vini", Value::Null),
        ("road", json!([])),
        ("tfin", Value::Null),
        ("vfin", Value::Null),
        ("rfin", Value::Null),
        ("runits", json!("w")),
        ("gunits", json!("units")),
        ("yaw", json!(0)),
        ("dir", json!(0)),
        ("pinkzone", json!([])),
        ("tmin", Value::Null),
        ("tmax", Value::Null),
        ("vmin", Value::Null),
        ("vmax", Value::Null),
        ("kyoom", json!(false)),
        ("odom", json!(false)),
        ("maxflux", json!(0)),
        ("monotone", json!(false)),
        ("aggday", Value::Null),
        ("plotall", json!(true)),
        ("steppy", json!(false)),
        ("rosy", json!(false)),
        ("movingav", json!(false)),
        ("aura", json!(false)),
        ("hashtags", json!(true)),
        ("yaxis", json!("")),
        ("waterbuf", Value::Null),
        ("waterbux", json!("")),
        ("hidey", json!(false)),
        ("stathead", json!(true)),
        ("imgsz", json!(760)),
        ("yoog", json!("U/G")),
        ("usr", Value::Null),
        ("graph", Value::Null),
        ("goal", Value::Null),
        ("rate", Value::Null),
    ];
    defaults
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Parameters that are silently ignored.
pub const IGNORED_PARAMS: [&str; 9] = [
    "ybhp", "integery", "noisy", "abslnw", "tagtime", "timezone", "backroad", "edgy", "offred",
];

/// Map deprecated parameter names onto the current ones.
///
/// `goal` becomes `vfin`, `rate` becomes `rfin` and `usr` with `graph` become `yoog`, each
/// only when the current name is absent.
pub fn legacy_in(params: &mut Map<String, Value>) {
    if let Some(goal) = params.get("goal").cloned() {
        params.entry("vfin").or_insert(goal);
    }
    if let Some(rate) = params.get("rate").cloned() {
        params.entry("rfin").or_insert(rate);
    }
    if !params.contains_key("yoog") {
        if let (Some(usr), Some(graph)) = (params.get("usr"), params.get("graph")) {
            let yoog = format!("{}/{}", display_value(usr), display_value(graph));
            params.insert("yoog".into(), Value::String(yoog));
        }
    }
}

/// A value the way it reads in a message: strings bare, everything else as JSON.
pub(crate) fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A date parameter converted to a timestamp.
///
/// Daystamps become the timestamp of their UTC midnight and numeric strings are read as
/// timestamps. Anything else is returned unchanged and left for validation to reject.
pub fn parse_stamp(v: &Value) -> Value {
    match v {
        Value::String(s) => match dayparse(s).or_else(|| s.trim().parse::<f64>().ok()) {
            Some(t) if t.is_finite() => json!(t),
            _ => v.clone(),
        },
        other => other.clone(),
    }
}

fn parse_row(row: &Value) -> Value {
    match row {
        Value::Array(items) if items.len() == 3 => {
            let mut items = items.clone();
            items[0] = parse_stamp(&items[0]);
            Value::Array(items)
        }
        other => other.clone(),
    }
}

/// Convert the date fields of the parameters in place and turn the data rows into entries.
///
/// Arguments
/// ---------
/// * `params`: raw parameters; `asof`, `tini`, `tfin`, `tmin`, `tmax` and the dates of the
///   road and pink zone rows are converted
/// * `data`: raw data rows `[date, value, comment]`
///
/// Return
/// ----------
/// * the entries in input order. Unreadable dates or values become NaN so that aggregation
///   reports the row as an invalid datapoint.
pub fn stamp_in(params: &mut Map<String, Value>, data: &[Value]) -> Vec<RawEntry> {
    for key in ["asof", "tini", "tfin", "tmin", "tmax"] {
        if let Some(v) = params.get_mut(key) {
            *v = parse_stamp(v);
        }
    }
    for key in ["road", "pinkzone"] {
        if let Some(Value::Array(rows)) = params.get_mut(key) {
            for row in rows.iter_mut() {
                *row = parse_row(row);
            }
        }
    }

    data.iter()
        .enumerate()
        .map(|(i, row)| {
            let cell = |k: usize| match row {
                Value::Array(items) => items.get(k).cloned().unwrap_or(Value::Null),
                _ => Value::Null,
            };
            let t = parse_stamp(&cell(0)).as_f64().unwrap_or(f64::NAN);
            let v = cell(1).as_f64().unwrap_or(f64::NAN);
            let comment = match cell(2) {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            RawEntry::new(t, v, &comment, i)
        })
        .collect()
}

/// Parameters that are neither in the schema nor ignored, as `key=value` strings.
pub fn unknown_params(params: &Map<String, Value>) -> Vec<String> {
    let known = schema();
    params
        .iter()
        .filter(|(k, _)| !known.contains_key(*k) && !IGNORED_PARAMS.contains(&k.as_str()))
        .map(|(k, v)| format!("{k}={}", display_value(v)))
        .collect()
}

/// The error reported for unknown parameters.
pub fn unknown_params_message(unknown: &[String]) -> String {
    let plural = if unknown.len() == 1 { "" } else { "s" };
    format!("Unknown param{plural}: {}", unknown.join(", "))
}

/// Schema defaults overlaid with the known parameters of the goal.
///
/// `asof` defaults to `daysnap(now)`; `aggday` defaults to `sum` for cumulative goals and
/// `last` otherwise. An explicit `null` is kept so that validation can reject it.
pub fn with_defaults(params: &Map<String, Value>, now: UnixTime) -> Map<String, Value> {
    let mut merged = schema();
    merged.insert("asof".into(), json!(daysnap(now)));
    for (k, v) in params {
        if merged.contains_key(k) {
            merged.insert(k.clone(), v.clone());
        }
    }
    if merged.get("aggday").is_none_or(Value::is_null) {
        let kyoom = merged.get("kyoom").and_then(Value::as_bool).unwrap_or(false);
        let policy = if kyoom { AggPolicy::Sum } else { AggPolicy::Last };
        merged.insert("aggday".into(), Value::String(policy.to_string()));
    }
    merged
}

/// Validated, typed goal parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalParams {
    /// Granularity of conservative rounding in summaries; `None` falls back to significant
    /// digit formatting.
    pub quantum: Option<f64>,
    pub timey: bool,
    /// Whether a PPR is shown for today.
    pub ppr: bool,
    /// Seconds after (or before, when negative) midnight at which the day ends.
    pub deadline: f64,
    pub sadlhole: bool,
    pub asof: UnixTime,
    pub tini: UnixTime,
    pub vini: f64,
    /// Road matrix, final `[tfin, vfin, rfin]` row included.
    pub road: Vec<RoadRow>,
    pub tfin: Option<UnixTime>,
    pub vfin: Option<f64>,
    pub rfin: Option<f64>,
    pub runits: RateUnit,
    pub gunits: String,
    pub yaw: f64,
    pub dir: f64,
    pub pinkzone: Vec<RoadRow>,
    pub tmin: Option<UnixTime>,
    pub tmax: Option<UnixTime>,
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
    pub kyoom: bool,
    pub odom: bool,
    pub maxflux: f64,
    pub monotone: bool,
    pub aggday: AggPolicy,
    pub plotall: bool,
    pub steppy: bool,
    pub rosy: bool,
    pub movingav: bool,
    pub aura: bool,
    pub hashtags: bool,
    pub yaxis: String,
    pub waterbuf: Option<String>,
    pub waterbux: String,
    pub hidey: bool,
    pub stathead: bool,
    pub imgsz: f64,
    pub yoog: String,
}

impl GoalParams {
    /// Seconds per rate unit.
    pub fn siru(&self) -> f64 {
        self.runits.seconds()
    }
}

#[cfg(test)]
mod params_test {
    use super::*;
    use crate::constants::SID;

    const T0: f64 = 1_706_659_200.0;

    fn object(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_schema_defaults() {
        let schema = schema();
        assert_eq!(schema.len(), 43);
        assert_eq!(schema["quantum"], json!(1e-5));
        assert_eq!(schema["runits"], json!("w"));
        assert_eq!(schema["imgsz"], json!(760));
        assert_eq!(schema["road"], json!([]));
        assert_eq!(schema["yoog"], json!("U/G"));
        assert!(schema["rate"].is_null());
        assert!(!schema.contains_key("ybhp"));
    }

    #[test]
    fn test_from_json() {
        let input = BrainInput::from_json(
            r#"{"params": {"yaw": 1}, "data": [["20240131", 1, "first"]]}"#,
        )
        .unwrap();
        assert_eq!(input.params["yaw"], json!(1));
        assert_eq!(input.data.len(), 1);
        assert!(matches!(
            BrainInput::from_json("{not json"),
            Err(BrainError::InputParseError(_))
        ));
        assert!(matches!(
            BrainInput::from_path("/definitely/not/here.bb"),
            Err(BrainError::GoalFileNotFound(_))
        ));
    }

    #[test]
    fn test_legacy_in() {
        let mut p = object(json!({"goal": 10, "rate": 2, "usr": "alice", "graph": "weight"}));
        legacy_in(&mut p);
        assert_eq!(p["vfin"], json!(10));
        assert_eq!(p["rfin"], json!(2));
        assert_eq!(p["yoog"], json!("alice/weight"));

        let mut p = object(json!({"goal": 10, "vfin": 20, "usr": "a", "graph": "b", "yoog": "c/d"}));
        legacy_in(&mut p);
        assert_eq!(p["vfin"], json!(20));
        assert_eq!(p["yoog"], json!("c/d"));
    }

    #[test]
    fn test_stamp_in() {
        let mut p = object(json!({
            "tini": "20240131",
            "tfin": 1706745600,
            "tmin": "garbage",
            "road": [["2024-02-10", null, 1], 5],
        }));
        let data = vec![
            json!(["20240201", 3, "a"]),
            json!([T0 + 3600.0, 4]),
            json!(["nope", 1, "bad"]),
        ];
        let entries = stamp_in(&mut p, &data);
        assert_eq!(p["tini"], json!(T0));
        assert_eq!(p["tfin"], json!(1706745600));
        assert_eq!(p["tmin"], json!("garbage"));
        assert_eq!(p["road"][0][0], json!(T0 + 10.0 * SID));
        assert_eq!(p["road"][1], json!(5));

        assert_eq!(entries[0].t, T0 + SID);
        assert_eq!(entries[1].t, T0 + 3600.0);
        assert_eq!(entries[1].comment, "");
        assert!(entries[2].t.is_nan());
        assert_eq!(entries[2].index, 2);
    }

    #[test]
    fn test_unknown_params() {
        let p = object(json!({"yaw": 1, "ybhp": true, "colour": "red", "zzz": 3}));
        let unknown = unknown_params(&p);
        assert_eq!(unknown, vec!["colour=red", "zzz=3"]);
        assert_eq!(
            unknown_params_message(&unknown),
            "Unknown params: colour=red, zzz=3"
        );
        assert_eq!(
            unknown_params_message(&unknown[..1]),
            "Unknown param: colour=red"
        );
    }

    #[test]
    fn test_with_defaults() {
        let merged = with_defaults(&object(json!({"kyoom": true, "bogus": 1})), T0 + 5000.0);
        assert_eq!(merged["asof"], json!(T0));
        assert_eq!(merged["aggday"], json!("sum"));
        assert_eq!(merged["runits"], json!("w"));
        assert!(!merged.contains_key("bogus"));

        let merged = with_defaults(&object(json!({"asof": null})), T0);
        assert_eq!(merged["asof"], Value::Null);
        assert_eq!(merged["aggday"], json!("last"));
    }
}
