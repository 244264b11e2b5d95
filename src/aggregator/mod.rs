//! # Datapoint aggregation
//!
//! Turns the raw entries of a goal into exactly one point per day.
//!
//! ## Pipeline
//!
//! 1. [`normalize_timestamps`]: floor every entry to its UTC day and stable-sort by
//!    `(day, input order)`.
//! 2. Comment scanning ([`markers`]): hashtags and derailment markers.
//! 3. [`apply_odometer_resets`] for odometer goals: a reading of exactly 0 means the counter
//!    was reset and the previous reading is carried into every later entry.
//! 4. Day reduction with the configured [`AggPolicy`] ([`aggday`]). For cumulative ("kyoom")
//!    goals each day is stacked on the running total of all earlier days.
//! 5. Split into past and future points, gap-filled statistics and *hollow* points (past
//!    days whose aggregated value differs from every value entered that day).
use std::collections::BTreeMap;

use itertools::Itertools;
use tracing::debug;

use crate::brain_errors::BrainError;
use crate::constants::{Point, UnixTime, SID};
use crate::num_core::quantize::number_string;
use crate::num_core::search_low;
use crate::num_core::stats::{accumulate, mean};
use crate::time::daysnap;

pub mod aggday;
pub mod markers;

pub use aggday::{reduce_day, AggPolicy};
pub use markers::DerailMarker;

/// A datapoint as entered by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub t: UnixTime,
    pub v: f64,
    pub comment: String,
    /// Position in the input, used to keep same-day entries in entry order.
    pub index: usize,
    /// Value before odometer adjustment.
    pub original_v: f64,
}

impl RawEntry {
    pub fn new(t: UnixTime, v: f64, comment: &str, index: usize) -> Self {
        RawEntry {
            t,
            v,
            comment: comment.to_string(),
            index,
            original_v: v,
        }
    }
}

/// Provenance of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    AggPast,
    AggFuture,
    RawPast,
    RawFuture,
    Flatline,
    Hollow,
}

/// A point of the processed data.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedPoint {
    pub t: UnixTime,
    pub v: f64,
    pub comment: String,
    pub kind: PointKind,
    /// Previous aggregated point, used to draw connecting segments.
    pub prev_t: Option<UnixTime>,
    pub prev_v: Option<f64>,
    /// Raw value of the entry this point coincides with, if any.
    pub original_v: Option<f64>,
    pub original_index: Option<usize>,
}

/// Switches of a goal that drive aggregation.
#[derive(Debug, Clone)]
pub struct AggregationSettings {
    pub policy: AggPolicy,
    /// Cumulative goal: each day adds to the running total.
    pub kyoom: bool,
    /// Odometer goal: zero readings are counter resets.
    pub odom: bool,
    /// Count every past entry in `numpts` rather than every past day.
    pub plotall: bool,
    pub hashtags: bool,
    pub asof: UnixTime,
    /// Good side of the road, +1 above, -1 below.
    pub yaw: f64,
    /// Goal rate per day, the cap used by `skatesum`.
    pub daily_rate: f64,
}

/// Everything the rest of the pipeline needs to know about the data.
#[derive(Debug, Clone, Default)]
pub struct AggregatedData {
    /// One aggregated point per past day (`t <= asof`).
    pub points: Vec<AggregatedPoint>,
    /// One aggregated point per future day.
    pub future: Vec<AggregatedPoint>,
    /// Every entry, with cumulative totals applied.
    pub all_points: Vec<AggregatedPoint>,
    /// Values entered per day (cumulative where applicable), keyed by day timestamp.
    pub raw_by_day: BTreeMap<i64, Vec<f64>>,
    /// Aggregated value per day.
    pub reduced_by_day: BTreeMap<i64, f64>,
    /// Worst value entered per day with respect to the good side.
    pub worst_by_day: BTreeMap<i64, f64>,
    pub hollow: Vec<AggregatedPoint>,
    pub derails: Vec<DerailMarker>,
    pub odometer_resets: Vec<UnixTime>,
    /// Space separated hashtags per day.
    pub hashtags: Vec<(UnixTime, String)>,
    pub numpts: usize,
    pub mean: f64,
    pub meandelt: f64,
    /// Day of the last past datapoint.
    pub tdat: UnixTime,
}

pub(crate) fn day_key(t: UnixTime) -> i64 {
    t.round() as i64
}

/// Floor entries to their UTC day and stable-sort them by `(day, input order)`.
pub fn normalize_timestamps(mut entries: Vec<RawEntry>) -> Vec<RawEntry> {
    for e in entries.iter_mut() {
        e.t = daysnap(e.t);
    }
    entries.sort_by(|a, b| a.t.total_cmp(&b.t).then(a.index.cmp(&b.index)));
    entries
}

/// Carry counter resets forward.
///
/// Every time an entry has a value of exactly 0, the previous raw value is added to that entry
/// and every later one.
pub fn apply_odometer_resets(entries: &mut [RawEntry]) {
    let Some(first) = entries.first() else {
        return;
    };
    let mut offset = 0.0;
    let mut prev = first.v;
    for e in entries.iter_mut().skip(1) {
        if e.v == 0.0 {
            offset += prev;
        }
        prev = e.v;
        e.v += offset;
    }
}

/// Daily linear interpolation between consecutive points.
pub fn gap_fill(points: &[Point]) -> Vec<Point> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut t = first.t;
    for (a, b) in points.iter().tuple_windows() {
        let den = b.t - a.t;
        while t <= b.t {
            out.push(Point::new(t, a.v + (b.v - a.v) * ((t - a.t) / den)));
            t += SID;
        }
    }
    if out.is_empty() {
        out.push(*first);
    }
    out
}

/// Zero-order interpolation of the data: the most recent value at or before a time.
#[derive(Debug, Clone, Default)]
pub struct StepFunction {
    points: Vec<Point>,
}

impl StepFunction {
    pub fn new(points: Vec<Point>) -> Self {
        StepFunction { points }
    }

    /// Value of the latest point at or before `t`, the first point's value before the data
    /// starts and 0 when there is no data.
    pub fn value_at(&self, t: UnixTime) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        let i = search_low(&self.points, |p| p.t - t).max(0) as usize;
        self.points[i].v
    }
}

fn aggregated_comment(
    day: &[RawEntry],
    reduced: f64,
    settings: &AggregationSettings,
) -> (String, Option<usize>, Option<f64>) {
    if let [only] = day {
        return (only.comment.clone(), Some(only.index), Some(only.original_v));
    }
    let values: Vec<f64> = day.iter().map(|e| e.v).collect();
    let candidates = if settings.kyoom && settings.policy == AggPolicy::Sum {
        accumulate(&values)
    } else {
        values
    };
    match candidates.iter().position(|&v| v == reduced) {
        Some(i) => (
            format!("{} ({})", day[i].comment, settings.policy),
            Some(day[i].index),
            Some(day[i].original_v),
        ),
        None => (settings.policy.to_string(), None, None),
    }
}

/// Run the aggregation pipeline over normalized entries.
///
/// Arguments
/// ---------
/// * `entries`: entries as returned by [`normalize_timestamps`]
/// * `settings`: goal switches
///
/// Return
/// ----------
/// * the aggregated data
/// * [`BrainError::ValidationError`] when there is no data, a datapoint is not numeric or
///   every datapoint lies in the future
pub fn aggregate(
    mut entries: Vec<RawEntry>,
    settings: &AggregationSettings,
) -> Result<AggregatedData, BrainError> {
    if entries.is_empty() {
        return Err(BrainError::ValidationError("No datapoints".into()));
    }
    if let Some(bad) = entries
        .iter()
        .find(|e| !(e.t.is_finite() && e.t > 0.0 && e.v.is_finite()))
    {
        return Err(BrainError::ValidationError(format!(
            "Invalid datapoint: {} {} \"{}\"",
            number_string(bad.t),
            number_string(bad.v),
            bad.comment
        )));
    }

    let mut out = AggregatedData::default();

    if settings.hashtags {
        let mut per_day: BTreeMap<i64, Vec<String>> = BTreeMap::new();
        for e in &entries {
            let tags = markers::extract_hashtags(&e.comment);
            if !tags.is_empty() {
                per_day.entry(day_key(e.t)).or_default().extend(tags);
            }
        }
        out.hashtags = per_day
            .into_iter()
            .map(|(t, tags)| (t as f64, tags.into_iter().unique().join(" ")))
            .collect();
    }

    out.derails = markers::detect_derail_markers(&entries);

    if settings.odom {
        out.odometer_resets = entries.iter().filter(|e| e.v == 0.0).map(|e| e.t).collect();
        apply_odometer_resets(&mut entries);
    }

    if settings.plotall {
        out.numpts = entries.iter().filter(|e| e.t <= settings.asof).count();
    }

    let mut aggregated: Vec<AggregatedPoint> = Vec::new();
    let mut running = 0.0;
    for (_, group) in &entries.iter().chunk_by(|e| day_key(e.t)) {
        let day: Vec<RawEntry> = group.cloned().collect();
        let ct = day[0].t;
        let values: Vec<f64> = day.iter().map(|e| e.v).collect();
        let reduced = reduce_day(&values, settings.policy, settings.daily_rate);

        let (prev_t, prev_v) = match aggregated.last() {
            Some(p) => (p.t, p.v),
            None => (ct, reduced + running),
        };
        let (comment, original_index, original_v) =
            aggregated_comment(&day, reduced, settings);
        aggregated.push(AggregatedPoint {
            t: ct,
            v: running + reduced,
            comment,
            kind: if ct <= settings.asof {
                PointKind::AggPast
            } else {
                PointKind::AggFuture
            },
            prev_t: Some(prev_t),
            prev_v: Some(prev_v),
            original_v,
            original_index,
        });

        let day_values: Vec<f64> = if settings.kyoom {
            let stacked = if settings.policy == AggPolicy::Sum {
                accumulate(&values)
            } else {
                values.clone()
            };
            stacked.iter().map(|v| v + running).collect()
        } else {
            values.clone()
        };
        let kind = if ct <= settings.asof {
            PointKind::RawPast
        } else {
            PointKind::RawFuture
        };
        for (e, v) in day.iter().zip(&day_values) {
            out.all_points.push(AggregatedPoint {
                t: ct,
                v: *v,
                comment: e.comment.clone(),
                kind,
                prev_t: None,
                prev_v: None,
                original_v: Some(e.original_v),
                original_index: Some(e.index),
            });
        }

        let key = day_key(ct);
        let worst = if settings.yaw < 0.0 {
            day_values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        } else {
            day_values.iter().copied().fold(f64::INFINITY, f64::min)
        };
        out.worst_by_day.insert(key, worst);
        if settings.kyoom {
            out.reduced_by_day.insert(key, running + reduced);
            running += reduced;
        } else {
            out.reduced_by_day.insert(key, reduced);
        }
        out.raw_by_day.insert(key, day_values);
    }

    let (past, future): (Vec<_>, Vec<_>) = aggregated
        .into_iter()
        .partition(|p| p.t <= settings.asof);
    if past.is_empty() {
        return Err(BrainError::ValidationError(
            "All datapoints are in the future!".into(),
        ));
    }
    out.points = past;
    out.future = future;

    if !settings.plotall {
        out.numpts = out.points.len();
    }

    let filled: Vec<f64> = gap_fill(
        &out
            .points
            .iter()
            .map(|p| Point::new(p.t, p.v))
            .collect::<Vec<_>>(),
    )
    .iter()
    .map(|p| p.v)
    .collect();
    out.mean = mean(&filled);
    if out.points.len() > 1 {
        let deltas: Vec<f64> = filled.iter().tuple_windows().map(|(a, b)| b - a).collect();
        out.meandelt = mean(&deltas);
    }

    out.tdat = out.points[out.points.len() - 1].t;

    for marker in out.derails.iter_mut() {
        let day = if marker.t < crate::constants::CHANGEDATE {
            marker.t + SID
        } else {
            marker.t
        };
        if let Some(v) = out.reduced_by_day.get(&day_key(day)) {
            marker.v = *v;
        }
    }

    out.hollow = out
        .points
        .iter()
        .filter(|p| {
            p.t < settings.asof
                && out
                    .raw_by_day
                    .get(&day_key(p.t))
                    .is_some_and(|vals| !vals.contains(&p.v))
        })
        .map(|p| AggregatedPoint {
            kind: PointKind::Hollow,
            ..p.clone()
        })
        .collect();

    debug!(
        days = out.points.len() + out.future.len(),
        numpts = out.numpts,
        derails = out.derails.len(),
        "aggregated datapoints"
    );
    Ok(out)
}
