//! # Goal processor
//!
//! Runs one goal computation from raw goal file content to a [`GoalSnapshot`].
//!
//! ## Stages
//!
//! ```text
//! ParseInput -> Validate -> ProcessData -> ProcessRoad -> ProcessParams -> Summarize -> Snapshot
//! ```
//!
//! Any stage may fail; the failure is recorded in the snapshot's `error` field and the
//! remaining stages are skipped, but a complete snapshot is always produced.
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tracing::{debug, info, info_span, warn};

use crate::aggregator::{
    aggregate, day_key, normalize_timestamps, AggregatedData, AggregatedPoint,
    AggregationSettings, PointKind, RawEntry, StepFunction,
};
use crate::brain_errors::BrainError;
use crate::constants::{Isoline, Point, UnixTime, AKH, BDUSK, DIY, PRAF, SID};
use crate::derail::{dueby, lim, stdflux, DerailContext, DtdRow, DuebyRow};
use crate::goal::config::ProcessingConfig;
use crate::goal::params::{
    legacy_in, stamp_in, unknown_params, unknown_params_message, with_defaults, BrainInput,
    GoalParams,
};
use crate::goal::snapshot::GoalSnapshot;
use crate::goal::summary::{summarize, Summaries};
use crate::goal::validation::vet_params;
use crate::isoline::{isoline, isoline_stages, DotColor, IsolineStages};
use crate::num_core::stats::{chop, orderedq};
use crate::road::matrix::{materialize, materialize_all, solve_third, FilledRow, RoadRow};
use crate::road::Road;
use crate::time::daysnap;

/// Plot range of a goal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRange {
    pub tmin: UnixTime,
    pub tmax: UnixTime,
    pub vmin: f64,
    pub vmax: f64,
}

/// Everything computed for a goal that went through every stage.
#[derive(Debug, Clone)]
pub struct GoalState {
    pub params: GoalParams,
    /// Seconds per rate unit.
    pub siru: f64,
    /// Time the computation was started.
    pub proctm: UnixTime,
    pub road: Road,
    /// Road matrix with every entry filled in, goal row last.
    pub filled_road: Vec<FilledRow>,
    pub tfin: UnixTime,
    pub vfin: f64,
    /// Final rate, per rate unit.
    pub rfin: f64,
    pub data: AggregatedData,
    /// Synthetic point carrying the last value forward to today.
    pub flatline: Option<AggregatedPoint>,
    pub ctx: DerailContext,
    pub stdflux: f64,
    pub tcur: UnixTime,
    pub vcur: f64,
    pub vprev: f64,
    pub safebuf: i64,
    pub tluz: UnixTime,
    pub delta: f64,
    pub rah: f64,
    pub dueby: Vec<DuebyRow>,
    pub safebump: f64,
    pub rcur: f64,
    pub ravg: f64,
    pub cntdn: i64,
    pub lane: i64,
    pub color: DotColor,
    pub loser: bool,
    pub sadbrink: bool,
    pub range: DisplayRange,
    pub pinkzone: Vec<FilledRow>,
    pub dtd: Vec<Vec<DtdRow>>,
    pub isolines: Vec<Isoline>,
    pub summary: Summaries,
}

impl GoalState {
    /// Past aggregated points followed by the flatlined point, if any.
    pub fn points(&self) -> Vec<AggregatedPoint> {
        let mut points = self.data.points.clone();
        points.extend(self.flatline.clone());
        points
    }

    /// Intermediate contours of isoline `k`.
    pub fn isoline_stages(&self, k: usize) -> Result<IsolineStages, BrainError> {
        isoline_stages(&self.road, &self.dtd, &self.ctx, k as f64)
    }

    /// Safety zone of an arbitrary point.
    pub fn classify(&self, t: UnixTime, v: f64) -> DotColor {
        self.ctx.dotcolor(&self.road, t, v, Some(&self.isolines))
    }
}

/// Result of [`GoalProcessor::process_detailed`].
#[derive(Debug)]
pub struct ProcessingOutcome {
    pub snapshot: GoalSnapshot,
    pub state: Result<GoalState, BrainError>,
    pub elapsed: Duration,
}

impl ProcessingOutcome {
    /// Whether the computation took longer than `budget`.
    pub fn exceeded(&self, budget: Duration) -> bool {
        self.elapsed > budget
    }
}

/// Computes goal snapshots.
///
/// A processor holds no state besides its configuration; every call to
/// [`GoalProcessor::process`] is independent.
#[derive(Debug, Clone, Default)]
pub struct GoalProcessor {
    config: ProcessingConfig,
}

impl GoalProcessor {
    pub fn new(config: ProcessingConfig) -> Self {
        GoalProcessor { config }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Compute the snapshot of a goal as of `now`.
    pub fn process(&self, input: &BrainInput, now: UnixTime) -> GoalSnapshot {
        self.process_detailed(input, now).snapshot
    }

    /// Compute a goal and keep the full state alongside the snapshot.
    ///
    /// Arguments
    /// ---------
    /// * `input`: goal file content
    /// * `now`: current Unix time; `asof` defaults to its day
    ///
    /// Return
    /// ----------
    /// * the snapshot, always complete; its `error` is empty on success
    /// * the goal state or the error that stopped the computation
    /// * the wall-clock time spent, which a caller may compare against
    ///   [`ProcessingConfig::max_processing_time`]
    pub fn process_detailed(&self, input: &BrainInput, now: UnixTime) -> ProcessingOutcome {
        let start = Instant::now();
        let yoog = input.yoog();
        let span = info_span!("goal", yoog = %yoog);
        let _enter = span.enter();

        debug!("parsing input");
        let mut raw = input.params.clone();
        legacy_in(&mut raw);
        let entries = stamp_in(&mut raw, &input.data);

        let state = self.run(&raw, entries, now);
        let snapshot = match &state {
            Ok(state) => GoalSnapshot::from_state(state),
            Err(e) => {
                warn!(error = %e, "goal processing failed");
                GoalSnapshot::from_error(&raw, e, now)
            }
        };

        let elapsed = start.elapsed();
        if elapsed > self.config.max_processing_time {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = self.config.max_processing_time.as_millis() as u64,
                "processing time budget exceeded"
            );
        }
        info!(elapsed_ms = elapsed.as_millis() as u64, "goal processed");
        ProcessingOutcome {
            snapshot,
            state,
            elapsed,
        }
    }

    fn run(
        &self,
        raw: &Map<String, Value>,
        entries: Vec<RawEntry>,
        now: UnixTime,
    ) -> Result<GoalState, BrainError> {
        debug!("validating parameters");
        let unknown = unknown_params(raw);
        if !unknown.is_empty() {
            return Err(BrainError::ValidationError(unknown_params_message(
                &unknown,
            )));
        }
        let mut merged = with_defaults(raw, now);
        let final_row: Vec<Value> = ["tfin", "vfin", "rfin"]
            .iter()
            .map(|k| merged.get(*k).cloned().unwrap_or(Value::Null))
            .collect();
        if let Some(Value::Array(road)) = merged.get_mut("road") {
            road.push(Value::Array(final_row));
        }
        let params = vet_params(&merged)?;
        let siru = params.siru();

        debug!(entries = entries.len(), "processing data");
        let settings = AggregationSettings {
            policy: params.aggday,
            kyoom: params.kyoom,
            odom: params.odom,
            plotall: params.plotall,
            hashtags: params.hashtags,
            asof: params.asof,
            yaw: params.yaw,
            daily_rate: params.rfin.unwrap_or(f64::NAN) * SID / siru,
        };
        let data = aggregate(normalize_timestamps(entries), &settings)?;

        debug!(rows = params.road.len(), "processing road");
        let road = Road::from_rows(&params.road, params.tini, params.vini, siru);

        debug!("processing parameters");
        let mut state = self.process_params(params, siru, road, data, now)?;

        debug!("summarizing");
        state.summary = summarize(&state);
        Ok(state)
    }

    fn process_params(
        &self,
        params: GoalParams,
        siru: f64,
        road: Road,
        data: AggregatedData,
        now: UnixTime,
    ) -> Result<GoalState, BrainError> {
        let dtf = StepFunction::new(data.points.iter().map(|p| Point::new(p.t, p.v)).collect());

        let filled = materialize(&params.road, params.tini, params.vini, siru)?;
        let Some(goal_row) = filled.last().copied() else {
            return Err(BrainError::RoadConsistencyError(road_before_start_message()));
        };
        let tlist: Vec<f64> = filled.iter().map(|r| r.t).collect();
        if params.tini > tlist[0] {
            return Err(BrainError::RoadConsistencyError(road_before_start_message()));
        }
        if !orderedq(&tlist) {
            return Err(BrainError::RoadConsistencyError(inconsistent_road_message(
                params.kyoom,
            )));
        }
        let (tfin, vfin, rfin) = (goal_row.t, goal_row.v, goal_row.r);

        let ctx = DerailContext {
            yaw: params.yaw,
            dir: params.dir,
            asof: params.asof,
            tini: params.tini,
            tfin,
            ppr_enabled: params.ppr,
            tdat: data.tdat,
            policy: self.config.ppr_policy,
            daily_minimum: self.config.daily_minimum,
            fix_doless_isolines: self.config.fix_doless_isolines,
            dtf,
        };

        let flux_points: Vec<Point> = data
            .points
            .iter()
            .filter(|p| p.t >= params.tini)
            .map(|p| Point::new(p.t, p.v))
            .collect();
        let stdflux = stdflux(&road, &flux_points)?;

        let flatline = flatline(&road, &ctx, &data);
        let mut points: Vec<&AggregatedPoint> = data.points.iter().collect();
        points.extend(flatline.as_ref());
        let (tcur, vcur) = match points.last() {
            Some(p) => (p.t, p.v),
            None => return Err(BrainError::ValidationError("No datapoints".into())),
        };
        let vprev = points[points.len().saturating_sub(2)].v;

        let safebuf = ctx.days_to_derail(&road, tcur, vcur);
        let mut tluz = tcur + safebuf as f64 * SID;
        let delta = chop(vcur - road.value_at(tcur));
        let rah = road.value_at(tcur + AKH);
        let dueby = dueby(&road, tcur, vcur, params.dir, 7);
        let safebump = lim(&road, tcur, safebuf.max(0) as usize);
        let rcur = road.slope_at(tcur) * siru;
        let ravg = solve_third(params.tini, params.vini, Some(tfin), Some(vfin), None) * siru;
        let cntdn = ((tfin - tcur) / SID).ceil() as i64;
        let lane = params.yaw as i64 * (safebuf - if safebuf <= 1 { 2 } else { 1 });
        let color = match safebuf {
            s if s < 1 => DotColor::Red,
            1 => DotColor::Orange,
            2 => DotColor::Blue,
            _ => DotColor::Green,
        };
        let loser = ctx.red_yesterday(&road, tcur);
        let yesterday = tcur - SID;
        let sadbrink = yesterday > params.tini
            && ctx.dotcolor(&road, yesterday, ctx.dtf.value_at(yesterday), None) == DotColor::Red;
        if safebuf <= 0 {
            tluz = tcur;
        }
        if tfin < tluz {
            tluz = BDUSK;
        }
        debug!(tcur, vcur, safebuf, "current state");

        let range = default_range(&params, &road, &ctx, &data, flatline.as_ref(), tcur);

        let pinkzone = pinkzone(&road, &filled, params.asof, siru)?;

        let dtd = ctx.build_dtd_table(&road);
        let isolines = (0..self.config.isoline_count)
            .map(|k| isoline(&road, &dtd, &ctx, k as f64))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = isolines.len(), "isolines computed");

        Ok(GoalState {
            params,
            siru,
            proctm: now,
            road,
            filled_road: filled,
            tfin,
            vfin,
            rfin,
            data,
            flatline,
            ctx,
            stdflux,
            tcur,
            vcur,
            vprev,
            safebuf,
            tluz,
            delta,
            rah,
            dueby,
            safebump,
            rcur,
            ravg,
            cntdn,
            lane,
            color,
            loser,
            sadbrink,
            range,
            pinkzone,
            dtd,
            isolines,
            summary: Summaries::default(),
        })
    }
}

fn road_before_start_message() -> String {
    "Road dial error\\n(There are segments of your yellow brick road\\n\
     that are somehow dated before your road start date!)"
        .to_string()
}

fn inconsistent_road_message(kyoom: bool) -> String {
    let what = if kyoom { "total" } else { "value" };
    format!(
        "Road dial error\\n(Your goal date, goal {what}, and rate are inconsistent!\\n\
         Is your rate positive when you meant negative?\\n\
         Or is your goal {what} such that the implied goal date is in the past?)"
    )
}

/// Carry the last datapoint forward toward today.
///
/// Do-less goals flatline all the way to `min(asof, tfin)`. Do-more goals walk forward from
/// the last datapoint and stop after two consecutive red days. No point is added past the
/// goal date or on a day that already has data.
pub fn flatline(road: &Road, ctx: &DerailContext, data: &AggregatedData) -> Option<AggregatedPoint> {
    let last = data.points.last()?;
    let (tlast, vlast) = (last.t, last.v);
    if tlast > ctx.tfin {
        return None;
    }
    let limit = ctx.asof.min(ctx.tfin);
    let x = if ctx.is_do_less() {
        limit
    } else {
        let mut x = tlast;
        let mut prev: Option<DotColor> = None;
        while x <= limit {
            let color = ctx.dotcolor(road, x, vlast, None);
            if prev == Some(DotColor::Red) && color == DotColor::Red {
                break;
            }
            prev = Some(color);
            x += SID;
        }
        let x = x.min(limit);
        if data.points.iter().any(|p| p.t == x) {
            return None;
        }
        x
    };
    if data.reduced_by_day.contains_key(&day_key(x)) {
        return None;
    }
    Some(AggregatedPoint {
        t: x,
        v: vlast,
        comment: "PPR".to_string(),
        kind: PointKind::Flatline,
        prev_t: Some(tlast),
        prev_v: Some(vlast),
        original_v: None,
        original_index: None,
    })
}

fn separate(lo: f64, hi: f64) -> (f64, f64) {
    if lo == hi {
        (lo - 1.0, hi + 1.0)
    } else if lo > hi {
        (hi, lo)
    } else {
        (lo, hi)
    }
}

/// Fill in whatever part of the display range the goal does not set.
///
/// The time range defaults to the road start (or today if earlier) up to a couple of akrasia
/// horizons past the current point, more for goals with years of data. The value range covers
/// the data in the time range, padded by 1.5% on each side, and the road at both ends.
pub fn default_range(
    params: &GoalParams,
    road: &Road,
    ctx: &DerailContext,
    data: &AggregatedData,
    flatline: Option<&AggregatedPoint>,
    tcur: UnixTime,
) -> DisplayRange {
    let tmin = params.tmin.unwrap_or(params.tini.min(params.asof));
    let tmax = params.tmax.unwrap_or_else(|| {
        let years = ((tcur - tmin) / (DIY * SID)).floor();
        daysnap((1.0 + years / 2.0) * 2.0 * AKH + tcur)
    });
    if let (Some(vmin), Some(vmax)) = (params.vmin, params.vmax) {
        let (vmin, vmax) = separate(vmin, vmax);
        return DisplayRange { tmin, tmax, vmin, vmax };
    }

    let a = road.value_at(tmin);
    let b = road.value_at(tmax);
    let in_range = |t: f64| t >= tmin && t <= tmax;
    let shown: Vec<f64> = data
        .points
        .iter()
        .chain(flatline)
        .filter(|p| in_range(p.t))
        .map(|p| p.v)
        .collect();
    let mut mind = shown.iter().copied().fold(f64::INFINITY, f64::min);
    let mut maxd = shown.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if let Some(flad) = flatline.filter(|f| in_range(f.t)) {
        let pprv = flad.v + ctx.ppr(road, params.asof);
        mind = mind.min(pprv);
        maxd = maxd.max(pprv);
    }
    let padding = ((maxd - mind) * PRAF * 2.0).max(0.0);
    let mut minmin = (mind - padding).min(a).min(b);
    let mut maxmax = (maxd + padding).max(a).max(b);
    if params.plotall && in_range(params.tini) {
        if let Some(values) = data.raw_by_day.get(&day_key(params.tini)) {
            minmin = values.iter().copied().fold(minmin, f64::min);
            maxmax = values.iter().copied().fold(maxmax, f64::max);
        }
    }

    let (vmin, vmax) = match (params.vmin, params.vmax) {
        (None, None) => separate(minmin, maxmax),
        (None, Some(vmax)) => (if minmin < vmax { minmin } else { vmax - 1.0 }, vmax),
        (Some(vmin), _) => (vmin, if maxmax > vmin { maxmax } else { vmin + 1.0 }),
    };
    DisplayRange { tmin, tmax, vmin, vmax }
}

/// The road over the akrasia horizon, starting today.
pub fn pinkzone(
    road: &Road,
    filled: &[FilledRow],
    asof: UnixTime,
    siru: f64,
) -> Result<Vec<FilledRow>, BrainError> {
    let horizon = asof + AKH;
    let mut rows = vec![RoadRow::new(Some(asof), Some(road.value_at(asof)), Some(0.0))];
    rows.extend(
        filled
            .iter()
            .filter(|r| r.t > asof && r.t < horizon)
            .map(|r| RoadRow::new(Some(r.t), Some(r.v), None)),
    );
    rows.push(RoadRow::new(Some(horizon), Some(road.value_at(horizon)), None));
    materialize_all(&rows, siru)
}
