//! # Output snapshot
//!
//! The flat record returned for every goal computation. Timestamps are rendered as daystamps,
//! road-like tables as `[daystamp, value, rate]` rows. Besides the current fields the snapshot
//! carries deprecated ones (`limsum`, `headsum`, `titlesum`, `lnw`, `color`, `loser`, `gldt`,
//! `goal`, `rate`, `road`, `tini`, `vini`, `tfin`, `vfin`, `rfin`) for older consumers.
use serde::Serialize;
use serde_json::{Map, Value};

use crate::brain_errors::BrainError;
use crate::constants::{Daystamp, RateUnit, UnixTime, NO_LANE};
use crate::derail::DuebyRow;
use crate::goal::processor::GoalState;
use crate::goal::summary::error_statsum;
use crate::road::matrix::FilledRow;
use crate::time::dayify;

/// One `[date, value, rate]` row of an output table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow(pub Daystamp, pub f64, pub f64);

impl SnapshotRow {
    fn from_filled(row: &FilledRow) -> Self {
        SnapshotRow(dayify(row.t), row.v, row.r)
    }
}

/// One `[date, delta, value]` row of the due-by table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuebyEntry(pub Daystamp, pub f64, pub f64);

impl From<&DuebyRow> for DuebyEntry {
    fn from(row: &DuebyRow) -> Self {
        DuebyEntry(row.day.clone(), row.delta, row.value)
    }
}

/// Output of one goal computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalSnapshot {
    /// Red yesterday, so today is the last chance.
    pub sadbrink: bool,
    /// Value that buys one more safe day.
    pub safebump: Option<f64>,
    pub dueby: Vec<DuebyEntry>,
    /// Road matrix with nulls filled in, road start first.
    pub fullroad: Vec<SnapshotRow>,
    /// The road over the akrasia horizon.
    pub pinkzone: Vec<SnapshotRow>,
    /// Derailment day if no more data is entered.
    pub tluz: Option<Daystamp>,
    pub tcur: Option<Daystamp>,
    pub vcur: Option<f64>,
    pub vprev: Option<f64>,
    pub rcur: Option<f64>,
    pub ravg: Option<f64>,
    pub tdat: Option<Daystamp>,
    pub stdflux: f64,
    pub delta: f64,
    pub lane: i64,
    pub cntdn: i64,
    pub numpts: usize,
    pub mean: f64,
    pub meandelt: f64,
    pub proctm: UnixTime,
    pub statsum: String,
    pub ratesum: String,
    pub deltasum: String,
    pub graphsum: String,
    pub progsum: String,
    pub rah: f64,
    pub safebuf: Option<i64>,
    /// Empty on success.
    pub error: String,
    pub limsum: String,
    pub headsum: String,
    pub titlesum: String,
    pub lnw: f64,
    pub color: String,
    pub loser: bool,
    pub gldt: Option<Daystamp>,
    pub goal: Option<f64>,
    pub rate: Option<f64>,
    pub road: Vec<SnapshotRow>,
    pub tini: Option<Daystamp>,
    pub vini: Option<f64>,
    pub tfin: Option<Daystamp>,
    pub vfin: Option<f64>,
    pub rfin: Option<f64>,
}

impl GoalSnapshot {
    /// Snapshot with every output at its initial value.
    fn initial(proctm: UnixTime) -> Self {
        GoalSnapshot {
            sadbrink: false,
            safebump: None,
            dueby: Vec::new(),
            fullroad: Vec::new(),
            pinkzone: Vec::new(),
            tluz: None,
            tcur: None,
            vcur: None,
            vprev: None,
            rcur: None,
            ravg: None,
            tdat: None,
            stdflux: 0.0,
            delta: 0.0,
            lane: NO_LANE,
            cntdn: 0,
            numpts: 0,
            mean: 0.0,
            meandelt: 0.0,
            proctm,
            statsum: String::new(),
            ratesum: String::new(),
            deltasum: String::new(),
            graphsum: String::new(),
            progsum: String::new(),
            rah: 0.0,
            safebuf: None,
            error: String::new(),
            limsum: String::new(),
            headsum: String::new(),
            titlesum: String::new(),
            lnw: 0.0,
            color: "black".to_string(),
            loser: false,
            gldt: None,
            goal: None,
            rate: None,
            road: Vec::new(),
            tini: None,
            vini: None,
            tfin: None,
            vfin: None,
            rfin: None,
        }
    }

    /// Snapshot of a goal that went through every stage.
    pub fn from_state(state: &GoalState) -> Self {
        let p = &state.params;
        let mut fullroad = vec![SnapshotRow(dayify(p.tini), p.vini, 0.0)];
        fullroad.extend(state.filled_road.iter().map(SnapshotRow::from_filled));
        let goal_row = fullroad.last().cloned();
        let s = &state.summary;

        let mut snap = GoalSnapshot {
            sadbrink: state.sadbrink,
            safebump: Some(state.safebump),
            dueby: state.dueby.iter().map(DuebyEntry::from).collect(),
            pinkzone: state.pinkzone.iter().map(SnapshotRow::from_filled).collect(),
            tluz: Some(dayify(state.tluz)),
            tcur: Some(dayify(state.tcur)),
            vcur: Some(state.vcur),
            vprev: Some(state.vprev),
            rcur: Some(state.rcur),
            ravg: Some(state.ravg),
            tdat: Some(dayify(state.data.tdat)),
            stdflux: state.stdflux,
            delta: state.delta,
            lane: state.lane,
            cntdn: state.cntdn,
            numpts: state.data.numpts,
            mean: state.data.mean,
            meandelt: state.data.meandelt,
            statsum: s.statsum.clone(),
            ratesum: s.ratesum.clone(),
            deltasum: s.deltasum.clone(),
            graphsum: s.graphsum.clone(),
            progsum: s.progsum.clone(),
            rah: state.rah,
            safebuf: Some(state.safebuf),
            limsum: s.limsum.clone(),
            headsum: s.headsum.clone(),
            titlesum: s.titlesum.clone(),
            color: state.color.name().to_string(),
            loser: state.loser,
            road: fullroad.clone(),
            fullroad,
            tini: Some(dayify(p.tini)),
            vini: Some(p.vini),
            tfin: Some(dayify(state.tfin)),
            vfin: Some(state.vfin),
            rfin: Some(state.rfin),
            ..Self::initial(state.proctm)
        };
        if let Some(SnapshotRow(t, v, r)) = goal_row {
            snap.gldt = Some(t);
            snap.goal = Some(v);
            snap.rate = Some(r);
        }
        snap
    }

    /// Snapshot of a goal whose processing stopped on `error`.
    ///
    /// The deprecated goal fields echo whatever numeric `tini`, `vini`, `tfin`, `vfin` and
    /// `rfin` the goal file provided; `rate` is `rfin` converted to the goal's rate unit.
    pub fn from_error(raw: &Map<String, Value>, error: &BrainError, proctm: UnixTime) -> Self {
        let number = |key: &str| raw.get(key).and_then(Value::as_f64);
        let stamp = |key: &str| number(key).map(dayify);
        let siru = raw
            .get("runits")
            .and_then(Value::as_str)
            .or(Some("w").filter(|_| !raw.contains_key("runits")))
            .and_then(RateUnit::from_code)
            .map(|u| u.seconds());
        let message = error.to_string();
        GoalSnapshot {
            statsum: error_statsum(&message),
            error: message,
            gldt: stamp("tfin"),
            goal: number("vfin"),
            rate: number("rfin").zip(siru).map(|(r, s)| r * s),
            tini: stamp("tini"),
            vini: number("vini"),
            tfin: stamp("tfin"),
            vfin: number("vfin"),
            rfin: number("rfin"),
            ..Self::initial(proctm)
        }
    }

    /// Serialize to JSON, indented when `pretty`.
    pub fn to_json(&self, pretty: bool) -> Result<String, BrainError> {
        Ok(if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        })
    }
}
