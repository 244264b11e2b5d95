//! Human readable summaries of a processed goal.
//!
//! Line breaks inside `statsum` are the two characters `\n`, which is what goal pages expect.
use crate::constants::SID;
use crate::derail::{lim, limd};
use crate::goal::processor::GoalState;
use crate::num_core::quantize::number_string;
use crate::num_core::shownum::title_case;
use crate::num_core::stats::cvx;
use crate::num_core::{format_significant, round_directed, splur};
use crate::time::{daysnap, format_date};

/// Summary strings of a goal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summaries {
    pub ratesum: String,
    pub progsum: String,
    pub graphsum: String,
    pub deltasum: String,
    pub limsum: String,
    pub safeblurb: String,
    pub titlesum: String,
    pub headsum: String,
    pub statsum: String,
}

/// `statsum` of a goal that failed to process.
pub fn error_statsum(error: &str) -> String {
    format!(" error:    {error}\\n")
}

/// Sign with `sign(0) == 0`.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Conservative rounding to the goal's quantum, or significant digits when it has none.
fn shn(quantum: Option<f64>, x: f64, bias: i64, total: usize, decimals: usize) -> String {
    match quantum {
        Some(q) => number_string(round_directed(x, q, bias)),
        None => format_significant(x, total, decimals, bias),
    }
}

fn with_sign(x: f64, shown: String) -> String {
    if x >= 0.0 {
        format!("+{shown}")
    } else {
        shown
    }
}

/// Compute every summary string of a processed goal.
pub fn summarize(state: &GoalState) -> Summaries {
    let p = &state.params;
    let (y, d) = (p.yaw, p.dir);
    let q = p.quantum;
    let unit = p.runits.name();
    let good_way = y * d > 0.0;

    let rates: Vec<f64> = state.filled_road.iter().map(|r| r.r).collect();
    let mut minr = rates.iter().copied().fold(f64::INFINITY, f64::min);
    let mut maxr = rates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if minr.abs() > maxr.abs() {
        std::mem::swap(&mut minr, &mut maxr);
    }
    let smin = format_significant(minr, 4, 2, 0);
    let ratesum = if minr == maxr {
        format!("{smin} per {unit}")
    } else {
        format!(
            "between {smin} and {} per {unit} (current: {}, average: {})",
            format_significant(maxr, 4, 2, 0),
            format_significant(state.rcur, 4, 2, 0),
            format_significant(state.ravg, 4, 2, 0),
        )
    };

    let pt = format_significant(
        cvx(daysnap(state.tcur), p.tini, daysnap(state.tfin), 0.0, 100.0, false),
        1,
        1,
        0,
    );
    let pv = cvx(state.vcur, p.vini, state.vfin, 0.0, 100.0, false);
    let pv = format_significant(if p.vini < state.vfin { pv } else { 100.0 - pv }, 1, 1, 0);
    let progsum = if pt == pv {
        format!("{pt}% done")
    } else {
        format!("{pt}% done by time -- {pv}% by value")
    };

    let ybr = if state.cntdn < 7 {
        let x = sign(state.rfin) * (state.vfin - state.vcur);
        format!("To go to goal: {}.", shn(q, x, 0, 2, 1))
    } else {
        let x = state.road.value_at(state.tcur + state.siru) - state.road.value_at(state.tcur);
        format!(
            "Yellow Brick Rd = {} / {unit}.",
            with_sign(x, format_significant(x, 2, 1, 0))
        )
    };

    let days = 1.0 + ((state.tcur - p.tini) / SID).floor();
    let graphsum = format!(
        "{} on {} ({} in {}) targeting {} on {} ({}). {ybr}",
        shn(q, state.vcur, 0, 3, 1),
        format_date(state.tcur),
        splur(state.data.numpts as f64, "datapoint"),
        splur(days, "day"),
        shn(q, state.vfin, 0, 3, 1),
        format_date(state.tfin),
        splur(state.cntdn as f64, "more day"),
    );

    let deltasum = format!(
        "{} {}{} the bright line",
        shn(q, state.delta.abs(), 0, 4, 2),
        p.gunits,
        if state.delta < 0.0 { " below" } else { " above" }
    );

    let c = state.safebuf;
    let cd = splur(c as f64, "day");
    let horizon = if good_way { c.max(0) as usize } else { 0 };
    let lim_v = lim(&state.road, state.tcur, horizon);
    let limd_v = limd(&state.road, state.tcur, state.vcur, horizon);
    let yaw_bias = y as i64;
    let needed = with_sign(limd_v, shn(q, limd_v, yaw_bias, 4, 2));
    let limsum = if y == 0.0 {
        String::new()
    } else {
        let when = if good_way {
            format!("in {cd}")
        } else {
            "today".to_string()
        };
        if p.kyoom {
            format!("{needed} {when}")
        } else {
            format!("{needed} {when} ({})", shn(q, lim_v, yaw_bias, 4, 2))
        }
    };

    let safeblurb = if y * d < 0.0 {
        "unknown days of safety buffer".to_string()
    } else if c > 999 {
        "more than 999 days of safety buffer".to_string()
    } else {
        format!("~{cd} of safety buffer")
    };

    let titlesum = format!(
        "{}: bmndr.com/{} is safe for ~{cd}{}",
        title_case(state.color.name()),
        p.yoog,
        if c == 0 { " (beemergency!)" } else { "" }
    );

    let lane = if state.lane.abs() == 666 {
        "n/a".to_string()
    } else {
        state.lane.to_string()
    };
    let limit_label = if y == 0.0 {
        "limit:    "
    } else if y < 0.0 {
        "hard cap: "
    } else {
        "bare min: "
    };
    let statsum = [
        format!(
            " progress: {}  {}\\n",
            format_date(p.tini),
            format_significant(p.vini, 4, 2, 0)
        ),
        format!(
            "           {}  {}   [{progsum}]\\n",
            format_date(state.tcur),
            format_significant(state.vcur, 4, 2, 0)
        ),
        format!(
            "           {}  {}\\n",
            format_date(state.tfin),
            format_significant(state.vfin, 4, 2, 0)
        ),
        format!(" rate:     {ratesum}\\n"),
        format!(" lane:     {lane}\\n"),
        format!(" safebuf:  {c}\\n"),
        format!(" delta:    {deltasum}\\n"),
        format!(" {limit_label}{limsum}\\n"),
    ]
    .concat();

    Summaries {
        ratesum,
        progsum,
        graphsum,
        deltasum,
        limsum,
        safeblurb,
        headsum: titlesum.clone(),
        titlesum,
        statsum,
    }
}
