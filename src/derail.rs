//! # Derailment engine
//!
//! Everything that answers "how many days until this goal derails".
//!
//! ## Overview
//!
//! * [`DerailContext::ppr`]: the *pessimistic presumptive report* added for every day without
//!   data on do-less goals.
//! * [`DerailContext::days_to_derail`]: the day-by-day walk producing the safety buffer.
//! * [`DerailContext::build_dtd_table`]: per road node, a piecewise linear map from value to
//!   days-to-derail, consumed by [`crate::isoline`].
//! * Small road queries used by the goal processor: [`DerailContext::gdelt`],
//!   [`DerailContext::aok`], [`stdflux`], [`dueby`].
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::aggregator::StepFunction;
use crate::brain_errors::BrainError;
use crate::constants::{Daystamp, Isoline, Point, UnixTime, SID};
use crate::isoline::{classify_zone, DotColor};
use crate::num_core::stats::{chop, monotonize};
use crate::num_core::quantile;
use crate::road::Road;
use crate::time::dayify;

/// How the daily PPR is derived from the road rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PprPolicy {
    /// Twice the road rate, a fixed amount on flat roads, nothing on roads going the good way.
    #[default]
    Legacy,
    /// As [`PprPolicy::Legacy`] with the magnitude never below the daily minimum.
    FloorMagnitude,
    /// Flat and good-way roads also get the daily minimum, magnitude floored.
    ClampWrongDirection,
}

impl FromStr for PprPolicy {
    type Err = BrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(PprPolicy::Legacy),
            "floor" | "floor-magnitude" => Ok(PprPolicy::FloorMagnitude),
            "clamp" | "clamp-wrong-direction" => Ok(PprPolicy::ClampWrongDirection),
            other => Err(BrainError::InvalidConfig(format!(
                "unknown PPR policy '{other}'"
            ))),
        }
    }
}

impl fmt::Display for PprPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PprPolicy::Legacy => "legacy",
            PprPolicy::FloorMagnitude => "floor-magnitude",
            PprPolicy::ClampWrongDirection => "clamp-wrong-direction",
        };
        write!(f, "{name}")
    }
}

/// Daily PPR for a road rate `r` (units per day).
///
/// Arguments
/// ---------
/// * `policy`: PPR policy
/// * `daily_minimum`: PPR magnitude on flat roads, and the floor of the floored policies
/// * `yaw`: good side of the road
/// * `r`: road rate per day, infinite on vertical segments
pub fn ppr_rate(policy: PprPolicy, daily_minimum: f64, yaw: f64, r: f64) -> f64 {
    let floored = |x: f64| -yaw * x.abs().max(daily_minimum);
    if !r.is_finite() {
        return if yaw * r > 0.0 { 0.0 } else { 2.0 * r };
    }
    match policy {
        PprPolicy::Legacy => {
            if r == 0.0 {
                -yaw * daily_minimum
            } else if yaw * r > 0.0 {
                0.0
            } else {
                2.0 * r
            }
        }
        PprPolicy::FloorMagnitude => {
            if r == 0.0 {
                -yaw * daily_minimum
            } else if yaw * r > 0.0 {
                0.0
            } else {
                floored(2.0 * r)
            }
        }
        PprPolicy::ClampWrongDirection => {
            if r == 0.0 || yaw * r > 0.0 {
                -yaw * daily_minimum
            } else {
                floored(2.0 * r)
            }
        }
    }
}

/// One row of a dtd table: on the node at `t`, values from `y0` to `y1` map linearly onto
/// days-to-derail `d0` to `d1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DtdRow {
    pub t: UnixTime,
    pub y0: f64,
    pub d0: f64,
    pub y1: f64,
    pub d1: f64,
}

/// Goal quantities the derailment computations depend on.
#[derive(Debug, Clone)]
pub struct DerailContext {
    pub yaw: f64,
    pub dir: f64,
    pub asof: UnixTime,
    pub tini: UnixTime,
    pub tfin: UnixTime,
    /// Whether a PPR is shown for today.
    pub ppr_enabled: bool,
    /// Day of the most recent datapoint.
    pub tdat: UnixTime,
    pub policy: PprPolicy,
    pub daily_minimum: f64,
    pub fix_doless_isolines: bool,
    /// Step interpolation of the past data.
    pub dtf: StepFunction,
}

impl DerailContext {
    /// Do-less goals want the value to move toward the wrong side (`yaw * dir < 0`).
    pub fn is_do_less(&self) -> bool {
        self.yaw * self.dir < 0.0
    }

    /// PPR for the day `t`, using the road rate at `t`.
    ///
    /// For today (`t <= asof`) the PPR is suppressed when PPRs are disabled or when a
    /// datapoint was already entered today. Future days always get one.
    pub fn ppr(&self, road: &Road, t: UnixTime) -> f64 {
        self.ppr_with(road, t, None, false)
    }

    /// PPR using the rate of road segment `i`; `past` lifts the suppression for today.
    pub fn ppr_for_segment(&self, road: &Road, i: usize, past: bool) -> f64 {
        self.ppr_with(road, 0.0, Some(i), past)
    }

    fn ppr_with(&self, road: &Road, t: UnixTime, segment: Option<usize>, past: bool) -> f64 {
        if self.yaw * self.dir >= 0.0 {
            return 0.0;
        }
        if !past && t <= self.asof && (!self.ppr_enabled || self.tdat == self.asof) {
            return 0.0;
        }
        let slope = match segment.and_then(|i| road.segments().get(i)) {
            Some(seg) => seg.slope,
            None => road.slope_at(t),
        };
        ppr_rate(self.policy, self.daily_minimum, self.yaw, slope * SID)
    }

    /// Signed distance to the road, positive on the good side.
    pub fn gdelt(&self, road: &Road, t: UnixTime, v: f64) -> f64 {
        chop(self.yaw * (v - road.value_at(t)))
    }

    /// Whether `(t, v)` is on the road or on its good side.
    pub fn aok(&self, road: &Road, t: UnixTime, v: f64) -> bool {
        self.yaw * (v - road.value_at(t)) >= v.abs() * -1e-15
    }

    /// Color of a datapoint; without isolines only red and black are possible.
    pub fn dotcolor(&self, road: &Road, t: UnixTime, v: f64, isolines: Option<&[Isoline]>) -> DotColor {
        if t < self.tini {
            return DotColor::Black;
        }
        match isolines {
            None if self.aok(road, t, v) => DotColor::Black,
            None => DotColor::Red,
            Some(iso) => classify_zone(iso, t, v, self.yaw),
        }
    }

    /// Whether the data was on the wrong side of the road the day before `t`.
    pub fn red_yesterday(&self, road: &Road, t: UnixTime) -> bool {
        let y = t - SID;
        self.dotcolor(road, y, self.dtf.value_at(y), None) == DotColor::Red
    }

    /// Days until a pessimistic projection from `(t, v)` leaves the good side of the road.
    ///
    /// Arguments
    /// ---------
    /// * `road`: the goal's road
    /// * `t`, `v`: starting point, usually the current one
    ///
    /// Return
    /// ----------
    /// * the number of whole days walked, 0 when the goal was already red yesterday. The
    ///   walk stops at the goal date.
    pub fn days_to_derail(&self, road: &Road, t: UnixTime, v: f64) -> i64 {
        if self.red_yesterday(road, t) {
            return 0;
        }
        let horizon = self.tfin.max(t);
        let mut x = 0i64;
        let mut vpess = v + self.ppr(road, t);
        while self.aok(road, t + x as f64 * SID, vpess) && t + x as f64 * SID <= horizon {
            x += 1;
            vpess += self.ppr(road, t + x as f64 * SID);
        }
        x
    }

    /// Days-to-derail lookup tables for every road node, last node first.
    ///
    /// The entry for the last node has a single row. Each earlier node gets a row for
    /// derailing on its own segment, followed by the rows of the next node pushed back by one
    /// segment: shifted by the segment's PPR delta, or carried over a vertical jump.
    ///
    /// See also
    /// ------------
    /// * [`crate::isoline::generate`] – turns these tables into contours
    pub fn build_dtd_table(&self, road: &Road) -> Vec<Vec<DtdRow>> {
        let segs = road.segments();
        let Some(last) = segs.last() else {
            return Vec::new();
        };
        let doless_mult = if self.fix_doless_isolines { 0.0 } else { 2.0 };

        let ppr = self.ppr_for_segment(road, segs.len() - 1, false);
        let mut table = vec![vec![DtdRow {
            t: last.start.t,
            y0: last.start.v,
            d0: 0.0,
            y1: last.start.v - ppr,
            d1: 1.0,
        }]];

        for (i, seg) in segs.iter().enumerate().rev().skip(1) {
            let (xcur, ycur) = (seg.start.t, seg.start.v);
            let (xn, yn) = (seg.end.t, seg.end.v);
            let ppr = self.ppr_for_segment(road, i, true);
            let days = (xn - xcur) / SID;
            let jump_with_dir = self.dir * (ycur - yn) > 0.0;

            let first = if !ppr.is_finite() {
                let y1 = if jump_with_dir {
                    yn
                } else {
                    yn - doless_mult * (yn - ycur)
                };
                DtdRow { t: xcur, y0: ycur, d0: 0.0, y1, d1: days }
            } else {
                DtdRow { t: xcur, y0: ycur, d0: 0.0, y1: yn - ppr * days, d1: days }
            };

            let mut rows = Vec::with_capacity(table.len() + 1);
            rows.push(first);
            let prev = &table[table.len() - 1];
            rows.extend(prev.iter().map(|r| {
                if ppr.is_finite() {
                    DtdRow {
                        t: xcur,
                        y0: r.y0 - ppr * days,
                        d0: r.d0 + days,
                        y1: r.y1 - ppr * days,
                        d1: r.d1 + days,
                    }
                } else if jump_with_dir {
                    DtdRow { t: xcur, ..*r }
                } else {
                    // vertical segments have zero length in time, the offsets stay as is
                    let dy = doless_mult * (yn - ycur);
                    DtdRow {
                        t: xcur,
                        y0: r.y0 - dy,
                        d0: r.d0 + (xn - xcur),
                        y1: r.y1 - dy,
                        d1: r.d1 + (xn - xcur),
                    }
                }
            }));
            table.push(rows);
        }
        table
    }
}

/// 90% quantile of the daily data deltas once the road's own delta is removed.
///
/// Return
/// ----------
/// * 0 for fewer than two points, the only delta for exactly two
pub fn stdflux(road: &Road, points: &[Point]) -> Result<f64, BrainError> {
    if points.len() <= 1 {
        return Ok(0.0);
    }
    let adjusted: Vec<f64> = points
        .windows(2)
        .map(|w| {
            let (a, b) = (w[0], w[1]);
            (b.v - a.v - road.value_at(b.t) + road.value_at(a.t)).abs() / (b.t - a.t) * SID
        })
        .collect();
    let flux = if adjusted.len() == 1 {
        adjusted[0]
    } else {
        quantile(&adjusted, 0.9, 1, false)?
    };
    Ok(chop(flux))
}

/// Road value `n` days after `tcur`.
pub fn lim(road: &Road, tcur: UnixTime, n: usize) -> f64 {
    road.value_at(tcur + n as f64 * SID)
}

/// What is needed from `vcur` to reach the road `n` days after `tcur`.
pub fn limd(road: &Road, tcur: UnixTime, vcur: f64, n: usize) -> f64 {
    lim(road, tcur, n) - vcur
}

/// One day of the "due by" table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuebyRow {
    pub day: Daystamp,
    /// Minimum delta from the current value.
    pub delta: f64,
    /// Minimum absolute value.
    pub value: f64,
}

/// Amounts due over the next `n` days, made monotone in the goal direction.
pub fn dueby(road: &Road, tcur: UnixTime, vcur: f64, dir: f64, n: usize) -> Vec<DuebyRow> {
    let deltas: Vec<f64> = (0..n).map(|i| limd(road, tcur, vcur, i)).collect();
    let values: Vec<f64> = (0..n).map(|i| lim(road, tcur, i)).collect();
    let dir = dir as i64;
    monotonize(&deltas, dir)
        .into_iter()
        .zip(monotonize(&values, dir))
        .enumerate()
        .map(|(i, (delta, value))| DuebyRow {
            day: dayify(tcur + i as f64 * SID),
            delta,
            value,
        })
        .collect()
}

#[cfg(test)]
mod derail_test {
    use super::*;
    use crate::road::matrix::RoadRow;
    use crate::road::road_test::{kinked_road, T0};
    use approx::assert_relative_eq;

    fn context(yaw: f64, dir: f64) -> DerailContext {
        DerailContext {
            yaw,
            dir,
            asof: T0,
            tini: T0,
            tfin: T0 + 30.0 * SID,
            ppr_enabled: true,
            tdat: T0 - SID,
            policy: PprPolicy::Legacy,
            daily_minimum: 2.0,
            fix_doless_isolines: false,
            dtf: StepFunction::new(vec![Point::new(T0, 0.0)]),
        }
    }

    fn ramp() -> Road {
        let rows = [RoadRow::new(Some(T0 + 30.0 * SID), None, Some(1.0))];
        Road::from_rows(&rows, T0, 0.0, SID)
    }

    #[test]
    fn test_ppr_policies() {
        use PprPolicy::*;
        assert_eq!(ppr_rate(Legacy, 2.0, -1.0, 0.0), 2.0);
        assert_eq!(ppr_rate(Legacy, 2.0, -1.0, -3.0), 0.0);
        assert_eq!(ppr_rate(Legacy, 2.0, -1.0, 0.25), 0.5);
        assert_eq!(ppr_rate(FloorMagnitude, 2.0, -1.0, 0.25), 2.0);
        assert_eq!(ppr_rate(FloorMagnitude, 2.0, -1.0, 3.0), 6.0);
        assert_eq!(ppr_rate(FloorMagnitude, 2.0, -1.0, -3.0), 0.0);
        assert_eq!(ppr_rate(ClampWrongDirection, 2.0, -1.0, -3.0), 2.0);
        assert_eq!(ppr_rate(ClampWrongDirection, 2.0, 1.0, 0.0), -2.0);
        for policy in [Legacy, FloorMagnitude, ClampWrongDirection] {
            assert_eq!(ppr_rate(policy, 2.0, -1.0, f64::INFINITY), f64::INFINITY);
            assert_eq!(ppr_rate(policy, 2.0, -1.0, f64::NEG_INFINITY), 0.0);
        }
        assert_eq!("clamp".parse::<PprPolicy>().unwrap(), ClampWrongDirection);
        assert!("bogus".parse::<PprPolicy>().is_err());
    }

    #[test]
    fn test_ppr_today_and_future() {
        let road = ramp();
        let ctx = context(-1.0, 1.0);
        assert_relative_eq!(ctx.ppr(&road, T0), 2.0, epsilon = 1e-9);
        let entered_today = DerailContext { tdat: T0, ..context(-1.0, 1.0) };
        assert_eq!(entered_today.ppr(&road, T0), 0.0);
        assert_relative_eq!(entered_today.ppr(&road, T0 + SID), 2.0, epsilon = 1e-9);
        let disabled = DerailContext { ppr_enabled: false, ..context(-1.0, 1.0) };
        assert_eq!(disabled.ppr(&road, T0), 0.0);
        assert_relative_eq!(disabled.ppr_for_segment(&road, 1, true), 2.0, epsilon = 1e-9);
        // do-more goals never get one
        assert_eq!(context(1.0, 1.0).ppr(&road, T0 + SID), 0.0);
    }

    #[test]
    fn test_days_to_derail_do_more() {
        let road = kinked_road();
        let ctx = context(1.0, 1.0);
        assert_eq!(ctx.days_to_derail(&road, T0 + 5.0 * SID, 0.0), 6);
        assert!(ctx.aok(&road, T0 + 5.0 * SID, 0.0));
        assert_relative_eq!(ctx.gdelt(&road, T0 + 15.0 * SID, 7.0), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_days_to_derail_do_less() {
        let road = ramp();
        let ctx = context(-1.0, 1.0);
        assert_eq!(ctx.days_to_derail(&road, T0, -4.5), 3);
        let entered_today = DerailContext { tdat: T0, ..context(-1.0, 1.0) };
        assert_eq!(entered_today.days_to_derail(&road, T0, -4.5), 5);
    }

    #[test]
    fn test_red_yesterday_short_circuits() {
        let road = kinked_road();
        let ctx = DerailContext {
            dtf: StepFunction::new(vec![Point::new(T0 + 12.0 * SID, 0.0)]),
            ..context(1.0, 1.0)
        };
        assert!(ctx.red_yesterday(&road, T0 + 14.0 * SID));
        assert_eq!(ctx.days_to_derail(&road, T0 + 14.0 * SID, 100.0), 0);
        assert_eq!(ctx.dotcolor(&road, T0 - SID, -50.0, None), DotColor::Black);
    }

    #[test]
    fn test_dtd_table_shape() {
        let road = kinked_road();
        let table = context(1.0, 1.0).build_dtd_table(&road);
        assert_eq!(table.len(), road.len());
        for (i, rows) in table.iter().enumerate() {
            assert_eq!(rows.len(), i + 1);
            assert_eq!(rows[0].d0, 0.0);
        }
        let flat_tail = &table[1];
        assert_eq!(flat_tail[0].t, T0 + 20.0 * SID);
        assert_relative_eq!(flat_tail[0].d1, 10.0);
        assert_relative_eq!(flat_tail[1].d0, 10.0);
        assert_relative_eq!(flat_tail[1].d1, 11.0);
    }

    #[test]
    fn test_stdflux() {
        let road = kinked_road();
        let on_road = [
            Point::new(T0 + 11.0 * SID, 1.0),
            Point::new(T0 + 12.0 * SID, 2.0),
        ];
        assert_relative_eq!(stdflux(&road, &on_road).unwrap(), 0.0);
        let jumpy = [
            Point::new(T0, 0.0),
            Point::new(T0 + SID, 3.0),
            Point::new(T0 + 2.0 * SID, 3.0),
        ];
        assert_relative_eq!(stdflux(&road, &jumpy).unwrap(), 3.0);
        assert_eq!(stdflux(&road, &jumpy[..1]).unwrap(), 0.0);
    }

    #[test]
    fn test_dueby() {
        let road = kinked_road();
        let rows = dueby(&road, T0 + 9.0 * SID, 0.5, 1.0, 7);
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].day, "20240209");
        assert_relative_eq!(rows[0].delta, -0.5);
        assert_relative_eq!(rows[3].value, 2.0, epsilon = 1e-9);
        assert!(rows.windows(2).all(|w| w[0].value <= w[1].value));
    }
}
