//! # Isolines
//!
//! An isoline is a contour of constant days-to-derail. Isoline 0 is the road itself; isoline
//! `k` bounds the region from which the goal survives `k` more days without data.
//!
//! ## Pipeline
//!
//! Every contour is produced in four stages from the dtd tables of
//! [`DerailContext::build_dtd_table`]:
//!
//! 1. [`generate`]: interpolate the target value inside each table.
//! 2. [`monotonicity`] for do-more goals, [`clip_doless`] for do-less goals.
//! 3. [`nobackward`]: drop points that go back in time.
//! 4. [`clip_to_road`]: keep the contour on the good side of the road.
//!
//! [`isoline_stages`] exposes the output of each stage, [`isoline`] only the final one.
//! [`value_on`], [`side_of`] and [`classify_zone`] query finished contours.
use serde::Serialize;

use crate::brain_errors::BrainError;
use crate::constants::{Isoline, Point, UnixTime, SID};
use crate::derail::{DerailContext, DtdRow};
use crate::num_core::search_low;
use crate::road::Road;
use crate::time::format_date;

/// Safety zone of a datapoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DotColor {
    /// Before the road starts, or on the good side when no isolines are available.
    Black,
    /// 0 safe days.
    Red,
    /// 1 safe day.
    Orange,
    /// 2 safe days.
    Blue,
    /// 3 to 6 safe days.
    Green,
    /// 7 or more safe days.
    Gray,
    /// Not enough isolines to tell.
    Error,
}

impl DotColor {
    pub fn name(&self) -> &'static str {
        match self {
            DotColor::Black => "black",
            DotColor::Red => "red",
            DotColor::Orange => "orange",
            DotColor::Blue => "blue",
            DotColor::Green => "green",
            DotColor::Gray => "gray",
            DotColor::Error => "error",
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            DotColor::Black => "#000000",
            DotColor::Red => "#ff0000",
            DotColor::Orange => "#ffa500",
            DotColor::Blue => "#3f3fff",
            DotColor::Green => "#00aa00",
            DotColor::Gray => "#f0f0f0",
            DotColor::Error => "#000000",
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Geometry helpers
// -------------------------------------------------------------------------------------------------

/// Value at `t` of the line through `s` and `e`.
fn lineval(s: Point, e: Point, t: UnixTime) -> f64 {
    let slope = (e.v - s.v) / (e.t - s.t);
    s.v + slope * (t - s.t)
}

/// Intersection of segments `s1-e1` and `s2-e2`, `None` when they are parallel or miss.
fn intersect(s1: Point, e1: Point, s2: Point, e2: Point) -> Option<Point> {
    let (a, c) = (e1.t - s1.t, e1.v - s1.v);
    let (b, d) = (-(e2.t - s2.t), -(e2.v - s2.v));
    let (e, f) = (s2.t - s1.t, s2.v - s1.v);
    let det = a * d - b * c;
    if det == 0.0 {
        return None;
    }
    let a1 = (d * e - b * f) / det;
    let a2 = (-c * e + a * f) / det;
    if !(0.0..=1.0).contains(&a1) || !(0.0..=1.0).contains(&a2) {
        return None;
    }
    Some(Point::new(s1.t + a1 * a, s1.v + a1 * c))
}

// -------------------------------------------------------------------------------------------------
// Stage 1: generation
// -------------------------------------------------------------------------------------------------

fn push_unique(iso: &mut Isoline, p: Point) {
    match iso.last() {
        Some(last) if last.t == p.t && last.v == p.v => {}
        _ => iso.push(p),
    }
}

/// Point of the row pair `st -> en` where the dtd reaches `v`.
fn row_point(st: (UnixTime, f64, f64), en: (UnixTime, f64, f64), v: f64) -> Point {
    if en.2 - st.2 == 0.0 {
        return Point::new(st.0, st.1);
    }
    let sl = (v - st.2) / (en.2 - st.2);
    Point::new(st.0 + sl * (en.0 - st.0), st.1 + sl * (en.1 - st.1))
}

/// Raw contour for days-to-derail `v`.
///
/// Walks the dtd tables from the last road node back to the first one, locating on each node
/// the table row containing `v` and adding the crossing points of every row passed on the way.
/// The contour starts with a flat piece ten days past the last node.
///
/// Return
/// ----------
/// * the contour in increasing time order, possibly with backward steps that later stages
///   remove
pub fn generate(table: &[Vec<DtdRow>], v: f64) -> Isoline {
    let Some(first) = table.first().and_then(|rows| rows.first()) else {
        return Vec::new();
    };
    let y = first.y0 + v * (first.y1 - first.y0);
    let mut iso = vec![Point::new(first.t + 10.0 * SID, y), Point::new(first.t, y)];

    let mut n = &table[0];
    let mut s = 0usize;
    for nn in &table[1..] {
        let ns = nn.iter().position(|r| v <= r.d1).unwrap_or(nn.len() - 1);
        for k in (ns..=s).rev() {
            let st = (n[k].t, n[k].y0, n[k].d0);
            let en = (nn[k].t, nn[k].y1, nn[k].d1);
            push_unique(&mut iso, row_point(st, en, v));
        }
        let row = nn[ns];
        push_unique(
            &mut iso,
            row_point((row.t, row.y0, row.d0), (row.t, row.y1, row.d1), v),
        );
        s = ns;
        n = nn;
    }
    iso.reverse();
    iso
}

// -------------------------------------------------------------------------------------------------
// Stage 2: repair
// -------------------------------------------------------------------------------------------------

/// Keep a do-more contour from moving against the goal direction for `v` days after a kink.
///
/// Each new downward streak is replaced by a plateau lasting `v` days or ending earlier where
/// the contour comes back up to the plateau level.
pub fn monotonicity(iso: &[Point], v: f64, dir: f64) -> Isoline {
    let mut out = Vec::with_capacity(iso.len());
    let mut downstreak = false;

    for j in 0..iso.len().saturating_sub(1) {
        let (a, b) = (iso[j], iso[j + 1]);
        if (b.v - a.v) * dir > 0.0 {
            downstreak = false;
        }
        out.push(a);

        if v == 0.0 || (b.v - a.v) * dir >= 0.0 || downstreak {
            continue;
        }
        downstreak = true;
        let limit = a.t + v * SID;
        let mut k = j + 1;
        loop {
            let cur = iso[k];
            if cur.t >= limit {
                out.push(Point::new(limit, a.v));
                break;
            }
            let Some(&next) = iso.get(k + 1) else {
                out.push(Point::new(limit, a.v));
                break;
            };
            if (next.v - cur.v) * dir >= 0.0 {
                if next.t != cur.t {
                    let slope = (next.v - cur.v) / (next.t - cur.t);
                    if slope != 0.0 {
                        let x = cur.t + (a.v - cur.v) / slope;
                        if x <= limit && x <= next.t {
                            out.push(Point::new(x, a.v));
                            break;
                        }
                    }
                } else if (a.v - cur.v) * (a.v - next.v) < 0.0 {
                    // crossing a jump, the extra second is removed by `nobackward`
                    out.push(Point::new(cur.t + 1.0, a.v));
                    break;
                }
            }
            k += 1;
        }
    }
    out
}

/// Clip a do-less contour with the PPR path after each of its upward jumps.
///
/// Only active when `fix_doless_isolines` is set and `v != 0`. From every jump the contour is
/// replaced by the PPR trajectory of the road until either `v` days have passed or the contour
/// falls back below that trajectory.
///
/// Return
/// ----------
/// * the clipped contour
/// * [`BrainError::ComputationError`] when a jump sits on a vertical road segment or the PPR
///   path runs past the end of the road
pub fn clip_doless(
    iso: &[Point],
    road: &Road,
    ctx: &DerailContext,
    v: f64,
) -> Result<Isoline, BrainError> {
    if !ctx.fix_doless_isolines || v == 0.0 {
        return Ok(iso.to_vec());
    }
    let segs = road.segments();
    let ppr_line = |st: Point, i: usize| -> (Point, Point) {
        let end_t = segs[i].end.t;
        let ppr = ctx.ppr_for_segment(road, i, true);
        (st, Point::new(end_t, st.v + ppr * (end_t - st.t) / SID))
    };
    let next_segment = |i: usize| -> Result<usize, BrainError> {
        (i + 1..segs.len())
            .find(|&k| segs[k].slope.is_finite())
            .ok_or_else(|| {
                BrainError::ComputationError(
                    "PPR path of a do-less isoline ran past the end of the road".into(),
                )
            })
    };

    let mut out = Vec::with_capacity(iso.len());
    let (mut clipping, mut on_ppr) = (false, false);
    let mut endday = 0.0;
    let mut seg_idx = 0usize;
    let mut line = (Point::new(0.0, 0.0), Point::new(0.0, 0.0));

    let mut j = 0usize;
    while j + 1 < iso.len() {
        if !on_ppr {
            out.push(iso[j]);
        }
        let (a, b) = (iso[j], iso[j + 1]);

        if b.t == a.t && (b.v - a.v) * ctx.dir > 0.0 {
            clipping = true;
            on_ppr = true;
            endday = b.t + v * SID;
            seg_idx = road.find_segment(a.t);
            if !segs[seg_idx].slope.is_finite() {
                return Err(BrainError::ComputationError(format!(
                    "isoline jump at {} lies on a vertical road segment",
                    format_date(a.t)
                )));
            }
            line = ppr_line(a, seg_idx);
            while j + 1 < iso.len() && iso[j + 1].t == iso[j].t {
                j += 1;
            }
            continue;
        }

        if clipping {
            if a.t >= endday || line.0.t >= endday {
                out.push(Point::new(endday, value_on(iso, endday).unwrap_or(a.v)));
                clipping = false;
                on_ppr = false;
                j += 1;
                continue;
            }
            if on_ppr {
                if let Some(p) = intersect(a, b, line.0, line.1) {
                    out.push(p);
                    on_ppr = false;
                } else if line.1.t <= b.t {
                    out.push(line.1);
                    seg_idx = next_segment(seg_idx)?;
                    line = ppr_line(line.1, seg_idx);
                    continue;
                }
            } else if a.t > line.1.t {
                seg_idx = next_segment(seg_idx)?;
                line = ppr_line(line.1, seg_idx);
                continue;
            }
        }
        j += 1;
    }
    Ok(out)
}

// -------------------------------------------------------------------------------------------------
// Stages 3 and 4
// -------------------------------------------------------------------------------------------------

/// Drop points earlier than the latest kept point, interpolating where the contour comes
/// back past it.
pub fn nobackward(iso: &[Point]) -> Isoline {
    let Some(&first) = iso.first() else {
        return Vec::new();
    };
    let mut out = vec![first];
    for w in iso.windows(2) {
        let (prev, cur) = (w[0], w[1]);
        let last = out[out.len() - 1];
        if cur.t < last.t {
            continue;
        }
        if prev.t < last.t && cur.t > last.t {
            let slope = (cur.v - prev.v) / (cur.t - prev.t);
            out.push(Point::new(last.t, prev.v + slope * (last.t - prev.t)));
        }
        out.push(cur);
    }
    out
}

/// Move `pt` onto the road when it lies on the wrong side.
///
/// On a jump, `side == -1` compares against the jump end closest to the wrong side and
/// `side == 1` against the one closest to the good side.
fn clip_point(road: &Road, yaw: f64, pt: Point, side: f64) -> Point {
    let segs = road.segments();
    let mut i = road.find_segment(pt.t);
    let mut rdy = segs.get(i).map_or(f64::NAN, |s| s.value_at(pt.t));
    while i > 0 {
        i -= 1;
        if segs[i].start.t != pt.t {
            break;
        }
        rdy = if -side * yaw > 0.0 {
            rdy.min(segs[i].start.v)
        } else {
            rdy.max(segs[i].start.v)
        };
    }
    if (pt.v - rdy) * yaw < 0.0 {
        Point::new(pt.t, rdy)
    } else {
        pt
    }
}

fn push_forward(out: &mut Isoline, p: Point) {
    match out.last() {
        Some(last) => out.push(Point::new(p.t.max(last.t), p.v)),
        None => out.push(p),
    }
}

/// Keep the contour on the good side of the road.
///
/// Road and contour segments are walked in lockstep. Crossings become contour points, road
/// kinks under the contour are added so it cannot leak past them, and contour vertices are
/// clipped onto the road.
pub fn clip_to_road(iso: &[Point], road: &Road, yaw: f64) -> Isoline {
    let side_at = |i: usize| {
        if i + 1 < iso.len() && iso[i].t != iso[i + 1].t {
            1.0
        } else {
            -1.0
        }
    };
    let Some(&first) = iso.first() else {
        return Vec::new();
    };
    let segs = road.segments();
    let mut out = vec![clip_point(road, yaw, first, side_at(0))];
    let (mut ri, mut ii) = (0usize, 0usize);

    while ri < segs.len() && ii + 1 < iso.len() {
        let seg = segs[ri];
        let (a, b) = (iso[ii], iso[ii + 1]);
        if let Some(p) = intersect(seg.start, seg.end, a, b) {
            let last = out[out.len() - 1];
            if p.t != last.t || p.v != last.v {
                push_forward(&mut out, Point::new(p.t.min(b.t), p.v));
            }
        }
        if seg.end.t < b.t {
            if (lineval(a, b, seg.end.t) - seg.end.v) * yaw < 0.0 {
                push_forward(&mut out, seg.end);
            }
            ri += 1;
        } else {
            ii += 1;
            let clipped = clip_point(road, yaw, iso[ii], side_at(ii));
            push_forward(&mut out, clipped);
        }
    }
    out
}

// -------------------------------------------------------------------------------------------------
// Pipeline and queries
// -------------------------------------------------------------------------------------------------

/// Output of every stage of the pipeline for one contour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsolineStages {
    pub generated: Isoline,
    pub repaired: Isoline,
    pub forward: Isoline,
    pub clipped: Isoline,
}

/// Run the four stages for days-to-derail `v`, keeping every intermediate contour.
pub fn isoline_stages(
    road: &Road,
    table: &[Vec<DtdRow>],
    ctx: &DerailContext,
    v: f64,
) -> Result<IsolineStages, BrainError> {
    let generated = generate(table, v);
    let repaired = if ctx.is_do_less() {
        clip_doless(&generated, road, ctx, v)?
    } else {
        monotonicity(&generated, v, ctx.dir)
    };
    let forward = nobackward(&repaired);
    let clipped = clip_to_road(&forward, road, ctx.yaw);
    Ok(IsolineStages {
        generated,
        repaired,
        forward,
        clipped,
    })
}

/// Contour of days-to-derail `v`.
pub fn isoline(
    road: &Road,
    table: &[Vec<DtdRow>],
    ctx: &DerailContext,
    v: f64,
) -> Result<Isoline, BrainError> {
    Ok(isoline_stages(road, table, ctx, v)?.clipped)
}

/// Contour value at `t`, flat beyond both ends; `None` for an empty contour.
pub fn value_on(iso: &[Point], t: UnixTime) -> Option<f64> {
    let (first, last) = (iso.first()?, iso.last()?);
    if t <= first.t {
        return Some(first.v);
    }
    if t >= last.t {
        return Some(last.v);
    }
    let i = search_low(iso, |p| if p.t <= t { -1.0 } else { 1.0 }).max(0) as usize;
    let (a, b) = (iso[i], iso[i + 1]);
    Some(a.v + (b.v - a.v) * (t - a.t) / (b.t - a.t))
}

/// `1` when `(t, v)` is on the contour or on its good side, `-1` otherwise, `0` for an empty
/// contour.
pub fn side_of(iso: &[Point], t: UnixTime, v: f64, yaw: f64) -> i8 {
    match value_on(iso, t) {
        None => 0,
        Some(iv) if (v - iv) * yaw >= v.abs() * -1e-15 => 1,
        Some(_) => -1,
    }
}

/// Safety zone of `(t, v)` against isolines 0, 1, 2 and 6.
pub fn classify_zone(isolines: &[Isoline], t: UnixTime, v: f64, yaw: f64) -> DotColor {
    if isolines.len() < 7 {
        return DotColor::Error;
    }
    let zones = [
        (0, DotColor::Red),
        (1, DotColor::Orange),
        (2, DotColor::Blue),
        (6, DotColor::Green),
    ];
    zones
        .iter()
        .find(|(k, _)| side_of(&isolines[*k], t, v, yaw) < 0)
        .map_or(DotColor::Gray, |(_, color)| *color)
}

#[cfg(test)]
mod isoline_test {
    use super::*;
    use crate::aggregator::StepFunction;
    use crate::derail::PprPolicy;
    use crate::road::road_test::{kinked_road, T0};
    use crate::road::{AutoField, RoadSegment};
    use approx::assert_relative_eq;

    fn context(yaw: f64, dir: f64, fix_doless_isolines: bool) -> DerailContext {
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
            fix_doless_isolines,
            dtf: StepFunction::new(vec![Point::new(T0, 0.0)]),
        }
    }

    fn all_isolines(ctx: &DerailContext) -> Vec<Isoline> {
        let road = kinked_road();
        let table = ctx.build_dtd_table(&road);
        (0..7)
            .map(|k| isoline(&road, &table, ctx, k as f64).unwrap())
            .collect()
    }

    /// Segment between two `(day, value)` pairs.
    fn segment(start: (f64, f64), end: (f64, f64)) -> RoadSegment {
        let (s, e) = (
            Point::new(start.0 * SID, start.1),
            Point::new(end.0 * SID, end.1),
        );
        RoadSegment {
            start: s,
            end: e,
            slope: (e.v - s.v) / (e.t - s.t),
            auto: AutoField::Slope,
        }
    }

    fn days(points: &[(f64, f64)]) -> Isoline {
        points.iter().map(|&(d, v)| Point::new(d * SID, v)).collect()
    }

    fn assert_points(actual: &[Point], expected: &[Point]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert_relative_eq!(a.t, e.t, epsilon = 1e-6);
            assert_relative_eq!(a.v, e.v, epsilon = 1e-9);
        }
    }

    fn assert_forward(iso: &[Point]) {
        assert!(
            iso.windows(2).all(|w| w[0].t <= w[1].t),
            "isoline goes back in time: {iso:?}"
        );
    }

    #[test]
    fn test_isoline_zero_follows_road() {
        let isolines = all_isolines(&context(1.0, 1.0, false));
        let road = kinked_road();
        for t in [5.0, 12.0, 15.0, 25.0] {
            let t = T0 + t * SID;
            assert_relative_eq!(
                value_on(&isolines[0], t).unwrap(),
                road.value_at(t),
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn test_isoline_one_day_ahead_on_ramp() {
        let isolines = all_isolines(&context(1.0, 1.0, false));
        assert_relative_eq!(
            value_on(&isolines[1], T0 + 15.0 * SID).unwrap(),
            6.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_isolines_never_go_backward() {
        for (yaw, dir, fix) in [
            (1.0, 1.0, false),
            (-1.0, 1.0, false),
            (-1.0, 1.0, true),
            (1.0, -1.0, false),
        ] {
            for iso in all_isolines(&context(yaw, dir, fix)) {
                assert!(!iso.is_empty());
                assert_forward(&iso);
            }
        }
    }

    #[test]
    fn test_stages_are_exposed() {
        let road = kinked_road();
        let ctx = context(1.0, 1.0, false);
        let table = ctx.build_dtd_table(&road);
        let stages = isoline_stages(&road, &table, &ctx, 2.0).unwrap();
        assert_eq!(stages.generated.len(), stages.repaired.len() + 1);
        assert_forward(&stages.forward);
        assert_eq!(stages.clipped, isoline(&road, &table, &ctx, 2.0).unwrap());
    }

    #[test]
    fn test_monotonicity_plateau() {
        let iso = vec![
            Point::new(0.0, 0.0),
            Point::new(SID, 5.0),
            Point::new(2.0 * SID, 2.0),
            Point::new(10.0 * SID, 6.0),
            Point::new(11.0 * SID, 6.0),
        ];
        let out = monotonicity(&iso, 3.0, 1.0);
        // the dip after day 1 becomes a plateau at 5 for three days
        assert_eq!(out[2], Point::new(4.0 * SID, 5.0));
        assert_eq!(out.len(), 5);
        let flat = monotonicity(&iso, 0.0, 1.0);
        assert_eq!(flat, iso[..4].to_vec());
    }

    #[test]
    fn test_nobackward() {
        let iso = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(2.0, 4.0),
            Point::new(6.0, 8.0),
        ];
        let out = nobackward(&iso);
        assert_eq!(
            out,
            vec![
                Point::new(0.0, 0.0),
                Point::new(4.0, 4.0),
                Point::new(4.0, 6.0),
                Point::new(6.0, 8.0)
            ]
        );
        assert!(nobackward(&[]).is_empty());
    }

    #[test]
    fn test_clip_doless_follows_ppr_after_jump() {
        // flat road, ppr of 2 per day on both segments
        let road = Road::new(vec![
            segment((0.0, 0.0), (4.0, 0.0)),
            segment((4.0, 0.0), (30.0, 0.0)),
        ]);
        let ctx = context(-1.0, 1.0, true);
        let iso = days(&[
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 10.0),
            (6.0, 10.0),
            (12.0, 10.0),
            (20.0, 10.0),
        ]);
        let out = clip_doless(&iso, &road, &ctx, 6.0).unwrap();
        // ppr path from day 2 to the kink at day 4, then up to the contour at day 7; the
        // end-of-window point at day 8 comes after day 12 and is left to `nobackward`
        assert_points(
            &out,
            &days(&[
                (0.0, 0.0),
                (2.0, 0.0),
                (4.0, 4.0),
                (7.0, 10.0),
                (12.0, 10.0),
                (8.0, 10.0),
            ]),
        );

        // untouched without the fix or for the road itself
        assert_eq!(clip_doless(&iso, &road, &context(-1.0, 1.0, false), 6.0).unwrap(), iso);
        assert_eq!(clip_doless(&iso, &road, &ctx, 0.0).unwrap(), iso);
    }

    #[test]
    fn test_clip_doless_jump_on_vertical_segment() {
        let jump = segment((10.0, 0.0), (10.0, 5.0));
        assert!(jump.slope.is_infinite());
        let road = Road::new(vec![segment((0.0, 0.0), (10.0, 0.0)), jump]);
        let iso = days(&[(0.0, 0.0), (10.0, 0.0), (10.0, 3.0), (12.0, 3.0)]);
        let err = clip_doless(&iso, &road, &context(-1.0, 1.0, true), 2.0).unwrap_err();
        assert!(matches!(err, BrainError::ComputationError(_)));
        assert!(err.to_string().contains("vertical road segment"));
    }

    #[test]
    fn test_clip_doless_runs_past_road_end() {
        let road = Road::new(vec![segment((0.0, 0.0), (10.0, 0.0))]);
        // the contour stays above the ppr path until the only segment runs out
        let iso = days(&[(0.0, 0.0), (2.0, 0.0), (2.0, 50.0), (20.0, 50.0)]);
        let err = clip_doless(&iso, &road, &context(-1.0, 1.0, true), 20.0).unwrap_err();
        assert_eq!(
            err,
            BrainError::ComputationError(
                "PPR path of a do-less isoline ran past the end of the road".into()
            )
        );
    }

    #[test]
    fn test_clip_to_road_adds_crossings_and_kinks() {
        let road = Road::new(vec![
            segment((0.0, 0.0), (10.0, 0.0)),
            segment((10.0, 0.0), (20.0, 10.0)),
            segment((20.0, 10.0), (30.0, 10.0)),
        ]);
        let iso = days(&[(0.0, 5.0), (30.0, 5.0)]);
        // crossing at day 15, road kink at day 20, end vertex moved onto the road
        assert_points(
            &clip_to_road(&iso, &road, 1.0),
            &days(&[(0.0, 5.0), (15.0, 5.0), (20.0, 10.0), (30.0, 10.0)]),
        );

        let above = days(&[(0.0, 20.0), (30.0, 20.0)]);
        assert_eq!(clip_to_road(&above, &road, 1.0), above);
        assert!(clip_to_road(&[], &road, 1.0).is_empty());
    }

    #[test]
    fn test_value_on_and_side() {
        let iso = vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)];
        assert_eq!(value_on(&iso, -5.0), Some(0.0));
        assert_eq!(value_on(&iso, 50.0), Some(10.0));
        assert_relative_eq!(value_on(&iso, 2.5).unwrap(), 2.5);
        assert_eq!(value_on(&[], 1.0), None);
        assert_eq!(side_of(&iso, 5.0, 5.0, 1.0), 1);
        assert_eq!(side_of(&iso, 5.0, 4.0, 1.0), -1);
        assert_eq!(side_of(&iso, 5.0, 4.0, -1.0), 1);
        assert_eq!(side_of(&[], 5.0, 4.0, -1.0), 0);
    }

    #[test]
    fn test_classify_zone() {
        let isolines = all_isolines(&context(1.0, 1.0, false));
        let t = T0 + 15.0 * SID;
        assert_eq!(classify_zone(&isolines, t, 4.0, 1.0), DotColor::Red);
        assert_eq!(classify_zone(&isolines, t, 5.5, 1.0), DotColor::Orange);
        assert_eq!(classify_zone(&isolines, t, 100.0, 1.0), DotColor::Gray);
        assert_eq!(classify_zone(&isolines[..3], t, 100.0, 1.0), DotColor::Error);
        assert_eq!(DotColor::Orange.name(), "orange");
    }

    #[test]
    fn test_intersect() {
        let p = intersect(
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
            Point::new(2.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(p.t, 1.0);
        assert_relative_eq!(p.v, 1.0);
        assert!(intersect(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 2.0)
        )
        .is_none());
    }
}
