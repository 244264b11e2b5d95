//! # Road model
//!
//! The *road* (or bright red line) is the piecewise linear trajectory a goal has to stay on the
//! good side of. It is stored as an ordered list of [`RoadSegment`]s where each segment starts
//! exactly where the previous one ends.
//!
//! ## Overview
//!
//! Two synthetic segments frame every road:
//!
//! - a flat **lookback** segment ending at the road start and beginning 100 years earlier,
//! - a flat **lookahead** segment starting at the goal date and lasting 100 years.
//!
//! They guarantee that [`Road::find_segment`] always lands on a non-vertical segment for any
//! reasonable timestamp. Segments with `start.t == end.t` are *vertical* (instantaneous jumps);
//! their slope is infinite or NaN and every consumer special-cases them.
//!
//! Road matrices from goal files are turned into roads by [`Road::from_rows`]; the
//! [`matrix`] submodule fills in the missing entries of those rows.
use serde::Serialize;

use crate::constants::{Point, UnixTime, BDUSK, SENTINEL_SPAN, SID};
use crate::num_core::search_high;
use crate::time::daysnap;

pub mod matrix;

use matrix::RoadRow;

/// Which of a segment's end date, end value or slope is derived from the other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AutoField {
    Date,
    Value,
    Slope,
}

/// One linear piece of a road.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoadSegment {
    pub start: Point,
    pub end: Point,
    /// Rate in units per second.
    pub slope: f64,
    pub auto: AutoField,
}

impl RoadSegment {
    /// Slope implied by the end points.
    pub fn endpoint_slope(&self) -> f64 {
        (self.end.v - self.start.v) / (self.end.t - self.start.t)
    }

    /// Value of the segment's line at `t`.
    pub fn value_at(&self, t: UnixTime) -> f64 {
        if t == self.start.t {
            return self.start.v;
        }
        self.start.v + self.slope * (t - self.start.t)
    }

    pub fn is_vertical(&self) -> bool {
        self.start.t == self.end.t
    }
}

/// An ordered, continuous sequence of road segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Road {
    segments: Vec<RoadSegment>,
}

impl Road {
    pub fn new(segments: Vec<RoadSegment>) -> Self {
        Road { segments }
    }

    /// Build the road of a goal from its road matrix.
    ///
    /// Arguments
    /// ---------
    /// * `rows`: road matrix, final goal row included
    /// * `tini`, `vini`: road start; an earlier first row moves the start back to that row
    /// * `siru`: seconds in the rate unit of the matrix
    ///
    /// Return
    /// ----------
    /// * the road framed by the lookback and lookahead sentinels. Rows that would end before
    ///   the running start are skipped and unknown dates are capped at the far-future sentinel.
    pub fn from_rows(rows: &[RoadRow], tini: UnixTime, vini: f64, siru: f64) -> Road {
        let (mut tini, mut vini) = (tini, vini);
        if let Some(RoadRow { t: Some(t), v, .. }) = rows.first() {
            if *t < tini {
                tini = *t;
                if let Some(v) = v {
                    vini = *v;
                }
            }
        }

        let anchor = Point::new(tini, vini);
        let mut segments = vec![RoadSegment {
            start: Point::new(daysnap(tini - SENTINEL_SPAN), vini),
            end: anchor,
            slope: 0.0,
            auto: AutoField::Slope,
        }];

        for row in rows {
            let start = segments[segments.len() - 1].end;
            let seg = match (row.t, row.v, row.r) {
                (None, v, r) => {
                    let v = v.unwrap_or(f64::NAN);
                    let slope = r.unwrap_or(f64::NAN) / siru;
                    let end_t = if slope != 0.0 {
                        start.t + (v - start.v) / slope
                    } else {
                        BDUSK
                    };
                    let end_t = BDUSK.min(end_t);
                    RoadSegment {
                        start,
                        end: Point::new(end_t, start.v + slope * (end_t - start.t)),
                        slope,
                        auto: AutoField::Date,
                    }
                }
                (Some(t), None, r) => {
                    let slope = r.unwrap_or(f64::NAN) / siru;
                    RoadSegment {
                        start,
                        end: Point::new(t, start.v + slope * (t - start.t)),
                        slope,
                        auto: AutoField::Value,
                    }
                }
                (Some(t), Some(v), _) => {
                    let mut seg = RoadSegment {
                        start,
                        end: Point::new(t, v),
                        slope: 0.0,
                        auto: AutoField::Slope,
                    };
                    seg.slope = seg.endpoint_slope();
                    seg
                }
            };
            if seg.end.t >= seg.start.t {
                segments.push(seg);
            }
        }

        let goal_end = segments[segments.len() - 1].end;
        segments.push(RoadSegment {
            start: goal_end,
            end: Point::new(daysnap(goal_end.t + SENTINEL_SPAN), goal_end.v),
            slope: 0.0,
            auto: AutoField::Value,
        });
        Road { segments }
    }

    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segment that ends at the goal date (the one before the lookahead sentinel).
    pub fn goal_segment(&self) -> Option<&RoadSegment> {
        self.segments.iter().rev().nth(1)
    }

    /// Index of the segment containing `t`.
    ///
    /// When `t` sits on one or more vertical segments the last matching segment wins, which is
    /// the non-vertical segment right after the jump. Timestamps outside the road are clamped
    /// to the first or last segment.
    pub fn find_segment(&self, t: UnixTime) -> usize {
        if self.segments.is_empty() {
            return 0;
        }
        let idx = search_high(&self.segments, |s| {
            if s.end.t < t {
                -1.0
            } else if s.start.t > t {
                1.0
            } else {
                0.0
            }
        });
        idx.clamp(0, self.segments.len() as isize - 1) as usize
    }

    /// Road value at `t`.
    pub fn value_at(&self, t: UnixTime) -> f64 {
        match self.segments.get(self.find_segment(t)) {
            Some(seg) => seg.value_at(t),
            None => f64::NAN,
        }
    }

    /// Road slope (units per second) at `t`.
    pub fn slope_at(&self, t: UnixTime) -> f64 {
        match self.segments.get(self.find_segment(t)) {
            Some(seg) => seg.slope,
            None => f64::NAN,
        }
    }

    /// Recompute every segment after an edit.
    ///
    /// Each interior segment is re-anchored on the end of its predecessor, then the field named
    /// by `auto` (or by the segment's own `auto` when `use_segment_auto` is set) is derived:
    ///
    /// * **Date**: end date from slope and value delta, snapped to a day and kept at least one
    ///   day after the start; a flat segment that still has to change value never ends, so its
    ///   date becomes the far-future sentinel. Afterwards the end value follows the slope when
    ///   `edited` is [`AutoField::Slope`], otherwise the slope follows the end points.
    /// * **Value**: end value from slope, or from the previous value delta for vertical
    ///   segments.
    /// * **Slope**: slope from the end points.
    ///
    /// The lookback and lookahead sentinels are re-fixed around the result.
    pub fn rebuild(&self, auto: AutoField, use_segment_auto: bool, edited: AutoField) -> Road {
        let mut rd = self.segments.clone();
        let nr = rd.len();
        if nr == 0 {
            return Road::new(rd);
        }

        rd[0].start = Point::new(rd[0].end.t - SENTINEL_SPAN, rd[0].end.v);
        rd[0].slope = 0.0;

        for i in 1..nr.saturating_sub(1) {
            let policy = if use_segment_auto { rd[i].auto } else { auto };
            let dv = rd[i].end.v - rd[i].start.v;
            rd[i].start = rd[i - 1].end;
            let seg = &mut rd[i];

            match policy {
                AutoField::Date => {
                    if seg.slope.is_finite() && seg.slope != 0.0 {
                        seg.end.t = daysnap(seg.start.t + (seg.end.v - seg.start.v) / seg.slope);
                    } else if seg.slope == 0.0 && seg.end.v != seg.start.v {
                        seg.end.t = BDUSK;
                    }
                    if seg.end.t <= seg.start.t {
                        seg.end.t = daysnap(seg.start.t + SID);
                    }
                    if edited == AutoField::Slope {
                        seg.end.v = seg.start.v + seg.slope * (seg.end.t - seg.start.t);
                    } else {
                        seg.slope = seg.endpoint_slope();
                    }
                }
                AutoField::Value => {
                    seg.end.v = if seg.slope.is_finite() {
                        seg.start.v + seg.slope * (seg.end.t - seg.start.t)
                    } else {
                        seg.start.v + dv
                    };
                }
                AutoField::Slope => seg.slope = seg.endpoint_slope(),
            }
        }

        if nr > 1 {
            let last_start = rd[nr - 2].end;
            rd[nr - 1].start = last_start;
            rd[nr - 1].end = Point::new(last_start.t + SENTINEL_SPAN, last_start.v);
            rd[nr - 1].slope = 0.0;
        }
        Road::new(rd)
    }
}
