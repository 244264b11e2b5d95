use approx::assert_relative_eq;
use beebrain::aggregator::StepFunction;
use beebrain::constants::{Point, SID};
use beebrain::derail::{DerailContext, PprPolicy};
use beebrain::goal::{GoalProcessor, GoalState};
use beebrain::isoline::{classify_zone, clip_doless, clip_to_road, nobackward, value_on, DotColor};
use beebrain::road::{AutoField, Road, RoadSegment};

mod common;
use common::{day, do_less_goal, do_more_goal, T0};

fn do_more_state() -> GoalState {
    GoalProcessor::default()
        .process_detailed(&do_more_goal(), day(4.0))
        .state
        .unwrap()
}

#[test]
fn test_isolines_are_ordered() {
    let state = do_more_state();
    for t in [day(6.0), day(15.0), day(25.0)] {
        let values: Vec<f64> = state
            .isolines
            .iter()
            .map(|iso| value_on(iso, t).unwrap())
            .collect();
        for pair in values.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-9, "{values:?} at {t}");
        }
        // never on the wrong side of the road
        assert!(values[0] >= state.road.value_at(t) - 1e-9);
    }
}

#[test]
fn test_isolines_move_forward_in_time() {
    let state = do_more_state();
    for iso in &state.isolines {
        assert!(iso.windows(2).all(|w| w[0].t <= w[1].t));
    }
}

#[test]
fn test_stage_access_matches_final_isoline() {
    let state = do_more_state();
    for k in [0, 3, 6] {
        let stages = state.isoline_stages(k).unwrap();
        assert_eq!(stages.clipped, state.isolines[k]);
        assert!(!stages.generated.is_empty());
    }
}

#[test]
fn test_zone_classification() {
    let state = do_more_state();
    assert_eq!(state.classify(day(4.0), 100.0), DotColor::Gray);
    assert_eq!(state.classify(day(4.0), -50.0), DotColor::Red);
    assert_eq!(state.classify(day(-5.0), 0.0), DotColor::Black);
    assert_eq!(
        classify_zone(&state.isolines[..3], day(4.0), 4.0, 1.0),
        DotColor::Error
    );
}

#[test]
fn test_do_less_isolines() {
    let state = GoalProcessor::default()
        .process_detailed(&do_less_goal(), day(2.0))
        .state
        .unwrap();
    assert_eq!(state.isolines.len(), 7);
    assert!(state.isolines.iter().all(|iso| !iso.is_empty()));
}

fn flat(from: f64, to: f64, v: f64) -> RoadSegment {
    RoadSegment {
        start: Point::new(day(from), v),
        end: Point::new(day(to), v),
        slope: 0.0,
        auto: AutoField::Slope,
    }
}

fn points(days: &[(f64, f64)]) -> Vec<Point> {
    days.iter().map(|&(d, v)| Point::new(day(d), v)).collect()
}

#[test]
fn test_do_less_isoline_after_jump() {
    // flat do-less road at 20 with a kink on day 4, legacy ppr of 2 per day
    let road = Road::new(vec![flat(0.0, 4.0, 20.0), flat(4.0, 30.0, 20.0)]);
    let ctx = DerailContext {
        yaw: -1.0,
        dir: 1.0,
        asof: T0,
        tini: T0,
        tfin: day(30.0),
        ppr_enabled: true,
        tdat: T0 - SID,
        policy: PprPolicy::Legacy,
        daily_minimum: 2.0,
        fix_doless_isolines: true,
        dtf: StepFunction::new(vec![Point::new(T0, 0.0)]),
    };
    let raw = points(&[
        (0.0, 0.0),
        (2.0, 0.0),
        (2.0, 10.0),
        (6.0, 10.0),
        (12.0, 10.0),
        (20.0, 10.0),
    ]);

    let repaired = clip_doless(&raw, &road, &ctx, 6.0).unwrap();
    let clipped = clip_to_road(&nobackward(&repaired), &road, ctx.yaw);

    // the jump on day 2 is replaced by the ppr path 0 -> 4 -> 10 until it meets the contour
    let expected = points(&[
        (0.0, 0.0),
        (2.0, 0.0),
        (4.0, 4.0),
        (7.0, 10.0),
        (12.0, 10.0),
    ]);
    assert_eq!(clipped.len(), expected.len(), "{clipped:?}");
    for (p, e) in clipped.iter().zip(&expected) {
        assert_relative_eq!(p.t, e.t, epsilon = 1e-3);
        assert_relative_eq!(p.v, e.v, epsilon = 1e-9);
    }
}
