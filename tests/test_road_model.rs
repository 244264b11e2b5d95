use approx::assert_relative_eq;
use beebrain::constants::{Point, SID};
use beebrain::goal::GoalProcessor;
use beebrain::road::matrix::{materialize_all, RoadRow};
use beebrain::road::{AutoField, Road};
use serde_json::json;

mod common;
use common::{day, goal_input, T0};

fn two_leg_road() -> Road {
    let rows = [
        RoadRow::new(Some(day(10.0)), Some(10.0), None),
        RoadRow::new(Some(day(20.0)), None, Some(0.5)),
    ];
    Road::from_rows(&rows, T0, 0.0, SID)
}

#[test]
fn test_piecewise_values() {
    let road = two_leg_road();
    assert_eq!(road.len(), 4);
    assert_relative_eq!(road.value_at(day(5.0)), 5.0, epsilon = 1e-9);
    assert_relative_eq!(road.value_at(day(15.0)), 12.5, epsilon = 1e-9);
    assert_relative_eq!(road.slope_at(day(15.0)) * SID, 0.5, epsilon = 1e-12);
    // flat before the start and after the goal date
    assert_eq!(road.value_at(day(-100.0)), 0.0);
    assert_relative_eq!(road.value_at(day(100.0)), 15.0, epsilon = 1e-9);
}

#[test]
fn test_rebuild_after_edit() {
    let mut segments = two_leg_road().segments().to_vec();
    segments[1].end = Point::new(day(10.0), 20.0);
    let road = Road::new(segments).rebuild(AutoField::Slope, false, AutoField::Slope);
    for pair in road.segments().windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
    assert_relative_eq!(road.segments()[1].slope * SID, 2.0, epsilon = 1e-12);
    assert_relative_eq!(road.segments()[2].slope * SID, -0.5, epsilon = 1e-12);
}

#[test]
fn test_materialize_with_start_row() {
    // rates per second
    let rows = [
        RoadRow::new(Some(T0), Some(0.0), None),
        RoadRow::new(None, Some(14.0 * SID), Some(1.0)),
        RoadRow::new(Some(day(21.0)), Some(14.0 * SID), None),
    ];
    let filled = materialize_all(&rows, 1.0).unwrap();
    assert_eq!(filled.len(), 3);
    assert_eq!(filled[0].r, 0.0);
    assert_eq!(filled[1].t, day(14.0));
    assert_eq!(filled[1].derived, AutoField::Date);
    assert_eq!(filled[2].r, 0.0);
    assert_eq!(filled[2].derived, AutoField::Slope);
}

#[test]
fn test_weekly_rate_unit() {
    let input = goal_input(
        json!({
            "tini": T0, "vini": 0,
            "tfin": day(28.0), "vfin": 28, "rfin": null,
            "runits": "w", "yaw": 1, "dir": 1, "kyoom": true,
        }),
        json!([[T0, 0, ""], [day(1.0), 1, ""]]),
    );
    let outcome = GoalProcessor::default().process_detailed(&input, day(1.0));
    let state = outcome.state.unwrap();
    assert_eq!(state.tfin, day(28.0));
    assert_relative_eq!(state.road.value_at(day(14.0)), 14.0, epsilon = 1e-9);
    assert_eq!(outcome.snapshot.tfin.as_deref(), Some("20240228"));
    assert_relative_eq!(outcome.snapshot.fullroad[1].2, 7.0, epsilon = 1e-9);
    assert!(outcome.snapshot.ratesum.ends_with("per week"));
}
