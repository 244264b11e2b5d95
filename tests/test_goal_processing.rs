use approx::assert_relative_eq;
use beebrain::brain_errors::BrainError;
use beebrain::goal::{BrainInput, GoalProcessor, GoalSnapshot, ProcessingConfig};
use beebrain::isoline::DotColor;
use serde_json::{json, Value};

mod common;
use common::{day, do_less_goal, do_more_goal, fixture, goal_input, T0};

fn process(input: &BrainInput, now: f64) -> GoalSnapshot {
    GoalProcessor::default().process(input, now)
}

#[test]
fn test_pushups_fixture() {
    let input = fixture("pushups.bb");
    let outcome = GoalProcessor::default().process_detailed(&input, day(10.0));
    let snap = &outcome.snapshot;
    assert_eq!(snap.error, "");

    // asof from the file wins over the clock
    assert_eq!(snap.tcur.as_deref(), Some("20240204"));
    assert_eq!(snap.vcur, Some(4.0));
    assert_eq!(snap.vprev, Some(3.0));
    assert_eq!(snap.tdat.as_deref(), Some("20240204"));
    assert!(snap.safebuf.unwrap() >= 1);
    assert_eq!(snap.cntdn, 26);
    assert_eq!(snap.deltasum, "0 pushups above the bright line");
    assert!(snap.titlesum.contains("bmndr.com/alice/pushups is safe for ~"));
    assert_eq!(snap.headsum, snap.titlesum);

    assert_eq!(snap.fullroad.len(), 2);
    assert_eq!(snap.fullroad[0].0, "20240131");
    assert_eq!(snap.fullroad[1].0, "20240301");
    assert_relative_eq!(snap.fullroad[1].2, 1.0, epsilon = 1e-9);
    assert_eq!(snap.road, snap.fullroad);
    assert_eq!(snap.gldt.as_deref(), Some("20240301"));
    assert_eq!(snap.goal, Some(30.0));

    let state = outcome.state.unwrap();
    assert_eq!(
        state.data.hashtags,
        vec![(day(2.0), "#streak".to_string()), (day(4.0), "#streak".to_string())]
    );
}

#[test]
fn test_legacy_parameters() {
    let outcome = GoalProcessor::default().process_detailed(&fixture("weight.bb"), T0);
    assert_eq!(outcome.snapshot.error, "");
    let state = outcome.state.unwrap();
    assert_eq!(state.params.yoog, "bob/weight");
    assert_eq!(state.vfin, 75.0);
    assert_relative_eq!(state.rfin, -0.2, epsilon = 1e-12);
    assert!(state.summary.titlesum.contains("bmndr.com/bob/weight"));

    // two entries on Feb 2 reduced with `min`
    let feb2 = state.data.points.iter().find(|p| p.t == day(2.0)).unwrap();
    assert_eq!(feb2.v, 79.5);

    let snap = outcome.snapshot;
    assert_eq!(snap.goal, Some(75.0));
    assert_relative_eq!(snap.rate.unwrap(), -0.2, epsilon = 1e-12);
    assert_eq!(snap.fullroad[1].0, "20240207");
    assert_relative_eq!(snap.fullroad[1].1, 79.3, epsilon = 1e-9);
}

#[test]
fn test_bad_goal_files() {
    assert!(matches!(
        BrainInput::from_path("tests/data/missing.bb"),
        Err(BrainError::GoalFileNotFound(_))
    ));
    assert!(matches!(
        BrainInput::from_path("tests/data/broken.bb"),
        Err(BrainError::InputParseError(_))
    ));
}

#[test]
fn test_asof_defaults_to_today() {
    let snap = process(&do_more_goal(), day(4.0) + 3.0 * 3600.0);
    assert_eq!(snap.error, "");
    assert_eq!(snap.tcur.as_deref(), Some("20240204"));
    assert_eq!(snap.proctm, day(4.0) + 3.0 * 3600.0);
}

#[test]
fn test_processing_is_deterministic() {
    let a = process(&do_more_goal(), day(6.0));
    let b = process(&do_more_goal(), day(6.0));
    assert_eq!(a, b);
}

#[test]
fn test_do_less_goal() {
    let outcome = GoalProcessor::default().process_detailed(&do_less_goal(), day(2.0));
    let state = outcome.state.unwrap();
    assert!(state.ctx.is_do_less());
    assert_eq!(state.vcur, 1.0);
    assert_relative_eq!(state.delta, -1.0, epsilon = 1e-9);
    assert_eq!(state.isolines.len(), 7);
    assert_eq!(outcome.snapshot.color, state.color.name());
    assert_ne!(state.color, DotColor::Error);
}

#[test]
fn test_error_snapshots() {
    let cases = [
        (
            json!({"tini": T0, "vini": "ten", "tfin": day(30.0), "vfin": 30, "rfin": null}),
            json!([[T0, 0, ""]]),
            "'vini' isn't numeric: \"ten\"",
        ),
        (
            json!({"tini": T0, "vini": 0, "tfin": day(30.0), "vfin": 30, "rfin": null, "yaw": 1, "dir": 1}),
            json!([]),
            "No datapoints",
        ),
        (
            json!({"tini": T0, "vini": 0, "tfin": day(30.0), "vfin": 30, "rfin": null, "yaw": 1, "dir": 1}),
            json!([[day(5.0), 1, ""]]),
            "All datapoints are in the future!",
        ),
        (
            json!({"tini": T0, "vini": 0, "vfin": 30, "rfin": null, "yaw": 1, "dir": 1,
                   "kyoom": true, "odom": true, "tfin": day(30.0)}),
            json!([[T0, 0, ""]]),
            "The odometer setting doesn't make sense for an auto-summing goal!",
        ),
    ];
    for (params, data, expected) in cases {
        let snap = process(&goal_input(params, data), T0);
        assert_eq!(snap.error, expected);
        assert_eq!(snap.statsum, format!(" error:    {expected}\\n"));
        assert_eq!(snap.safebuf, None);
        assert!(snap.fullroad.is_empty());
    }
}

#[test]
fn test_unknown_params_are_listed() {
    let mut input = do_more_goal();
    input.params.insert("zeta".into(), json!(3));
    input.params.insert("alpha".into(), json!("x"));
    input.params.insert("tagtime".into(), json!(true));
    let snap = process(&input, day(4.0));
    assert_eq!(snap.error, "Unknown params: alpha=x, zeta=3");
}

#[test]
fn test_invalid_road_row() {
    let mut input = do_more_goal();
    input
        .params
        .insert("road".into(), json!([[day(5.0), null, null]]));
    let snap = process(&input, day(4.0));
    assert!(snap.error.starts_with("Invalid road matrix row:"));
}

#[test]
fn test_ppr_policy_leaves_do_more_goals_alone() {
    let legacy = process(&do_more_goal(), day(4.0));
    let clamp = GoalProcessor::new(
        ProcessingConfig::builder()
            .ppr_policy("clamp-wrong-direction".parse().unwrap())
            .build()
            .unwrap(),
    )
    .process(&do_more_goal(), day(4.0));
    assert_eq!(legacy.vcur, clamp.vcur);
    assert_eq!(legacy.fullroad, clamp.fullroad);
    assert_eq!(clamp.safebuf, legacy.safebuf);
}

#[test]
fn test_snapshot_fields() {
    let snap = process(&do_more_goal(), day(4.0));
    let v: Value = serde_json::from_str(&snap.to_json(true).unwrap()).unwrap();
    let keys = [
        "sadbrink", "safebump", "dueby", "fullroad", "pinkzone", "tluz", "tcur", "vcur", "vprev",
        "rcur", "ravg", "tdat", "stdflux", "delta", "lane", "cntdn", "numpts", "mean", "meandelt",
        "proctm", "statsum", "ratesum", "deltasum", "graphsum", "progsum", "rah", "safebuf",
        "error", "limsum", "headsum", "titlesum", "lnw", "color", "loser", "gldt", "goal", "rate",
        "road", "tini", "vini", "tfin", "vfin", "rfin",
    ];
    let obj = v.as_object().unwrap();
    assert_eq!(obj.len(), keys.len());
    for k in keys {
        assert!(obj.contains_key(k), "missing {k}");
    }
    assert_eq!(v["dueby"].as_array().unwrap().len(), 7);
    assert_eq!(v["dueby"][0][0], json!("20240204"));
}
