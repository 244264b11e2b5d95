#![allow(dead_code)]

use beebrain::constants::SID;
use beebrain::goal::BrainInput;
use serde_json::{json, Value};

/// 2024-01-31 00:00 UTC
pub const T0: f64 = 1_706_659_200.0;

pub fn day(n: f64) -> f64 {
    T0 + n * SID
}

pub fn goal_input(params: Value, data: Value) -> BrainInput {
    serde_json::from_value(json!({ "params": params, "data": data })).unwrap()
}

pub fn fixture(name: &str) -> BrainInput {
    BrainInput::from_path(format!("tests/data/{name}")).unwrap()
}

/// Cumulative do-more goal: +1 per day from 0 to 30, one unit entered on each of the first
/// four days.
pub fn do_more_goal() -> BrainInput {
    goal_input(
        json!({
            "yoog": "alice/pushups",
            "tini": T0, "vini": 0,
            "tfin": day(30.0), "vfin": 30, "rfin": null,
            "runits": "d", "yaw": 1, "dir": 1, "kyoom": true,
        }),
        json!([
            [T0, 0, "start"],
            [day(1.0), 1, ""],
            [day(2.0), 1, ""],
            [day(3.0), 1, ""],
            [day(4.0), 1, ""],
        ]),
    )
}

/// Cumulative do-less goal: at most +1 per day, half a unit entered on each of the first
/// two days.
pub fn do_less_goal() -> BrainInput {
    goal_input(
        json!({
            "yoog": "alice/sugar",
            "tini": T0, "vini": 0,
            "tfin": day(30.0), "vfin": 30, "rfin": null,
            "runits": "d", "yaw": -1, "dir": 1, "kyoom": true,
        }),
        json!([
            [T0, 0, ""],
            [day(1.0), 0.5, ""],
            [day(2.0), 0.5, ""],
        ]),
    )
}
