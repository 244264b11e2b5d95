//! # Constants and type definitions for beebrain
//!
//! This module centralizes the **calendar constants**, **rate unit tables**, and **common type
//! definitions** used throughout the `beebrain` library.
//!
//! ## Overview
//!
//! - Day / year lengths and the akrasia horizon
//! - Sentinel timestamps (far-future "doomsday", legacy derail change date)
//! - Rate units (`y`, `m`, `w`, `d`, `h`) with their length in seconds and display names
//! - Core type aliases and the [`Point`] container shared by roads and isolines

use serde::{Deserialize, Serialize};

// -------------------------------------------------------------------------------------------------
// Calendar constants
// -------------------------------------------------------------------------------------------------

/// Days in a year
pub const DIY: f64 = 365.25;

/// Seconds in a day
pub const SID: f64 = 86_400.0;

/// Akrasia horizon: one week, in seconds
pub const AKH: f64 = 7.0 * SID;

/// Far-future sentinel ("doomsday"), a few weeks before the 32-bit epoch rollover
pub const BDUSK: f64 = 2_147_317_201.0;

/// Length of the synthetic lookback / lookahead sentinels around a road, in seconds
pub const SENTINEL_SPAN: f64 = 100.0 * DIY * SID;

/// Derail markers dated before this timestamp (2019-07-05) were recorded one day late
pub const CHANGEDATE: f64 = 1_562_299_200.0;

/// Default wall-clock budget for a single goal computation, in milliseconds
pub const MAXTIME: u64 = 60_000;

/// Fractional padding added around the data when computing a default display range
pub const PRAF: f64 = 0.015;

/// Threshold under which a number is considered to be zero
pub const CHOP_EPS: f64 = 1e-7;

/// Comment prefix identifying a derailment (recommitment) datapoint
pub const DERAIL_MARKER: &str = "RECOMMITTED";

/// Sentinel lane value reported when the lane is not meaningful
pub const NO_LANE: i64 = 666;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Unix timestamp in seconds (UTC)
pub type UnixTime = f64;

/// An 8 character daystamp, `YYYYMMDD`
pub type Daystamp = String;

/// A trajectory isoline, ordered by time
pub type Isoline = Vec<Point>;

// -------------------------------------------------------------------------------------------------
// Rate units
// -------------------------------------------------------------------------------------------------

/// Time unit in which a goal rate is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateUnit {
    #[serde(rename = "y")]
    Year,
    #[serde(rename = "m")]
    Month,
    #[serde(rename = "w")]
    Week,
    #[serde(rename = "d")]
    Day,
    #[serde(rename = "h")]
    Hour,
}

impl RateUnit {
    /// Parse the one letter code used in goal files.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "y" => Some(RateUnit::Year),
            "m" => Some(RateUnit::Month),
            "w" => Some(RateUnit::Week),
            "d" => Some(RateUnit::Day),
            "h" => Some(RateUnit::Hour),
            _ => None,
        }
    }

    /// Number of seconds in one unit ("siru").
    pub fn seconds(&self) -> f64 {
        match self {
            RateUnit::Year => DIY * SID,
            RateUnit::Month => DIY * SID / 12.0,
            RateUnit::Week => 7.0 * SID,
            RateUnit::Day => SID,
            RateUnit::Hour => 3600.0,
        }
    }

    /// Singular display name.
    pub fn name(&self) -> &'static str {
        match self {
            RateUnit::Year => "year",
            RateUnit::Month => "month",
            RateUnit::Week => "week",
            RateUnit::Day => "day",
            RateUnit::Hour => "hour",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RateUnit::Year => "y",
            RateUnit::Month => "m",
            RateUnit::Week => "w",
            RateUnit::Day => "d",
            RateUnit::Hour => "h",
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Points
// -------------------------------------------------------------------------------------------------

/// A point in (time, value) space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub t: UnixTime,
    pub v: f64,
}

impl Point {
    pub const fn new(t: UnixTime, v: f64) -> Self {
        Point { t, v }
    }
}
