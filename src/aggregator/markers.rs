//! Token scanning of datapoint comments: hashtags and derailment markers.
use itertools::Itertools;

use crate::aggregator::RawEntry;
use crate::constants::{UnixTime, CHANGEDATE, DERAIL_MARKER, SID};

/// A derailment recorded in the data.
#[derive(Debug, Clone, PartialEq)]
pub struct DerailMarker {
    /// Day the derailment is attributed to.
    pub t: UnixTime,
    /// Aggregated value of the marker day once aggregation has run, raw value before.
    pub v: f64,
    pub comment: String,
}

fn is_hashtag(token: &str) -> bool {
    let Some(body) = token.strip_prefix('#') else {
        return false;
    };
    let mut chars = body.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() => {}
        _ => return false,
    }
    let rest: Vec<char> = chars.collect();
    !rest.is_empty() && rest.iter().all(|c| c.is_alphabetic() || c.is_ascii_digit() || *c == '_')
}

/// Distinct hashtags of a comment, in order of appearance.
///
/// A hashtag is a whitespace separated token made of `#`, a letter and at least one more
/// letter, digit or underscore.
pub fn extract_hashtags(comment: &str) -> Vec<String> {
    comment
        .split_whitespace()
        .filter(|token| is_hashtag(token))
        .unique()
        .map(str::to_string)
        .collect()
}

/// Whether a comment marks a derailment.
pub fn is_derail_marker(comment: &str) -> bool {
    comment.starts_with(DERAIL_MARKER)
}

/// Derailment markers found in the entries.
///
/// Markers recorded before the 2019-07-05 change date were entered the day after the
/// derailment and are moved back by one day.
pub fn detect_derail_markers(entries: &[RawEntry]) -> Vec<DerailMarker> {
    entries
        .iter()
        .filter(|e| is_derail_marker(&e.comment))
        .map(|e| DerailMarker {
            t: if e.t < CHANGEDATE { e.t - SID } else { e.t },
            v: e.v,
            comment: e.comment.clone(),
        })
        .collect()
}
