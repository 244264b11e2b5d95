//! Small numeric helpers and descriptive statistics over `f64` slices.
use std::collections::HashMap;

use itertools::Itertools;

use crate::brain_errors::BrainError;
use crate::constants::CHOP_EPS;

/// Snap values within `1e-7` of zero to exactly zero.
pub fn chop(x: f64) -> f64 {
    if x.abs() < CHOP_EPS {
        0.0
    } else {
        x
    }
}

/// Clamp `x` into `[a, b]`, swapping the bounds when they are reversed.
pub fn clip<T: PartialOrd>(x: T, a: T, b: T) -> T {
    let (lo, hi) = if b < a { (b, a) } else { (a, b) };
    if x < lo {
        lo
    } else if x > hi {
        hi
    } else {
        x
    }
}

/// Linearly rescale `x` from `[a, b]` onto `[c, d]`.
///
/// Arguments
/// ---------
/// * `x`: value to map
/// * `a`, `b`: source interval
/// * `c`, `d`: destination interval
/// * `clip_q`: whether the result is clamped into the destination interval
///
/// Return
/// ----------
/// * the rescaled value; a degenerate source interval maps to one of the destination bounds
///   and a degenerate destination interval maps everything to `c`
pub fn cvx(x: f64, a: f64, b: f64, c: f64, d: f64, clip_q: bool) -> f64 {
    if chop(a - b) == 0.0 {
        return if x <= a { c.min(d) } else { c.max(d) };
    }
    if chop(c - d) == 0.0 {
        return c;
    }
    let y = c + (x - a) / (b - a) * (d - c);
    if clip_q {
        clip(y, c, d)
    } else {
        y
    }
}

/// Running maximum (`dir == 1`) or running minimum (any other direction).
pub fn monotonize(values: &[f64], dir: i64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut best = match values.first() {
        Some(v) => *v,
        None => return out,
    };
    for &v in values {
        best = if dir == 1 { best.max(v) } else { best.min(v) };
        out.push(best);
    }
    out
}

/// Distinct values in order of first appearance.
pub fn deldups(values: &[f64]) -> Vec<f64> {
    values.iter().copied().unique_by(|v| v.to_bits()).collect()
}

/// Whether the values are in non-decreasing order.
pub fn orderedq(values: &[f64]) -> bool {
    values.iter().tuple_windows().all(|(a, b)| a <= b)
}

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        sum(values) / values.len() as f64
    }
}

/// Median; the average of the two middle values for even lengths and NaN when empty.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let m = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[m]
    } else {
        (sorted[m - 1] + sorted[m]) / 2.0
    }
}

/// Most frequent value, ties going to the value that reached the winning count first.
pub fn mode(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return f64::NAN;
    };
    let mut tally: HashMap<u64, usize> = HashMap::new();
    let (mut best, mut best_count) = (first, 1);
    for &v in values {
        let count = tally.entry(v.to_bits()).or_insert(0);
        *count += 1;
        if *count > best_count {
            best = v;
            best_count = *count;
        }
    }
    best
}

/// Mean after dropping the `trim` fraction of values from each tail.
pub fn trimmean(values: &[f64], trim: f64) -> f64 {
    let n = (values.len() as f64 * trim).floor() as usize;
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    if 2 * n >= sorted.len() {
        return mean(&sorted);
    }
    mean(&sorted[n..sorted.len() - n])
}

/// Running sums.
pub fn accumulate(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, &v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

/// 1 if any value is non-zero, else 0.
pub fn nonzero(values: &[f64]) -> f64 {
    if values.iter().any(|&v| v != 0.0) {
        1.0
    } else {
        0.0
    }
}

/// Sum of the differences of consecutive (start, stop) pairs: `a1-a0 + a3-a2 + ...`.
pub fn clocky(values: &[f64]) -> f64 {
    values.chunks_exact(2).map(|pair| pair[1] - pair[0]).sum()
}

/// Hyndman–Fan sample quantile.
///
/// Arguments
/// ---------
/// * `values`: sample
/// * `q`: probability in `[0, 1]`
/// * `qtype`: estimator type, `1..=9` as in Hyndman & Fan (1996)
/// * `sorted`: whether `values` is already sorted in ascending order
///
/// Return
/// ----------
/// * the estimated quantile, NaN for an empty sample
/// * [`BrainError::InvalidQuantileType`] for a type outside `1..=9`
pub fn quantile(values: &[f64], q: f64, qtype: usize, sorted: bool) -> Result<f64, BrainError> {
    const ABCD: [[f64; 4]; 9] = [
        [0.0, 0.0, 1.0, 0.0],
        [0.5, 0.0, 1.0, 0.0],
        [0.5, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
        [0.5, 0.0, 0.0, 1.0],
        [0.0, 1.0, 0.0, 1.0],
        [1.0, -1.0, 0.0, 1.0],
        [1.0 / 3.0, 1.0 / 3.0, 0.0, 1.0],
        [3.0 / 8.0, 1.0 / 4.0, 0.0, 1.0],
    ];
    if !(1..=9).contains(&qtype) {
        return Err(BrainError::InvalidQuantileType(qtype));
    }
    if values.is_empty() {
        return Ok(f64::NAN);
    }
    let [a, b, c, d] = ABCD[qtype - 1];

    let owned;
    let y: &[f64] = if sorted {
        values
    } else {
        let mut s = values.to_vec();
        s.sort_by(f64::total_cmp);
        owned = s;
        &owned
    };
    let n = y.len() as f64;
    let h = a + (n + b) * q - 1.0;
    let (j, g) = (h.trunc(), h.fract());

    if j < 0.0 {
        return Ok(y[0]);
    }
    if j >= n {
        return Ok(y[y.len() - 1]);
    }
    let j = j as usize;
    if g == 0.0 || j + 1 >= y.len() {
        return Ok(y[j]);
    }
    Ok(y[j] + (y[j + 1] - y[j]) * (c + d * g))
}
