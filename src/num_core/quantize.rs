//! # Float-safe decimal canonicalization and rounding
//!
//! ## Overview
//!
//! Rounding `999.9` to a step of `0.1` by computing `round(x / 0.1) * 0.1` yields
//! `999.9000000000001`. The helpers here avoid that class of artifact by going through the
//! decimal string representation whenever the step is a negative power of ten:
//!
//! - [`canonicalize`] turns any decimal or scientific string into a plain decimal string,
//! - [`infer_precision`] reads the implied step off a string like `"3.00"`,
//! - [`round_to_step`] and [`round_directed`] round with those guarantees.
use std::sync::LazyLock;

use regex::Regex;

static LEADING_ZEROS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0+([^eE])").expect("valid regex"));
static PLAIN_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+\.?\d*|\.\d+)$").expect("valid regex"));
static SCIENTIFIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+\.?\d*|\.\d+)e([+-]?\d+)$").expect("valid regex"));
static SINGLE_ZERO_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0+(.)").expect("valid regex"));
static INTEGER_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+\.?$").expect("valid regex"));
static INTEGER_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d*\.").expect("valid regex"));
static POWER_OF_TEN_STEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0?\.(0*)1$").expect("valid regex"));

/// Round half up, the way a calendar-agnostic `floor(x + 0.5)` would but without its
/// precision loss just below one half.
pub fn round_half_up(x: f64) -> f64 {
    let f = x.floor();
    if x - f >= 0.5 {
        f + 1.0
    } else {
        f
    }
}

/// Shortest decimal rendering of a float, never in scientific notation.
pub fn number_string(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if x == 0.0 {
        "0".to_string()
    } else {
        format!("{x}")
    }
}

/// Normalize a number string to a plain, non-scientific decimal string.
///
/// Leading `+` signs and leading zeros are dropped and scientific notation is un-scaled
/// digit by digit, so `"1.5e-3"` becomes `".0015"` and `"0012e2"` becomes `"1200"`.
/// Anything that is not a number yields `"NaN"`. The function is idempotent.
pub fn canonicalize(s: &str) -> String {
    let mut x = s.trim().to_string();
    if let Some(rest) = x.strip_prefix('+') {
        x = rest.to_string();
    }
    if let Some(rest) = x.strip_prefix('-') {
        return format!("-{}", canonicalize(rest));
    }
    x = LEADING_ZEROS.replace(&x, "${1}").into_owned();
    if PLAIN_DECIMAL.is_match(&x) {
        return x;
    }
    let Some(caps) = SCIENTIFIC.captures(&x) else {
        return "NaN".to_string();
    };
    let mantissa = &caps[1];
    let Ok(exponent) = caps[2].parse::<i64>() else {
        return "NaN".to_string();
    };

    let dp = mantissa.find('.').unwrap_or(mantissa.len()) as i64 + exponent;
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let out = if dp < 0 {
        format!(".{}{}", "0".repeat((-dp) as usize), digits)
    } else if dp as usize > digits.len() {
        format!("{}{}", digits, "0".repeat(dp as usize - digits.len()))
    } else {
        format!("{}.{}", &digits[..dp as usize], &digits[dp as usize..])
    };
    let out = out.strip_suffix('.').unwrap_or(&out);
    SINGLE_ZERO_HEAD.replace(out, "${1}").into_owned()
}

/// [`canonicalize`] applied to a float.
pub fn canonicalize_f64(x: f64) -> String {
    canonicalize(&number_string(x))
}

/// Precision implied by the way a number is written.
///
/// Arguments
/// ---------
/// * `s`: a number as typed by a user, e.g. `"3"`, `"3.00"`, `".123"` or `"1.5e-2"`
///
/// Return
/// ----------
/// * `1` for integers, otherwise the value of a one in the last written decimal place
pub fn infer_precision(s: &str) -> f64 {
    let canonical = canonicalize(s);
    if INTEGER_LIKE.is_match(&canonical) {
        return 1.0;
    }
    let fractional = INTEGER_PART.replace(&canonical, ".");
    let mut zeros: String = fractional
        .chars()
        .map(|c| if c.is_ascii_digit() { '0' } else { c })
        .collect();
    match zeros.rfind('0') {
        Some(i) => zeros.replace_range(i..=i, "1"),
        None => return 1.0,
    }
    zeros.parse().unwrap_or(f64::NAN)
}

/// Round `x` to the nearest multiple of `step`.
///
/// When `step` is a negative power of ten the result is rebuilt from its decimal digits so that
/// `round_to_step(999.9, 0.1)` is exactly `999.9`.
///
/// Return
/// ----------
/// * NaN for a negative step, `x` unchanged for a zero step
pub fn round_to_step(x: f64, step: f64) -> f64 {
    if step < 0.0 {
        return f64::NAN;
    }
    if step == 0.0 {
        return x;
    }
    let y = round_half_up(x / step);
    let step_str = number_string(step);
    if let Some(caps) = POWER_OF_TEN_STEP.captures(&step_str) {
        let p = -(caps[1].len() as i64) - 1;
        return canonicalize(&format!("{}e{p}", number_string(y)))
            .parse()
            .unwrap_or(f64::NAN);
    }
    y * step
}

/// Round `x` to a multiple of `step`, biased so the result never lands on the wrong side.
///
/// Arguments
/// ---------
/// * `x`: value to round
/// * `step`: rounding step
/// * `bias`: `0` for plain rounding, `> 0` to never return less than `x`, `< 0` to never
///   return more than `x`
pub fn round_directed(x: f64, step: f64, bias: i64) -> f64 {
    let mut y = round_to_step(x, step);
    if bias == 0 {
        return y;
    }
    if bias < 0 && y > x {
        y -= step;
    } else if bias > 0 && y < x {
        y += step;
    }
    round_to_step(y, step)
}

#[cfg(test)]
mod quantize_test {
    use super::*;

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("3"), "3");
        assert_eq!(canonicalize("+3.50"), "3.50");
        assert_eq!(canonicalize("007"), "7");
        assert_eq!(canonicalize("-0.5"), "-.5");
        assert_eq!(canonicalize("1.5e-3"), ".0015");
        assert_eq!(canonicalize("12e2"), "1200");
        assert_eq!(canonicalize("1.25E1"), "12.5");
        assert_eq!(canonicalize("9999e-1"), "999.9");
        assert_eq!(canonicalize("abc"), "NaN");
        assert_eq!(canonicalize_f64(0.1), ".1");
    }

    #[test]
    fn test_canonicalize_idempotent() {
        for s in ["3", "+3.50", "-0.5", "1.5e-3", "12e2", ".001", "100", "0.000", "-7e1"] {
            let once = canonicalize(s);
            assert_eq!(canonicalize(&once), once, "input {s}");
        }
    }

    #[test]
    fn test_infer_precision() {
        assert_eq!(infer_precision("3"), 1.0);
        assert_eq!(infer_precision("3.00"), 0.01);
        assert_eq!(infer_precision("12.0"), 0.1);
        assert_eq!(infer_precision("100"), 1.0);
        assert_eq!(infer_precision(".123"), 0.001);
        assert_eq!(infer_precision("-2.5"), 0.1);
    }

    #[test]
    fn test_round_to_step() {
        assert_eq!(round_to_step(999.9, 0.1), 999.9);
        assert_eq!(round_to_step(1.234, 0.01), 1.23);
        assert_eq!(round_to_step(17.0, 5.0), 15.0);
        assert_eq!(round_to_step(2.5, 1.0), 3.0);
        assert_eq!(round_to_step(-2.5, 1.0), -2.0);
        assert_eq!(round_to_step(4.2, 0.0), 4.2);
        assert!(round_to_step(4.2, -1.0).is_nan());
    }

    #[test]
    fn test_round_directed() {
        assert_eq!(round_directed(1.26, 0.1, 0), 1.3);
        assert_eq!(round_directed(1.26, 0.1, -1), 1.2);
        assert_eq!(round_directed(1.24, 0.1, 1), 1.3);
        assert_eq!(round_directed(1.2, 0.1, 1), 1.2);
    }
}
