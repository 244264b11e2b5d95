//! Human oriented number formatting.
use crate::num_core::quantize::{number_string, round_half_up};
use crate::num_core::stats::{chop, clip};

/// Round to `digits` significant digits and render the shortest decimal form.
fn to_precision(x: f64, digits: i32) -> String {
    let digits = clip(digits, 1, 100) as usize;
    let rounded: f64 = format!("{:.*e}", digits - 1, x).parse().unwrap_or(x);
    number_string(rounded)
}

/// Format a number with a bounded amount of significant digits.
///
/// Arguments
/// ---------
/// * `x`: number to format
/// * `total`: targeted total number of significant digits (never fewer than the integer part)
/// * `decimals`: maximum number of significant digits after the decimal point
/// * `bias`: `0` rounds to nearest, `> 0` never shows a value below `x`, `< 0` never shows a
///   value above `x`; a biased rounding that would cross `x` retries with one more decimal
///
/// Return
/// ----------
/// * the formatted number, without trailing zeros and never in scientific notation
///
/// See also
/// ------------
/// * [`crate::num_core::quantize::round_directed`] – the same bias applied to a fixed step
pub fn format_significant(x: f64, total: usize, decimals: usize, bias: i64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return number_string(x);
    }
    let x = chop(x);
    let whole = x.abs().floor();
    let mut int_digits: i32 = if whole == 0.0 {
        0
    } else {
        number_string(whole).len() as i32
    };
    if x.abs() > 10f64.powi(int_digits) - 0.5 {
        int_digits += 1;
    }
    let scale = if int_digits == 0 && x != 0.0 {
        (decimals as f64 - x.abs().log10()).floor() as i32
    } else {
        decimals as i32
    };

    let mut v = x * 10f64.powi(scale);
    let mut last_digit = v % 10.0;
    if last_digit < 0.0 {
        last_digit += 10.0;
    }
    // .5 artifacts like 4.4999999 round the wrong way
    if (4.5..4.9999999).contains(&last_digit) {
        v = v.floor();
    }
    let mut xn = round_half_up(v) / 10f64.powi(scale) + 1e-10;

    if (bias < 0 && xn > x) || (bias > 0 && xn < x) {
        if decimals >= 10 {
            xn = x;
        } else {
            return format_significant(x, total, decimals + 1, bias);
        }
    }

    let mut t = total as i32;
    if t < int_digits && (10f64.powi(int_digits - 1) - xn).abs() < 0.5 {
        xn = 10f64.powi(int_digits - 1);
    }
    t = clip(t, int_digits, int_digits + decimals as i32);

    if xn.abs() < 1e-4 || [9.0, 99.0, 999.0].contains(&xn.floor()) {
        to_precision(x, scale)
    } else {
        to_precision(xn, t)
    }
}

/// Number followed by a singular or plural noun, e.g. `"1 day"`, `"3 days"`.
pub fn splur(n: f64, noun: &str) -> String {
    let count = format_significant(n, 10, 5, 0);
    if n == 1.0 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Capitalize the first letter of every word.
pub fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
