//! # Numeric core
//!
//! Leaf utilities shared by every other component of the crate.
//!
//! ## Overview
//!
//! - [`search`]: tie-aware binary search over sorted slices with a signed distance function,
//! - [`stats`]: descriptive statistics (mean, median, mode, trimmed mean, Hyndman–Fan quantiles)
//!   and small helpers such as [`stats::chop`], [`stats::clip`] or [`stats::cvx`],
//! - [`quantize`]: canonical decimal strings and float-safe rounding to a step,
//! - [`shownum`]: significant-digit formatting used by the goal summaries.
pub mod quantize;
pub mod search;
pub mod shownum;
pub mod stats;

pub use quantize::{canonicalize, infer_precision, round_directed, round_to_step};
pub use search::{search_high, search_low};
pub use shownum::{format_significant, splur};
pub use stats::{chop, clip, quantile};
