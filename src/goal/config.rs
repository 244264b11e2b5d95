//! # Processing configuration
//!
//! Engine knobs that are not part of a goal file. [`ProcessingConfig::default`] reproduces the
//! historical behaviour; every other combination is built through
//! [`ProcessingConfig::builder`], which validates the values.
use std::fmt;
use std::time::Duration;

use crate::brain_errors::BrainError;
use crate::constants::MAXTIME;
use crate::derail::PprPolicy;

/// Knobs of a goal computation.
///
/// Defaults
/// -----------------
/// * `ppr_policy`: [`PprPolicy::Legacy`]
/// * `daily_minimum`: 2.0
/// * `fix_doless_isolines`: false
/// * `isoline_count`: 7 (isolines 0 to 6, the minimum needed for zone classification)
/// * `max_processing_time`: 60 s
///
/// See also
/// ------------
/// * [`crate::goal::GoalProcessor`] – consumes the configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingConfig {
    pub ppr_policy: PprPolicy,
    /// PPR magnitude on flat roads and floor of the floored policies.
    pub daily_minimum: f64,
    /// Do-less isolines ignore the doubled jump of vertical segments and get clipped.
    pub fix_doless_isolines: bool,
    /// Number of isolines computed, starting at 0.
    pub isoline_count: usize,
    /// Wall-clock budget of one computation.
    pub max_processing_time: Duration,
}

impl ProcessingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a [`ProcessingConfigBuilder`] initialized with the defaults.
    ///
    /// ```rust,no_run
    /// use beebrain::derail::PprPolicy;
    /// use beebrain::goal::ProcessingConfig;
    ///
    /// let config = ProcessingConfig::builder()
    ///     .ppr_policy(PprPolicy::FloorMagnitude)
    ///     .daily_minimum(1.0)
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn builder() -> ProcessingConfigBuilder {
        ProcessingConfigBuilder::new()
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        ProcessingConfig {
            ppr_policy: PprPolicy::Legacy,
            daily_minimum: 2.0,
            fix_doless_isolines: false,
            isoline_count: 7,
            max_processing_time: Duration::from_millis(MAXTIME),
        }
    }
}

/// Builder for [`ProcessingConfig`], with validation.
#[derive(Debug, Clone)]
pub struct ProcessingConfigBuilder {
    config: ProcessingConfig,
}

impl Default for ProcessingConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ProcessingConfig::default(),
        }
    }

    pub fn ppr_policy(mut self, v: PprPolicy) -> Self {
        self.config.ppr_policy = v;
        self
    }
    pub fn daily_minimum(mut self, v: f64) -> Self {
        self.config.daily_minimum = v;
        self
    }
    pub fn fix_doless_isolines(mut self, v: bool) -> Self {
        self.config.fix_doless_isolines = v;
        self
    }
    pub fn isoline_count(mut self, v: usize) -> Self {
        self.config.isoline_count = v;
        self
    }
    pub fn max_processing_time(mut self, v: Duration) -> Self {
        self.config.max_processing_time = v;
        self
    }

    /// Validate and produce the configuration.
    ///
    /// Validation rules
    /// -----------------
    /// * `daily_minimum > 0` (NaN rejected)
    /// * `isoline_count >= 7`
    /// * `max_processing_time` non-zero
    ///
    /// Return
    /// ----------
    /// * the configuration, or [`BrainError::InvalidConfig`] naming the offending knob
    pub fn build(self) -> Result<ProcessingConfig, BrainError> {
        let c = &self.config;
        if c.daily_minimum.partial_cmp(&0.0) != Some(std::cmp::Ordering::Greater) {
            return Err(BrainError::InvalidConfig(
                "daily_minimum must be > 0".into(),
            ));
        }
        if c.isoline_count < 7 {
            return Err(BrainError::InvalidConfig(
                "isoline_count must be >= 7".into(),
            ));
        }
        if c.max_processing_time.is_zero() {
            return Err(BrainError::InvalidConfig(
                "max_processing_time must be non-zero".into(),
            ));
        }
        Ok(self.config)
    }
}

impl fmt::Display for ProcessingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 40;
            writeln!(f, "Goal Processing Parameters")?;
            writeln!(f, "--------------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            line!(
                "ppr_policy          = {}",
                self.ppr_policy,
                "Pessimistic presumptive report rule"
            )?;
            line!(
                "daily_minimum       = {:.3}",
                self.daily_minimum,
                "PPR on flat roads"
            )?;
            line!(
                "fix_doless_isolines = {}",
                self.fix_doless_isolines,
                "Clip do-less isolines"
            )?;
            line!(
                "isoline_count       = {}",
                self.isoline_count,
                "Isolines computed"
            )?;
            line!(
                "max_processing_time = {} ms",
                self.max_processing_time.as_millis(),
                "Budget of one computation"
            )?;
            Ok(())
        } else {
            write!(
                f,
                "ProcessingConfig(ppr_policy={}, daily_minimum={:.2}, fix_doless_isolines={}, isoline_count={}, max_processing_time={}ms)",
                self.ppr_policy,
                self.daily_minimum,
                self.fix_doless_isolines,
                self.isoline_count,
                self.max_processing_time.as_millis(),
            )
        }
    }
}
