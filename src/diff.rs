//! Coverage delta between the current report and an optional baseline,
//! plus the threshold-drop policy.

use crate::coverage::{aggregate, Aggregate};
use crate::model::CoverageReport;

/// Which way coverage moved relative to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Flat,
    /// No baseline, or one side has no measurable coverage.
    Unknown,
}

impl Direction {
    fn from_delta(delta: Option<f64>) -> Self {
        match delta {
            None => Direction::Unknown,
            Some(d) if d < 0.0 => Direction::Down,
            Some(d) if d > 0.0 => Direction::Up,
            Some(_) => Direction::Flat,
        }
    }

    /// Arrow shown next to the delta. Flat and unknown have none.
    pub fn glyph(&self) -> &'static str {
        match self {
            Direction::Up => "▴",
            Direction::Down => "▾",
            Direction::Flat | Direction::Unknown => "",
        }
    }
}

/// Result of comparing the current report against a baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffResult {
    pub after: Aggregate,
    /// Outer `None`: no baseline was supplied. Inner `None`: the baseline
    /// had no instrumented lines.
    pub before: Option<Aggregate>,
    pub delta: Option<f64>,
    pub direction: Direction,
}

impl DiffResult {
    pub fn has_baseline(&self) -> bool {
        self.before.is_some()
    }
}

/// Compare `current` against `baseline`.
#[must_use]
pub fn diff(current: &CoverageReport, baseline: Option<&CoverageReport>) -> DiffResult {
    let after = aggregate(current);
    let before = baseline.map(aggregate);
    let delta = match (after, before) {
        (Some(a), Some(Some(b))) => Some(a - b),
        _ => None,
    };
    DiffResult {
        after,
        before,
        delta,
        direction: Direction::from_delta(delta),
    }
}

/// True iff coverage dropped by strictly more than `threshold` points.
#[must_use]
pub fn exceeds_drop(delta: f64, threshold: f64) -> bool {
    delta < -threshold
}

/// Outcome of the threshold-drop policy for one run.
#[derive(Debug, Clone, PartialEq)]
pub enum ThresholdCheck {
    NotConfigured,
    /// A threshold was configured but there was nothing to compare against.
    Skipped { threshold: f64 },
    Passed { threshold: f64, delta: f64 },
    Failed { threshold: f64, delta: f64 },
}

impl ThresholdCheck {
    pub fn is_failure(&self) -> bool {
        matches!(self, ThresholdCheck::Failed { .. })
    }

    /// Human-readable failure message, if the check failed.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            ThresholdCheck::Failed { threshold, delta } => Some(format!(
                "Coverage drop of {delta:.2}% is below threshold of {threshold}%. Failing..."
            )),
            _ => None,
        }
    }
}

/// Apply the threshold-drop policy to a diff result.
#[must_use]
pub fn check_threshold(result: &DiffResult, threshold: Option<f64>) -> ThresholdCheck {
    let Some(threshold) = threshold else {
        return ThresholdCheck::NotConfigured;
    };
    match result.delta {
        None => ThresholdCheck::Skipped { threshold },
        Some(delta) if exceeds_drop(delta, threshold) => ThresholdCheck::Failed { threshold, delta },
        Some(delta) => ThresholdCheck::Passed { threshold, delta },
    }
}
