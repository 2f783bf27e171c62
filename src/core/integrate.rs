// Irradose - core/integrate.rs
//
// Decay-corrected dose accumulation over a numeric series.
//
// Two phases, one row at a time, never looking back:
//   WARMUP  - samples below the warm-up threshold only decay the accumulator.
//             The first sample at or above it switches to MEASURE and is
//             re-evaluated there.
//   MEASURE - each sample above the stop threshold decays the accumulator
//             and adds C * v * (1 - exp(-λ·w)); a sample at or below it ends
//             the run.
// NaN ends either phase.

use crate::core::model::{IntegrationResult, NumericSeries};
use crate::util::constants;

/// Tunable parameters of the accumulation model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayParams {
    /// Contribution scale `C`.
    pub scale: f64,
    /// Samples at or above this end the warm-up phase.
    pub warmup_threshold: f64,
    /// Samples at or below this end the measurement phase.
    pub stop_threshold: f64,
}

impl Default for DecayParams {
    fn default() -> Self {
        Self {
            scale: constants::DEFAULT_SCALE,
            warmup_threshold: constants::DEFAULT_WARMUP_THRESHOLD,
            stop_threshold: constants::DEFAULT_STOP_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Warmup,
    Measure,
}

/// Why the scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Ran off the end of the series.
    Exhausted,
    /// Hit a NaN before measurement started.
    NanDuringWarmup,
    /// Hit a NaN while measuring.
    NanDuringMeasure,
    /// A sample fell to or below the stop threshold.
    BelowStopThreshold,
}

/// Unrounded state at the end of a scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accumulation {
    pub raw_total: f64,
    pub elapsed_count: u64,
    /// Row index where scanning stopped.
    pub stopped_at: usize,
    pub reason: StopReason,
}

impl Accumulation {
    pub fn into_result(self) -> IntegrationResult {
        IntegrationResult {
            total: round_one_decimal(self.raw_total),
            elapsed_count: self.elapsed_count,
        }
    }
}

/// Run the two-phase scan from `start` with decay constant `lambda` (1/s).
pub fn accumulate(
    series: &NumericSeries,
    start: usize,
    lambda: f64,
    params: &DecayParams,
) -> Accumulation {
    let mut phase = Phase::Warmup;
    // No decay is applied until measurement has started.
    let mut width = 0.0_f64;
    let mut total = 0.0_f64;
    let mut count: u64 = 0;
    let mut cursor = start;

    let reason = loop {
        let Some(v) = series.get(cursor) else {
            break StopReason::Exhausted;
        };
        match phase {
            Phase::Warmup => {
                if v.is_nan() {
                    break StopReason::NanDuringWarmup;
                }
                total *= (-lambda * width).exp();
                if v < params.warmup_threshold {
                    cursor += 1;
                } else {
                    width = constants::MEASURE_STEP_SECS;
                    phase = Phase::Measure;
                    tracing::trace!(row = cursor, value = v, "Measurement phase started");
                }
            }
            Phase::Measure => {
                if v.is_nan() {
                    break StopReason::NanDuringMeasure;
                }
                if v <= params.stop_threshold {
                    break StopReason::BelowStopThreshold;
                }
                count += 1;
                let decay = (-lambda * width).exp();
                total = total * decay + params.scale * v * (1.0 - decay);
                cursor += 1;
            }
        }
    };

    tracing::debug!(
        start,
        stopped_at = cursor,
        ?reason,
        count,
        raw_total = total,
        "Decay integration finished"
    );

    Accumulation {
        raw_total: total,
        elapsed_count: count,
        stopped_at: cursor,
        reason,
    }
}

/// Run the scan and round the total to one decimal place.
pub fn integrate(
    series: &NumericSeries,
    start: usize,
    lambda: f64,
    params: &DecayParams,
) -> IntegrationResult {
    accumulate(series, start, lambda, params).into_result()
}

/// Round to one decimal place.
///
/// Rounds the exact binary value with ties to even, so `0.25` becomes `0.2`
/// and `0.15` (stored just below the tie) becomes `0.1`.
pub fn round_one_decimal(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}
