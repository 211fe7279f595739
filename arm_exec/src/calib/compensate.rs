//! Demand compensation using a calibration table

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use util::maths::lin_map;

// Internal
use super::*;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compensate a desired joint angle using the calibration table.
///
/// The error at `desired_deg` is found from the table and added to it:
/// - at a calibrated angle the stored error is used directly,
/// - between two calibrated angles the error is linearly interpolated
///   between them,
/// - if the joint has a single entry its error is applied to any angle.
///
/// Angles outside of the calibrated range are never extrapolated.
///
/// # Errors
/// - `EmptyTable` if the joint has no calibration entries.
/// - `OutOfCalibrationRange` if the angle is outside of the calibrated
///   range, or is not finite.
pub fn compensate(desired_deg: f64, joint: JointId, table: &CalibTable) -> Result<f64, CalibError> {
    let entries = table.entries(joint);

    let (first, last) = match (entries.first(), entries.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(CalibError::EmptyTable(joint)),
    };

    let out_of_range = CalibError::OutOfCalibrationRange {
        joint,
        desired_deg,
        min_deg: first.desired_deg,
        max_deg: last.desired_deg,
    };

    if !desired_deg.is_finite() {
        return Err(out_of_range);
    }

    // Constant offset
    if entries.len() == 1 {
        return Ok(desired_deg + first.error_deg);
    }

    if desired_deg < first.desired_deg || desired_deg > last.desired_deg {
        return Err(out_of_range);
    }

    // First entry at or above the desired angle. The range check above means
    // there always is one.
    let idx = entries.partition_point(|e| e.desired_deg < desired_deg);
    let high = &entries[idx];

    let error_deg = if high.desired_deg == desired_deg {
        high.error_deg
    } else {
        // Not an exact match, so the desired angle is above the first entry
        // and idx >= 1
        let low = &entries[idx - 1];
        lin_map(
            (low.desired_deg, high.desired_deg),
            (low.error_deg, high.error_deg),
            desired_deg,
        )
    };

    trace!(
        "Compensated {} {} deg by {} deg",
        joint,
        desired_deg,
        error_deg
    );

    Ok(desired_deg + error_deg)
}

impl CalibTable {
    /// Compensate a desired joint angle, see [`compensate`].
    pub fn compensate(&self, joint: JointId, desired_deg: f64) -> Result<f64, CalibError> {
        compensate(desired_deg, joint, self)
    }
}
