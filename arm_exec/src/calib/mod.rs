//! # Servo calibration module
//!
//! Servos rarely reach exactly the angle they are commanded to. A calibration
//! run commands a sweep of desired angles, records the angle each joint
//! actually reached, and builds a [`CalibTable`] of the error at each desired
//! angle. The table is then used to compensate any future demand by adding
//! the (interpolated) error to it.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod compensate;
pub mod file;
pub mod prompt;
pub mod session;
mod table;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
pub use comms_if::eqpt::servo::JointId;
pub use compensate::compensate;
pub use table::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Smallest desired angle a calibration sample may have.
///
/// Units: degrees
pub const MIN_CALIB_ANGLE_DEG: f64 = 0.0;

/// Largest desired angle a calibration sample may have.
///
/// Units: degrees
pub const MAX_CALIB_ANGLE_DEG: f64 = 180.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single measurement of one joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibSample {
    /// The angle the servo was commanded to.
    ///
    /// Units: degrees
    pub desired_deg: f64,

    /// The angle the joint was measured at.
    ///
    /// Units: degrees
    pub actual_deg: f64,
}

/// One step of a calibration sweep, both joints measured at the same desired
/// angle. This is also one row of the CSV calibration file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibRow {
    #[serde(rename = "Desired_Angle")]
    pub desired_deg: f64,

    #[serde(rename = "Actual_Angle_Shoulder")]
    pub actual_shoulder_deg: f64,

    #[serde(rename = "Actual_Angle_Elbow")]
    pub actual_elbow_deg: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised while building or using a calibration table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibError {
    #[error("No calibration samples were provided for the {0}")]
    EmptyInput(JointId),

    #[error("The {joint} has more than one calibration sample at {desired_deg} deg")]
    DuplicateAngle { joint: JointId, desired_deg: f64 },

    #[error(
        "Invalid {joint} calibration sample (desired {desired_deg} deg, actual {actual_deg} \
        deg), values must be finite and the desired angle within [0, 180] deg"
    )]
    InvalidSample {
        joint: JointId,
        desired_deg: f64,
        actual_deg: f64,
    },

    #[error("The calibration table has no entries for the {0}")]
    EmptyTable(JointId),

    #[error(
        "Cannot compensate {joint} angle {desired_deg} deg, the calibrated range is \
        [{min_deg}, {max_deg}] deg"
    )]
    OutOfCalibrationRange {
        joint: JointId,
        desired_deg: f64,
        min_deg: f64,
        max_deg: f64,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CalibSample {
    pub fn new(desired_deg: f64, actual_deg: f64) -> Self {
        Self {
            desired_deg,
            actual_deg,
        }
    }
}

impl CalibRow {
    /// Extract the sample for one joint from this row.
    pub fn sample(&self, joint: JointId) -> CalibSample {
        CalibSample {
            desired_deg: self.desired_deg,
            actual_deg: match joint {
                JointId::Shoulder => self.actual_shoulder_deg,
                JointId::Elbow => self.actual_elbow_deg,
            },
        }
    }
}
