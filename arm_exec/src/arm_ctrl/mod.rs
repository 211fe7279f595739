//! # Arm control module
//!
//! Turns arm commands into servo demands. Each command produces a pair of
//! target joint angles, either directly (`rot`) or by solving the inverse
//! kinematics of the arm (`ik`). The targets are limited to the joint
//! capabilities and compensated using the calibration table before being
//! output as demands.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod inverse_kinematics;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

use crate::{
    calib::{file::CalibFileError, CalibError, JointId},
    kinematics::IkError,
};
use util::params::LoadError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("ArmCtrl has not been initialised")]
    NotInitialised,

    #[error("Could not solve the inverse kinematics: {0}")]
    Ik(#[from] IkError),

    #[error("Could not compensate the demand: {0}")]
    Compensation(#[from] CalibError),

    #[error("Received a non-finite {0} angle demand")]
    NonFiniteDemand(JointId),

    #[error(
        "The {joint} angle of {angle_deg} deg needed to reach the target is outside the \
         joint limits [{min_deg}, {max_deg}] deg"
    )]
    OutsideJointLimits {
        joint: JointId,
        angle_deg: f64,
        min_deg: f64,
        max_deg: f64,
    },
}

/// Possible errors that can occur while initialising ArmCtrl.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlInitError {
    #[error("Could not load the ArmCtrl parameters: {0}")]
    Params(#[from] LoadError),

    #[error("Invalid arm geometry: {0}")]
    Links(#[from] IkError),

    #[error("Could not load the calibration table: {0}")]
    Calib(#[from] CalibFileError),

    #[error("Invalid {joint} angle limits [{min_deg}, {max_deg}] deg")]
    InvalidLimits {
        joint: JointId,
        min_deg: f64,
        max_deg: f64,
    },
}
