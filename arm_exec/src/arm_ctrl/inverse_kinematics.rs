//! Arm inverse kinematics calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::servo::NUM_JOINTS;
use log::debug;

// Internal imports
use super::*;
use crate::kinematics::{self, Point2D};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmCtrl {
    /// Perform the inverse kinematics calculations.
    ///
    /// Finds the shoulder and elbow angles placing the head of the arm at
    /// `(x, y)` relative to the shoulder axis, see [`kinematics::solve`]. The
    /// angles are returned indexed by `JointId::index`.
    pub(crate) fn calc_inverse_kinematics(
        &self,
        x: f64,
        y: f64,
    ) -> Result<[f64; NUM_JOINTS], ArmCtrlError> {
        let links = self.links.ok_or(ArmCtrlError::NotInitialised)?;

        let angles = kinematics::solve(&Point2D::new(x, y), &links)?;

        debug!(
            "\nArm positions:\nShoulder: {:?}\nElbow: {:?}\n",
            angles.alpha_deg, angles.beta_deg
        );

        Ok([angles.alpha_deg, angles.beta_deg])
    }
}
