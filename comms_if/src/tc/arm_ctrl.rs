//! # Arm control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::{clap::AppSettings, StructOpt};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be completed by arm control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
pub enum ArmCmd {
    /// Rotate each joint of the arm to the given angle.
    #[structopt(name = "rot", setting = AppSettings::AllowNegativeNumbers)]
    BasicRotation {
        /// Demanded shoulder angle in degrees.
        shoulder_deg: f64,

        /// Demanded elbow angle in degrees.
        elbow_deg: f64,
    },

    /// A simplified control where the user defines the location of the head
    /// and the joint angles are calculated to achieve this position.
    #[structopt(name = "ik", setting = AppSettings::AllowNegativeNumbers)]
    InverseKinematics {
        /// Horizontal distance of the head from the shoulder axis.
        ///
        /// Units: same as the link lengths in the arm parameters.
        x: f64,

        /// Vertical distance of the head from the shoulder axis.
        ///
        /// Units: same as the link lengths in the arm parameters.
        y: f64,
    },

    /// Stop the arm, holding the last demanded joint angles.
    #[structopt(name = "stop")]
    Stop,
}
