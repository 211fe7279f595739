//! # Servo Equipment Commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of servo driven joints on the arm.
pub const NUM_JOINTS: usize = 2;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands that are sent to the servo driver.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServoDems {
    /// The demanded angle of each joint's servo.
    ///
    /// Units: degrees
    pub angle_deg: HashMap<JointId, f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of the servo driven joints of the arm
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone, PartialOrd, Ord)]
pub enum JointId {
    Shoulder,
    Elbow,
}

/// Response from the servo driver based on the demands sent by the client.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum ServoDemsResponse {
    /// Demands were valid and will be executed
    DemsOk,

    /// Demands were invalid and have been rejected
    DemsInvalid,

    /// Equipment is invalid so demands cannot be actuated
    EqptInvalid,
}

/// Error returned when a joint name cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("Unknown joint \"{0}\", expected \"shoulder\" or \"elbow\"")]
pub struct ParseJointIdError(String);

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl JointId {
    /// All joints, in index order.
    pub const ALL: [JointId; NUM_JOINTS] = [JointId::Shoulder, JointId::Elbow];

    /// Index of the joint in fixed-size per-joint arrays.
    pub fn index(&self) -> usize {
        match self {
            JointId::Shoulder => 0,
            JointId::Elbow => 1,
        }
    }

    /// Lowercase name of the joint, as used on the command line and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            JointId::Shoulder => "shoulder",
            JointId::Elbow => "elbow",
        }
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for JointId {
    type Err = ParseJointIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shoulder" => Ok(JointId::Shoulder),
            "elbow" => Ok(JointId::Elbow),
            _ => Err(ParseJointIdError(s.to_string())),
        }
    }
}

impl ServoDems {
    /// Build demands from one angle per joint, in `JointId::ALL` order.
    pub fn from_angles(angle_deg: [f64; NUM_JOINTS]) -> Self {
        Self {
            angle_deg: JointId::ALL.iter().copied().zip(angle_deg.iter().copied()).collect(),
        }
    }

    /// Get the demanded angle for a joint, if there is one.
    pub fn get(&self, joint: JointId) -> Option<f64> {
        self.angle_deg.get(&joint).copied()
    }
}

impl Default for ServoDems {
    fn default() -> Self {
        Self::from_angles([0.0; NUM_JOINTS])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_joint_id_parse() {
        assert_eq!("shoulder".parse::<JointId>().unwrap(), JointId::Shoulder);
        assert_eq!(" Elbow ".parse::<JointId>().unwrap(), JointId::Elbow);
        assert!("wrist".parse::<JointId>().is_err());

        for (i, joint) in JointId::ALL.iter().enumerate() {
            assert_eq!(joint.index(), i);
            assert_eq!(joint.to_string().parse::<JointId>().unwrap(), *joint);
        }
    }

    #[test]
    fn test_servo_dems_json() {
        let dems = ServoDems::from_angles([12.5, 90.0]);
        let json = serde_json::to_string(&dems).unwrap();
        let back: ServoDems = serde_json::from_str(&json).unwrap();

        assert_eq!(back.get(JointId::Shoulder), Some(12.5));
        assert_eq!(back.get(JointId::Elbow), Some(90.0));
    }
}
