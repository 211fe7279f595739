//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{
    calib::file::CalibSource,
    kinematics::{IkError, LinkLengths},
};
use comms_if::eqpt::servo::NUM_JOINTS;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
///
/// Joint arrays are indexed by `JointId::index`, shoulder first.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- GEOMETRY ----
    /// The length of the first link, from the shoulder to the elbow.
    ///
    /// Units: any, as long as targets use the same unit.
    pub shoulder_length: f64,

    /// The length of the second link, from the elbow to the head.
    ///
    /// Units: any, as long as targets use the same unit.
    pub elbow_length: f64,

    // ---- CAPABILITIES ----
    /// Minimum angle each joint can be demanded to.
    ///
    /// Units: degrees
    pub min_angle_deg: [f64; NUM_JOINTS],

    /// Maximum angle each joint can be demanded to.
    ///
    /// Units: degrees
    pub max_angle_deg: [f64; NUM_JOINTS],

    /// Default SAFE angle of each joint, used when stopping before any other
    /// demand has been made.
    ///
    /// Units: degrees
    pub default_angle_deg: [f64; NUM_JOINTS],

    // ---- CALIBRATION ----
    /// Where to load the calibration table from. If `None` demands are not
    /// compensated.
    #[serde(default)]
    pub calib: Option<CalibSource>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Get the validated link lengths of the arm.
    pub fn link_lengths(&self) -> Result<LinkLengths, IkError> {
        LinkLengths::new(self.shoulder_length, self.elbow_length)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_params() {
        let params: Params = util::params::parse(
            r#"
            shoulder_length = 100.0
            elbow_length = 80.0
            min_angle_deg = [0.0, 0.0]
            max_angle_deg = [180.0, 170.0]
            default_angle_deg = [90.0, 90.0]

            [calib]
            format = "csv"
            path = "calib/calibration_data_jig01.txt"
            "#,
        )
        .unwrap();

        assert_eq!(params.max_angle_deg, [180.0, 170.0]);
        assert_eq!(params.link_lengths().unwrap().max_reach(), 180.0);
        assert_eq!(
            params.calib,
            Some(CalibSource::Csv {
                path: PathBuf::from("calib/calibration_data_jig01.txt")
            })
        );
    }

    #[test]
    fn test_parse_params_without_calib() {
        let params: Params = util::params::parse(
            r#"
            shoulder_length = 1.0
            elbow_length = 1.0
            min_angle_deg = [0.0, 0.0]
            max_angle_deg = [180.0, 180.0]
            default_angle_deg = [0.0, 0.0]
            "#,
        )
        .unwrap();

        assert_eq!(params.calib, None);
    }

    #[test]
    fn test_invalid_link_lengths() {
        let params = Params {
            shoulder_length: 0.0,
            elbow_length: 1.0,
            ..Default::default()
        };

        assert!(matches!(
            params.link_lengths(),
            Err(IkError::InvalidLinkLengths { .. })
        ));
    }
}
