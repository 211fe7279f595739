//! # Kinematics module
//!
//! Geometry of the two link planar arm. The shoulder joint sits at the origin
//! of the arm frame, the first link (length `l1`) joins the shoulder to the
//! elbow and the second link (length `l2`) joins the elbow to the head.
//!
//! Angles produced by this module are in degrees:
//! - `alpha` is the angle of the first link from the +x axis, in (-180, 180].
//! - `beta` is the angle of the second link relative to the first, in [0, 180].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod inverse;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

// Internal
pub use inverse::solve;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A target position for the head of the arm in the arm frame.
pub type Point2D = Point2<f64>;

/// Lengths of the two links of the arm.
///
/// Both lengths are guaranteed to be finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkLengths {
    l1: f64,
    l2: f64,
}

/// Joint angles which place the head of the arm at a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    /// Angle of the first link from the +x axis.
    ///
    /// Units: degrees
    pub alpha_deg: f64,

    /// Angle of the second link relative to the first.
    ///
    /// Units: degrees
    pub beta_deg: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur while solving the arm kinematics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IkError {
    #[error("Link lengths must be finite and positive, found l1 = {l1}, l2 = {l2}")]
    InvalidLinkLengths { l1: f64, l2: f64 },

    #[error(
        "Target at distance {distance:.3} is out of reach, reachable distances are \
        [{min_reach:.3}, {max_reach:.3}]"
    )]
    OutOfReach {
        distance: f64,
        min_reach: f64,
        max_reach: f64,
    },

    #[error("Target is outside of the solver's numerical domain: {0}")]
    DomainError(DomainFault),
}

/// The reason a target was outside of the solver's numerical domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DomainFault {
    #[error("the target coordinates are not finite")]
    NonFiniteTarget,

    #[error("the target is at the shoulder, so the shoulder angle is undefined")]
    TargetAtOrigin,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LinkLengths {
    /// Create a new set of link lengths, checking both are finite and positive.
    pub fn new(l1: f64, l2: f64) -> Result<Self, IkError> {
        if l1.is_finite() && l2.is_finite() && l1 > 0.0 && l2 > 0.0 {
            Ok(Self { l1, l2 })
        } else {
            Err(IkError::InvalidLinkLengths { l1, l2 })
        }
    }

    /// Length of the first (shoulder to elbow) link.
    pub fn l1(&self) -> f64 {
        self.l1
    }

    /// Length of the second (elbow to head) link.
    pub fn l2(&self) -> f64 {
        self.l2
    }

    /// Furthest distance from the shoulder the head can reach.
    pub fn max_reach(&self) -> f64 {
        self.l1 + self.l2
    }

    /// Closest distance to the shoulder the head can reach.
    pub fn min_reach(&self) -> f64 {
        (self.l1 - self.l2).abs()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_link_lengths() {
        let links = LinkLengths::new(120.0, 80.0).unwrap();
        assert_eq!(links.max_reach(), 200.0);
        assert_eq!(links.min_reach(), 40.0);

        let links = LinkLengths::new(80.0, 120.0).unwrap();
        assert_eq!(links.min_reach(), 40.0);
    }

    #[test]
    fn test_invalid_link_lengths() {
        for (l1, l2) in &[
            (0.0, 100.0),
            (100.0, -1.0),
            (std::f64::NAN, 100.0),
            (100.0, std::f64::INFINITY),
        ] {
            assert!(matches!(
                LinkLengths::new(*l1, *l2),
                Err(IkError::InvalidLinkLengths { .. })
            ));
        }
    }
}
