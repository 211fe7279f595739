//! Arm inverse kinematics calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use util::maths::{clamp, wrap_deg_180};

// Internal imports
use super::*;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate the joint angles which place the head of the arm at `target`.
///
/// Inverse kinematics is described in
/// https://en.wikipedia.org/wiki/Inverse_kinematics. For a two link planar
/// arm the elbow angle follows from the law of cosines applied to the
/// triangle formed by the two links and the line from the shoulder to the
/// target:
///
/// ```text
/// cos(beta) = (x^2 + y^2 - l1^2 - l2^2) / (2 l1 l2)
/// ```
///
/// and the shoulder angle is the bearing of the target minus the angle the
/// head makes with the first link:
///
/// ```text
/// alpha = atan2(y, x) - atan2(l2 sin(beta), l1 + l2 cos(beta))
/// ```
///
/// Only the positive `beta` ("elbow-down") solution is returned. The mirror
/// configuration `(alpha', -beta)` also reaches the target but is never
/// produced.
///
/// # Errors
/// - `DomainError` if the target is not finite or lies on the shoulder axis,
///   where the bearing of the target is undefined.
/// - `OutOfReach` if the target is further than `l1 + l2` or closer than
///   `|l1 - l2|` from the shoulder.
pub fn solve(target: &Point2D, links: &LinkLengths) -> Result<JointAngles, IkError> {
    let (x, y) = (target.x, target.y);
    let (l1, l2) = (links.l1(), links.l2());

    if !x.is_finite() || !y.is_finite() {
        return Err(IkError::DomainError(DomainFault::NonFiniteTarget));
    }
    if x == 0.0 && y == 0.0 {
        return Err(IkError::DomainError(DomainFault::TargetAtOrigin));
    }

    // Reachability must be checked before the cosine is computed
    let distance = x.hypot(y);
    if distance > links.max_reach() || distance < links.min_reach() {
        return Err(IkError::OutOfReach {
            distance,
            min_reach: links.min_reach(),
            max_reach: links.max_reach(),
        });
    }

    // Round-off at the edges of the reachable annulus can push the cosine
    // just outside [-1, 1]
    let cos_beta = clamp(
        &((x.powi(2) + y.powi(2) - l1.powi(2) - l2.powi(2)) / (2.0 * l1 * l2)),
        &-1.0,
        &1.0,
    );
    let beta_rad = cos_beta.acos();

    let k1 = l1 + l2 * beta_rad.cos();
    let k2 = l2 * beta_rad.sin();
    let alpha_rad = y.atan2(x) - k2.atan2(k1);

    let angles = JointAngles {
        alpha_deg: wrap_deg_180(alpha_rad.to_degrees()),
        beta_deg: beta_rad.to_degrees(),
    };

    trace!("IK ({:.3}, {:.3}) -> {:?}", x, y, angles);

    Ok(angles)
}
