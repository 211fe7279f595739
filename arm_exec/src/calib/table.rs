//! Calibration error table

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// Internal
use super::*;
use comms_if::eqpt::servo::NUM_JOINTS;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The measured error of a joint at one desired angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    /// The commanded angle.
    ///
    /// Units: degrees
    pub desired_deg: f64,

    /// Measured angle minus the commanded angle.
    ///
    /// Units: degrees
    pub error_deg: f64,
}

/// Per-joint calibration errors.
///
/// Each joint has a flat sequence of entries, sorted by ascending desired
/// angle with no repeated desired angles. A joint's sequence may be empty if
/// that joint was not calibrated. The table cannot be modified once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalibTable {
    entries: [Vec<TableEntry>; NUM_JOINTS],
}

/// Builds a [`CalibTable`] one joint at a time.
#[derive(Debug, Default)]
pub struct CalibTableBuilder {
    entries: [Vec<TableEntry>; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CalibTable {
    /// Start building a new table.
    pub fn builder() -> CalibTableBuilder {
        CalibTableBuilder::default()
    }

    /// Build a table calibrating a single joint from (desired, actual) samples.
    ///
    /// # Errors
    /// - `EmptyInput` if there are no samples.
    /// - `DuplicateAngle` if two samples share a desired angle.
    /// - `InvalidSample` if a sample is not finite or its desired angle is
    ///   outside of [0, 180] degrees.
    pub fn build(joint: JointId, samples: &[CalibSample]) -> Result<Self, CalibError> {
        Ok(Self::builder().joint(joint, samples)?.build())
    }

    /// Build a table calibrating both joints from the rows of a calibration
    /// sweep.
    pub fn from_rows(rows: &[CalibRow]) -> Result<Self, CalibError> {
        let mut builder = Self::builder();

        for joint in JointId::ALL.iter() {
            let samples: Vec<CalibSample> = rows.iter().map(|r| r.sample(*joint)).collect();
            builder = builder.joint(*joint, &samples)?;
        }

        Ok(builder.build())
    }

    /// The entries for a joint, sorted by ascending desired angle.
    pub fn entries(&self, joint: JointId) -> &[TableEntry] {
        &self.entries[joint.index()]
    }

    /// True if the joint has no calibration entries.
    pub fn is_empty(&self, joint: JointId) -> bool {
        self.entries[joint.index()].is_empty()
    }

    /// The smallest and largest calibrated desired angle of a joint, or `None`
    /// if the joint has no entries.
    pub fn range(&self, joint: JointId) -> Option<(f64, f64)> {
        let entries = self.entries(joint);

        match (entries.first(), entries.last()) {
            (Some(first), Some(last)) => Some((first.desired_deg, last.desired_deg)),
            _ => None,
        }
    }
}

impl CalibTableBuilder {
    /// Set the entries of a joint from (desired, actual) samples, replacing
    /// any entries previously set for it.
    pub fn joint(self, joint: JointId, samples: &[CalibSample]) -> Result<Self, CalibError> {
        // Validate the raw samples so the error reports the measured angle
        for s in samples {
            check_sample(joint, s.desired_deg, s.actual_deg)?;
        }

        self.joint_errors(
            joint,
            samples
                .iter()
                .map(|s| TableEntry {
                    desired_deg: s.desired_deg,
                    error_deg: s.actual_deg - s.desired_deg,
                })
                .collect(),
        )
    }

    /// Set the entries of a joint from precomputed (desired, error) pairs,
    /// replacing any entries previously set for it.
    pub fn joint_errors(
        mut self,
        joint: JointId,
        mut entries: Vec<TableEntry>,
    ) -> Result<Self, CalibError> {
        if entries.is_empty() {
            return Err(CalibError::EmptyInput(joint));
        }

        for e in entries.iter() {
            check_sample(joint, e.desired_deg, e.desired_deg + e.error_deg)?;
        }

        // All values are finite at this point so the ordering is total
        entries.sort_by(|a, b| {
            a.desired_deg
                .partial_cmp(&b.desired_deg)
                .unwrap_or(Ordering::Equal)
        });

        if let Some(pair) = entries
            .windows(2)
            .find(|pair| pair[0].desired_deg == pair[1].desired_deg)
        {
            return Err(CalibError::DuplicateAngle {
                joint,
                desired_deg: pair[0].desired_deg,
            });
        }

        debug!(
            "Calibrated {} with {} entries over [{}, {}] deg",
            joint,
            entries.len(),
            entries[0].desired_deg,
            entries[entries.len() - 1].desired_deg
        );

        self.entries[joint.index()] = entries;

        Ok(self)
    }

    /// Finish building the table.
    pub fn build(self) -> CalibTable {
        CalibTable {
            entries: self.entries,
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_sample(joint: JointId, desired_deg: f64, actual_deg: f64) -> Result<(), CalibError> {
    if desired_deg.is_finite()
        && actual_deg.is_finite()
        && desired_deg >= MIN_CALIB_ANGLE_DEG
        && desired_deg <= MAX_CALIB_ANGLE_DEG
    {
        Ok(())
    } else {
        Err(CalibError::InvalidSample {
            joint,
            desired_deg,
            actual_deg,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn samples(pairs: &[(f64, f64)]) -> Vec<CalibSample> {
        pairs.iter().map(|(d, a)| CalibSample::new(*d, *a)).collect()
    }

    #[test]
    fn test_build_sorts_and_computes_errors() {
        let table = CalibTable::build(
            JointId::Shoulder,
            &samples(&[(90.0, 88.5), (0.0, 1.0), (180.0, 181.0)]),
        )
        .unwrap();

        assert_eq!(
            table.entries(JointId::Shoulder),
            &[
                TableEntry {
                    desired_deg: 0.0,
                    error_deg: 1.0
                },
                TableEntry {
                    desired_deg: 90.0,
                    error_deg: -1.5
                },
                TableEntry {
                    desired_deg: 180.0,
                    error_deg: 1.0
                },
            ]
        );
        assert_eq!(table.range(JointId::Shoulder), Some((0.0, 180.0)));

        // Only the given joint is calibrated
        assert!(table.is_empty(JointId::Elbow));
        assert_eq!(table.range(JointId::Elbow), None);
    }

    #[test]
    fn test_build_empty_input() {
        assert_eq!(
            CalibTable::build(JointId::Elbow, &[]),
            Err(CalibError::EmptyInput(JointId::Elbow))
        );
    }

    #[test]
    fn test_build_duplicate_angle() {
        assert_eq!(
            CalibTable::build(
                JointId::Shoulder,
                &samples(&[(10.0, 11.0), (20.0, 19.0), (10.0, 10.5)])
            ),
            Err(CalibError::DuplicateAngle {
                joint: JointId::Shoulder,
                desired_deg: 10.0
            })
        );
    }

    #[test]
    fn test_build_invalid_samples() {
        for (d, a) in &[
            (-1.0, 0.0),
            (181.0, 180.0),
            (std::f64::NAN, 10.0),
            (10.0, std::f64::INFINITY),
        ] {
            assert!(matches!(
                CalibTable::build(JointId::Shoulder, &samples(&[(*d, *a)])),
                Err(CalibError::InvalidSample { .. })
            ));
        }
    }

    #[test]
    fn test_from_rows() {
        let rows = [
            CalibRow {
                desired_deg: 0.0,
                actual_shoulder_deg: 0.5,
                actual_elbow_deg: -0.5,
            },
            CalibRow {
                desired_deg: 10.0,
                actual_shoulder_deg: 11.0,
                actual_elbow_deg: 9.0,
            },
        ];

        let table = CalibTable::from_rows(&rows).unwrap();

        let shoulder: Vec<f64> = table
            .entries(JointId::Shoulder)
            .iter()
            .map(|e| e.error_deg)
            .collect();
        let elbow: Vec<f64> = table
            .entries(JointId::Elbow)
            .iter()
            .map(|e| e.error_deg)
            .collect();

        assert_eq!(shoulder, vec![0.5, 1.0]);
        assert_eq!(elbow, vec![-0.5, -1.0]);
    }

    #[test]
    fn test_joint_replaced() {
        let table = CalibTable::builder()
            .joint(JointId::Elbow, &samples(&[(0.0, 1.0)]))
            .unwrap()
            .joint(JointId::Elbow, &samples(&[(30.0, 32.0), (60.0, 61.0)]))
            .unwrap()
            .build();

        assert_eq!(table.entries(JointId::Elbow).len(), 2);
        assert_eq!(table.range(JointId::Elbow), Some((30.0, 60.0)));
    }
}
