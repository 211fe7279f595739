//! # Calibration session
//!
//! A calibration session sweeps both servos through a range of desired
//! angles. At each angle the demand is sent to the servos and the angle each
//! joint actually reached is collected from a [`MeasurementSource`], usually
//! an operator reading a protractor on the test jig.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::eqpt::servo::{ServoDems, ServoDemsResponse, NUM_JOINTS};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Internal
use super::{file::CalibFileError, *};
use crate::servo_client::{ServoClient, ServoClientError};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Provides the measured angle of a joint after it has been commanded.
pub trait MeasurementSource {
    /// Measure the angle the joint reached when commanded to `desired_deg`.
    fn measure(&mut self, joint: JointId, desired_deg: f64) -> Result<f64, CalibSessionError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of a calibration sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibSessionParams {
    /// First desired angle of the sweep.
    ///
    /// Units: degrees
    pub start_deg: f64,

    /// Last desired angle of the sweep, included if it falls on a step.
    ///
    /// Units: degrees
    pub end_deg: f64,

    /// Spacing between desired angles.
    ///
    /// Units: degrees
    pub step_deg: f64,
}

/// A calibration session driving the servos through `client` and reading
/// measurements from `source`.
pub struct CalibSession<S, C> {
    params: CalibSessionParams,

    source: S,

    client: C,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur during a calibration session.
#[derive(Debug, thiserror::Error)]
pub enum CalibSessionError {
    #[error(
        "Invalid calibration sweep from {start_deg} to {end_deg} deg in steps of {step_deg} \
        deg, the sweep must be increasing and within [0, 180] deg"
    )]
    InvalidSweep {
        start_deg: f64,
        end_deg: f64,
        step_deg: f64,
    },

    #[error("Calibration aborted by the operator")]
    Aborted,

    #[error("Could not read a measurement: {0}")]
    Measurement(String),

    #[error("Could not send the calibration demand: {0}")]
    Servo(#[from] ServoClientError),

    #[error("The servo driver rejected the calibration demand: {0:?}")]
    DemsRejected(ServoDemsResponse),

    #[error("Could not write the calibration file: {0}")]
    File(#[from] CalibFileError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for CalibSessionParams {
    fn default() -> Self {
        Self {
            start_deg: 0.0,
            end_deg: 180.0,
            step_deg: 10.0,
        }
    }
}

impl CalibSessionParams {
    /// The desired angles of the sweep, in order.
    pub fn sweep_angles(&self) -> Result<Vec<f64>, CalibSessionError> {
        let invalid = || CalibSessionError::InvalidSweep {
            start_deg: self.start_deg,
            end_deg: self.end_deg,
            step_deg: self.step_deg,
        };

        if !(self.step_deg > 0.0)
            || !(self.start_deg >= MIN_CALIB_ANGLE_DEG)
            || !(self.end_deg <= MAX_CALIB_ANGLE_DEG)
            || !(self.start_deg <= self.end_deg)
        {
            return Err(invalid());
        }

        // Angles are computed from the index so the steps don't accumulate
        // rounding error. Rounding can still carry the last angle just past
        // the end, so angles are clamped to it.
        let num_steps = ((self.end_deg - self.start_deg) / self.step_deg + 1e-9).floor() as usize;

        let mut angles: Vec<f64> = (0..=num_steps)
            .map(|i| (self.start_deg + (i as f64) * self.step_deg).min(self.end_deg))
            .collect();
        angles.dedup();

        Ok(angles)
    }
}

impl<S, C> CalibSession<S, C>
where
    S: MeasurementSource,
    C: ServoClient,
{
    pub fn new(params: CalibSessionParams, source: S, client: C) -> Self {
        Self {
            params,
            source,
            client,
        }
    }

    /// Run the calibration sweep, returning one row per desired angle.
    pub fn run(&mut self) -> Result<Vec<CalibRow>, CalibSessionError> {
        let angles = self.params.sweep_angles()?;
        let mut rows = Vec::with_capacity(angles.len());

        info!("Starting calibration sweep over {} angles", angles.len());

        for desired_deg in angles {
            info!("Send desired angle: {}", desired_deg);

            match self
                .client
                .send(&ServoDems::from_angles([desired_deg; NUM_JOINTS]))?
            {
                ServoDemsResponse::DemsOk => (),
                r => return Err(CalibSessionError::DemsRejected(r)),
            }

            let actual_shoulder_deg = self.source.measure(JointId::Shoulder, desired_deg)?;
            let actual_elbow_deg = self.source.measure(JointId::Elbow, desired_deg)?;

            rows.push(CalibRow {
                desired_deg,
                actual_shoulder_deg,
                actual_elbow_deg,
            });
        }

        info!("Calibration sweep complete");

        Ok(rows)
    }

    /// Consume the session, returning the measurement source and servo client.
    pub fn into_parts(self) -> (S, C) {
        (self.source, self.client)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Name of the calibration file for a test jig.
pub fn calib_file_name(jig_id: &str) -> String {
    format!("calibration_data_{}.txt", jig_id)
}

/// Save the rows of a calibration sweep into `calib_dir`, returning the path
/// of the written file.
pub fn save_rows<P: AsRef<Path>>(
    calib_dir: P,
    jig_id: &str,
    rows: &[CalibRow],
) -> Result<PathBuf, CalibSessionError> {
    std::fs::create_dir_all(calib_dir.as_ref())
        .map_err(|e| CalibFileError::Open(calib_dir.as_ref().to_path_buf(), e))?;

    let path = calib_dir.as_ref().join(calib_file_name(jig_id));
    file::save_csv(&path, rows)?;

    info!("Calibration data saved to {:?}", path);

    Ok(path)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::servo_client::LogServoClient;
    use std::collections::VecDeque;

    /// Measurements scripted ahead of time, recording what was asked for.
    struct ScriptedSource {
        readings: VecDeque<f64>,
        requests: Vec<(JointId, f64)>,
    }

    impl ScriptedSource {
        fn new(readings: &[f64]) -> Self {
            Self {
                readings: readings.iter().copied().collect(),
                requests: Vec::new(),
            }
        }
    }

    impl MeasurementSource for ScriptedSource {
        fn measure(&mut self, joint: JointId, desired_deg: f64) -> Result<f64, CalibSessionError> {
            self.requests.push((joint, desired_deg));
            self.readings.pop_front().ok_or(CalibSessionError::Aborted)
        }
    }

    /// A servo client which refuses everything.
    struct RejectingClient;

    impl ServoClient for RejectingClient {
        fn send(&mut self, _: &ServoDems) -> Result<ServoDemsResponse, ServoClientError> {
            Ok(ServoDemsResponse::EqptInvalid)
        }
    }

    fn params(start_deg: f64, end_deg: f64, step_deg: f64) -> CalibSessionParams {
        CalibSessionParams {
            start_deg,
            end_deg,
            step_deg,
        }
    }

    #[test]
    fn test_default_sweep() {
        let angles = CalibSessionParams::default().sweep_angles().unwrap();

        assert_eq!(angles.len(), 19);
        assert_eq!(angles[0], 0.0);
        assert_eq!(angles[9], 90.0);
        assert_eq!(angles[18], 180.0);
    }

    #[test]
    fn test_partial_sweep() {
        assert_eq!(
            params(15.0, 50.0, 10.0).sweep_angles().unwrap(),
            vec![15.0, 25.0, 35.0, 45.0]
        );
        assert_eq!(params(90.0, 90.0, 5.0).sweep_angles().unwrap(), vec![90.0]);
        assert_eq!(
            params(0.0, 0.3, 0.1).sweep_angles().unwrap().len(),
            4
        );
    }

    #[test]
    fn test_sweep_ends_within_range() {
        // 6 + 42 * (29 / 7) evaluates to 180.00000000000003
        let angles = params(6.0, 180.0, 29.0 / 7.0).sweep_angles().unwrap();

        assert_eq!(angles.len(), 43);
        assert_eq!(angles[0], 6.0);
        assert_eq!(*angles.last().unwrap(), 180.0);
        assert!(angles.windows(2).all(|w| w[0] < w[1]));

        // Every angle of the sweep must be accepted into a table
        let rows: Vec<CalibRow> = angles
            .iter()
            .map(|a| CalibRow {
                desired_deg: *a,
                actual_shoulder_deg: *a,
                actual_elbow_deg: *a,
            })
            .collect();
        assert!(CalibTable::from_rows(&rows).is_ok());

        let angles = params(0.0, 0.3, 0.1).sweep_angles().unwrap();
        assert_eq!(*angles.last().unwrap(), 0.3);
    }

    #[test]
    fn test_invalid_sweeps() {
        for p in &[
            params(0.0, 180.0, 0.0),
            params(0.0, 180.0, -10.0),
            params(-10.0, 180.0, 10.0),
            params(0.0, 190.0, 10.0),
            params(100.0, 90.0, 10.0),
            params(0.0, 180.0, std::f64::NAN),
        ] {
            assert!(matches!(
                p.sweep_angles(),
                Err(CalibSessionError::InvalidSweep { .. })
            ));
        }
    }

    #[test]
    fn test_run_session() {
        let source = ScriptedSource::new(&[0.5, -0.5, 10.8, 9.4, 21.0, 19.0]);
        let mut session = CalibSession::new(params(0.0, 20.0, 10.0), source, LogServoClient::new());

        let rows = session.run().unwrap();
        let (source, client) = session.into_parts();

        assert_eq!(
            rows,
            vec![
                CalibRow {
                    desired_deg: 0.0,
                    actual_shoulder_deg: 0.5,
                    actual_elbow_deg: -0.5
                },
                CalibRow {
                    desired_deg: 10.0,
                    actual_shoulder_deg: 10.8,
                    actual_elbow_deg: 9.4
                },
                CalibRow {
                    desired_deg: 20.0,
                    actual_shoulder_deg: 21.0,
                    actual_elbow_deg: 19.0
                },
            ]
        );

        // Shoulder is always measured before the elbow
        assert_eq!(
            source.requests,
            vec![
                (JointId::Shoulder, 0.0),
                (JointId::Elbow, 0.0),
                (JointId::Shoulder, 10.0),
                (JointId::Elbow, 10.0),
                (JointId::Shoulder, 20.0),
                (JointId::Elbow, 20.0),
            ]
        );

        // Each desired angle was sent to both servos
        assert_eq!(client.num_sent(), 3);
        assert_eq!(
            client.last_dems(),
            Some(&ServoDems::from_angles([20.0, 20.0]))
        );

        // And the sweep makes a valid table
        let table = CalibTable::from_rows(&rows).unwrap();
        let comp = table.compensate(JointId::Elbow, 10.0).unwrap();
        assert!((comp - 9.4).abs() < 1e-9);
    }

    #[test]
    fn test_run_aborted() {
        let source = ScriptedSource::new(&[0.5, -0.5, 10.8]);
        let mut session = CalibSession::new(params(0.0, 20.0, 10.0), source, LogServoClient::new());

        assert!(matches!(session.run(), Err(CalibSessionError::Aborted)));
    }

    #[test]
    fn test_run_rejected() {
        let source = ScriptedSource::new(&[0.0; 4]);
        let mut session = CalibSession::new(params(0.0, 10.0, 10.0), source, RejectingClient);

        assert!(matches!(
            session.run(),
            Err(CalibSessionError::DemsRejected(ServoDemsResponse::EqptInvalid))
        ));
    }

    #[test]
    fn test_save_rows() {
        let dir = std::env::temp_dir().join("arm_calib_session_test");
        let rows = vec![CalibRow {
            desired_deg: 0.0,
            actual_shoulder_deg: 1.0,
            actual_elbow_deg: 2.0,
        }];

        let path = save_rows(&dir, "jig01", &rows).unwrap();
        assert_eq!(path, dir.join("calibration_data_jig01.txt"));

        let read = file::read_csv(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(read, rows);
    }
}
