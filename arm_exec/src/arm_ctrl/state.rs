//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

// Internal
use super::{ArmCtrlError, ArmCtrlInitError, Params};
use crate::calib::{CalibTable, JointId};
use comms_if::{
    eqpt::servo::{ServoDems, NUM_JOINTS},
    tc::arm_ctrl::ArmCmd,
};
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// How far an inverse kinematics solution may sit outside a joint limit and
/// still be clamped onto it rather than rejected.
const IK_LIMIT_TOLERANCE_DEG: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state
#[derive(Default)]
pub struct ArmCtrl {
    pub(crate) params: Params,

    pub(crate) links: Option<crate::kinematics::LinkLengths>,

    pub(crate) calib_table: Option<CalibTable>,

    pub(crate) report: StatusReport,

    pub(crate) current_cmd: Option<ArmCmd>,

    /// Limited but uncompensated joint angles of the current output.
    pub(crate) target_angles_deg: Option<[f64; NUM_JOINTS]>,

    pub(crate) output: Option<ServoDems>,
}

/// Initialisation data for Arm Control.
pub struct InitData {
    /// Path to the parameter file, relative to the params directory.
    pub params_file: String,

    /// The calibration table to use. If `None` the table described in the
    /// parameters is loaded, if there is one.
    pub calib_table: Option<CalibTable>,
}

/// Input data to Arm Control.
#[derive(Default)]
pub struct InputData {
    /// The command to be executed, or `None` if there is no new command on
    /// this cycle.
    pub cmd: Option<ArmCmd>,
}

/// Status report for ArmCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug, PartialEq)]
pub struct StatusReport {
    /// Set if the joint's target was clamped to its angle limits.
    pub angle_limited: [bool; NUM_JOINTS],

    /// Set if the joint's demand was compensated using the calibration table.
    pub compensated: [bool; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for ArmCtrl {
    type InitData = InitData;
    type InitError = ArmCtrlInitError;

    type InputData = InputData;
    type OutputData = ServoDems;
    type StatusReport = StatusReport;
    type ProcError = ArmCtrlError;

    /// Initialise the ArmCtrl module.
    ///
    /// The calibration table in use is archived into the session.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        let params: Params = params::load(&init_data.params_file)?;

        let calib_table = match (init_data.calib_table, &params.calib) {
            (Some(t), _) => Some(t),
            (None, Some(source)) => Some(source.load()?),
            (None, None) => None,
        };

        *self = Self::new(params, calib_table)?;

        session.save("arm_ctrl/params.json", self.params.clone());
        if let Some(ref t) = self.calib_table {
            session.save("arm_ctrl/calib_table.json", t.clone());
        }

        Ok(())
    }

    /// Perform cyclic processing of Arm Control.
    ///
    /// If the new command cannot be executed the error is returned and the
    /// previous output is kept.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if self.links.is_none() {
            return Err(ArmCtrlError::NotInitialised);
        }

        // Clear the status report
        self.report = StatusReport::default();

        // Check to see if there's a new command
        if let Some(cmd) = &input_data.cmd {
            self.current_cmd = Some(cmd.clone());

            debug!("New ArmCtrl ArmCmd::{:?}", cmd);

            self.exec_current_cmd()?;
        }

        Ok((self.current_output(), self.report))
    }
}

impl ArmCtrl {
    /// Create a new initialised instance without a session.
    pub fn new(params: Params, calib_table: Option<CalibTable>) -> Result<Self, ArmCtrlInitError> {
        let links = params.link_lengths()?;

        for joint in JointId::ALL.iter() {
            let i = joint.index();
            let (min_deg, max_deg) = (params.min_angle_deg[i], params.max_angle_deg[i]);

            if !(min_deg <= max_deg) || !min_deg.is_finite() || !max_deg.is_finite() {
                return Err(ArmCtrlInitError::InvalidLimits {
                    joint: *joint,
                    min_deg,
                    max_deg,
                });
            }
        }

        match calib_table {
            Some(ref t) => {
                for joint in JointId::ALL.iter() {
                    match t.range(*joint) {
                        Some((min, max)) => {
                            info!("{} calibrated over [{}, {}] deg", joint, min, max)
                        }
                        None => warn!("{} is not calibrated, demands will not be compensated", joint),
                    }
                }
            }
            None => warn!("No calibration table, demands will not be compensated"),
        }

        Ok(Self {
            params,
            links: Some(links),
            calib_table,
            ..Default::default()
        })
    }

    /// Function called when entering safe mode.
    ///
    /// Must result in no motion of the arm. Returns the demands to hold.
    pub fn make_safe(&mut self) -> ServoDems {
        self.current_cmd = Some(ArmCmd::Stop);
        self.report = StatusReport::default();
        self.calc_stop();

        self.current_output()
    }

    /// The current output, or the default angles if nothing has been output
    /// yet.
    fn current_output(&self) -> ServoDems {
        match self.output {
            Some(ref o) => o.clone(),
            None => ServoDems::from_angles(self.params.default_angle_deg),
        }
    }

    /// Execute the current command, updating the target and the output.
    ///
    /// Nothing is modified if the command fails.
    fn exec_current_cmd(&mut self) -> Result<(), ArmCtrlError> {
        let target_deg = match self.current_cmd {
            Some(ArmCmd::Stop) | None => {
                self.calc_stop();
                return Ok(());
            }
            Some(ArmCmd::BasicRotation {
                shoulder_deg,
                elbow_deg,
            }) => [shoulder_deg, elbow_deg],
            Some(ArmCmd::InverseKinematics { x, y }) => {
                let angles_deg = self.calc_inverse_kinematics(x, y)?;
                self.check_ik_limits(&angles_deg)?;
                angles_deg
            }
        };

        for joint in JointId::ALL.iter() {
            if !target_deg[joint.index()].is_finite() {
                return Err(ArmCtrlError::NonFiniteDemand(*joint));
            }
        }

        let limited_deg = self.enforce_limits(target_deg);
        let dems_deg = self.compensate(limited_deg)?;

        self.target_angles_deg = Some(limited_deg);
        self.output = Some(ServoDems::from_angles(dems_deg));

        Ok(())
    }

    /// Check an inverse kinematics solution against the joint limits.
    ///
    /// Clamping a solution would move the head of the arm away from the
    /// target, so solutions outside the limits are rejected.
    fn check_ik_limits(&self, angles_deg: &[f64; NUM_JOINTS]) -> Result<(), ArmCtrlError> {
        for joint in JointId::ALL.iter() {
            let i = joint.index();
            let min_deg = self.params.min_angle_deg[i];
            let max_deg = self.params.max_angle_deg[i];

            if angles_deg[i] < min_deg - IK_LIMIT_TOLERANCE_DEG
                || angles_deg[i] > max_deg + IK_LIMIT_TOLERANCE_DEG
            {
                return Err(ArmCtrlError::OutsideJointLimits {
                    joint: *joint,
                    angle_deg: angles_deg[i],
                    min_deg,
                    max_deg,
                });
            }
        }

        Ok(())
    }

    /// Enforce the angle limits of each joint.
    ///
    /// If a limit is reached the corresponding flag in the status report will
    /// be raised.
    fn enforce_limits(&mut self, mut angles_deg: [f64; NUM_JOINTS]) -> [f64; NUM_JOINTS] {
        for joint in JointId::ALL.iter() {
            let i = joint.index();
            let limited = util::maths::clamp(
                &angles_deg[i],
                &self.params.min_angle_deg[i],
                &self.params.max_angle_deg[i],
            );

            if limited != angles_deg[i] {
                warn!(
                    "{} demand {} deg limited to {} deg",
                    joint, angles_deg[i], limited
                );
                angles_deg[i] = limited;
                self.report.angle_limited[i] = true;
            }
        }

        angles_deg
    }

    /// Compensate the angles of each calibrated joint.
    ///
    /// Joints with no entries in the calibration table are passed through.
    fn compensate(&mut self, angles_deg: [f64; NUM_JOINTS]) -> Result<[f64; NUM_JOINTS], ArmCtrlError> {
        let table = match self.calib_table {
            Some(ref t) => t,
            None => return Ok(angles_deg),
        };

        let mut comp_deg = angles_deg;
        let mut compensated = [false; NUM_JOINTS];

        for joint in JointId::ALL.iter() {
            let i = joint.index();
            if !table.is_empty(*joint) {
                comp_deg[i] = table.compensate(*joint, angles_deg[i])?;
                compensated[i] = true;
            }
        }

        // Only flag once every joint has succeeded
        self.report.compensated = compensated;

        Ok(comp_deg)
    }

    /// Perform the stop command.
    ///
    /// The stop command holds the last output. If there has been no output
    /// yet the default angles are output, compensated if possible.
    ///
    /// Stop shall never error.
    fn calc_stop(&mut self) {
        if self.output.is_some() {
            return;
        }

        let limited_deg = self.enforce_limits(self.params.default_angle_deg);
        let dems_deg = match self.compensate(limited_deg) {
            Ok(d) => d,
            Err(e) => {
                warn!("Cannot compensate the default angles, holding them uncompensated: {}", e);
                self.report.compensated = [false; NUM_JOINTS];
                limited_deg
            }
        };

        self.target_angles_deg = Some(limited_deg);
        self.output = Some(ServoDems::from_angles(dems_deg));
    }
}
