//! # Arm Executable Parameters
//!
//! This module provide parameters for the arm executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::calib::session::CalibSessionParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ArmExecParams {
    /// Directory calibration files are written to, relative to the software root
    pub calib_dir: String,

    /// History file for the interactive console, relative to the software root
    pub console_history_path: String,

    /// Most verbose level to log at, one of "info", "debug" or "trace"
    pub log_level: String,

    /// Parameters for the calibration sweep
    #[serde(default)]
    pub calib_session: CalibSessionParams,
}
