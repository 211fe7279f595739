//! # Arm library.
//!
//! This library allows other crates in the workspace to access items defined inside the arm
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm control module - converts arm commands into compensated servo demands
pub mod arm_ctrl;

/// Calibration - builds calibration tables from measurements and compensates demands with them
pub mod calib;

/// Kinematics - solves the joint angles placing the head of the arm at a target
pub mod kinematics;

/// Executable parameters
pub mod params;

/// Servo client - sends joint demands to the servo driver
pub mod servo_client;
