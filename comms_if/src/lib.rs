//! # Communications interface crate.
//!
//! Provides the interface types shared between the arm control modules, the
//! calibration tooling and the servo client.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommand definitions (commands issued to the arm)
pub mod tc;

/// Command and response definitions for equipment (like servos)
pub mod eqpt;
