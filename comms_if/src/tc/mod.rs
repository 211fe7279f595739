//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface. Telecommands are written as whitespace separated command lines
//! (for example `ik 120 35`) and parsed with `structopt`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod arm_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use structopt::{clap, StructOpt};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC line is empty")]
    Empty,

    #[error("Invalid TC: {0}")]
    InvalidTc(clap::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse a telecommand from a single command line.
pub fn parse_line<T: StructOpt>(line: &str) -> Result<T, TcParseError> {
    if line.trim().is_empty() {
        return Err(TcParseError::Empty);
    }

    // Clap expects the first argument to be the binary name
    T::from_iter_safe(std::iter::once("tc").chain(line.split_whitespace()))
        .map_err(TcParseError::InvalidTc)
}
