//! Operator prompt used to read measured angles during a calibration session

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use rustyline::{error::ReadlineError, DefaultEditor};

// Internal
use super::{
    session::{CalibSessionError, MeasurementSource},
    JointId,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Reads measured angles typed in by the operator.
pub struct PromptSource {
    rl: DefaultEditor,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PromptSource {
    pub fn new() -> Result<Self, CalibSessionError> {
        Ok(Self {
            rl: DefaultEditor::new().map_err(|e| CalibSessionError::Measurement(e.to_string()))?,
        })
    }
}

impl MeasurementSource for PromptSource {
    fn measure(&mut self, joint: JointId, desired_deg: f64) -> Result<f64, CalibSessionError> {
        let prompt = format!(
            "Enter measured angle for the {} (desired {} deg): ",
            joint, desired_deg
        );

        loop {
            match self.rl.readline(&prompt) {
                Ok(line) => match parse_measurement(&line) {
                    Some(a) => return Ok(a),
                    None => warn!("Invalid measurement {:?}, enter a number of degrees", line),
                },
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    return Err(CalibSessionError::Aborted)
                }
                Err(e) => return Err(CalibSessionError::Measurement(e.to_string())),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn parse_measurement(line: &str) -> Option<f64> {
    match line.trim().parse::<f64>() {
        Ok(a) if a.is_finite() => Some(a),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_measurement() {
        assert_eq!(parse_measurement("90"), Some(90.0));
        assert_eq!(parse_measurement("  -1.25 \n"), Some(-1.25));

        assert_eq!(parse_measurement(""), None);
        assert_eq!(parse_measurement("ninety"), None);
        assert_eq!(parse_measurement("NaN"), None);
        assert_eq!(parse_measurement("inf"), None);
    }
}
