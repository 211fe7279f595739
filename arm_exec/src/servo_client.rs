//! # Servo Client
//!
//! This module provides the interface used to send joint demands to the servo
//! driver. No driver protocol is implemented yet, so the only client logs the
//! demands it would have sent.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::servo::{JointId, ServoDems, ServoDemsResponse, NUM_JOINTS};
use log::{debug, info, warn};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for sending demands to the servos.
pub trait ServoClient {
    /// Send demands to the servo driver, returning the driver's response.
    fn send(&mut self, dems: &ServoDems) -> Result<ServoDemsResponse, ServoClientError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A servo client which logs the demands instead of sending them.
#[derive(Default)]
pub struct LogServoClient {
    num_sent: u64,

    last_dems: Option<ServoDems>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ServoClientError {
    #[error("Could not serialize the demands: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LogServoClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of demands accepted by this client.
    pub fn num_sent(&self) -> u64 {
        self.num_sent
    }

    /// The last demands accepted by this client.
    pub fn last_dems(&self) -> Option<&ServoDems> {
        self.last_dems.as_ref()
    }
}

impl ServoClient for LogServoClient {
    fn send(&mut self, dems: &ServoDems) -> Result<ServoDemsResponse, ServoClientError> {
        // Reject missing or non-finite demands
        let mut angles_deg = [0f64; NUM_JOINTS];
        for joint in JointId::ALL.iter() {
            match dems.get(*joint) {
                Some(a) if a.is_finite() => angles_deg[joint.index()] = a,
                other => {
                    warn!("Rejecting invalid {} demand: {:?}", joint, other);
                    return Ok(ServoDemsResponse::DemsInvalid);
                }
            }
        }

        // Payload a real driver link would carry
        let payload = serde_json::to_string(dems).map_err(ServoClientError::SerializationError)?;
        debug!("Servo demands payload: {}", payload);

        info!(
            "Sending compensated angles: shoulder {:.3} deg, elbow {:.3} deg",
            angles_deg[JointId::Shoulder.index()],
            angles_deg[JointId::Elbow.index()]
        );

        self.num_sent += 1;
        self.last_dems = Some(dems.clone());

        Ok(ServoDemsResponse::DemsOk)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_log_client_accepts_valid_dems() {
        let mut client = LogServoClient::new();
        let dems = ServoDems::from_angles([10.0, 170.0]);

        assert_eq!(client.send(&dems).unwrap(), ServoDemsResponse::DemsOk);
        assert_eq!(client.num_sent(), 1);
        assert_eq!(client.last_dems(), Some(&dems));
    }

    #[test]
    fn test_log_client_rejects_invalid_dems() {
        let mut client = LogServoClient::new();

        let mut dems = ServoDems::from_angles([10.0, std::f64::NAN]);
        assert_eq!(client.send(&dems).unwrap(), ServoDemsResponse::DemsInvalid);

        dems.angle_deg.remove(&JointId::Elbow);
        dems.angle_deg.insert(JointId::Shoulder, 20.0);
        assert_eq!(client.send(&dems).unwrap(), ServoDemsResponse::DemsInvalid);

        assert_eq!(client.num_sent(), 0);
        assert_eq!(client.last_dems(), None);
    }
}
