//! Translation of the desired actuator state into coil operations.
//!
//! [`ActuatorDriver`] opens a fresh controller connection per invocation,
//! writes the coil once and, if the write succeeded, reads back eight coils
//! from the same address. Failures are logged and returned inside the
//! [`ActuatorOutcome`]; nothing is retried and nothing panics.
//!
//! A failed read-back does not downgrade a successful write. The write is the
//! operation that moves the brewer; the read-back is only an observation.

use tracing::{info, warn};

use crate::client::{Client, ClientConfig};
use crate::error::ActuatorError;

/// Number of coils read back after a write.
pub const READ_BACK_COILS: u16 = 8;

/// Coil address of the brewer output on the testbed controller.
pub const DEFAULT_COIL_ADDRESS: u16 = 8225;

/// Result of one attempt to drive the actuator.
#[derive(Debug, Default)]
pub struct ActuatorOutcome {
    /// Whether a controller interaction was attempted.
    pub attempted: bool,
    /// Whether the coil write was acknowledged.
    pub write_succeeded: bool,
    /// Whether the read-back returned coil states.
    pub read_back_succeeded: bool,
    /// First coil state returned by the read-back.
    pub observed_on: Option<bool>,
    /// All coil states returned by the read-back.
    pub coils: Vec<bool>,
    /// The failure encountered, if any.
    pub error: Option<ActuatorError>,
}

impl ActuatorOutcome {
    /// Outcome for a write that never got through.
    pub fn write_failed(error: ActuatorError) -> Self {
        Self {
            attempted: true,
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Anything that can move the actuator to a desired state.
///
/// The pipeline depends on this seam rather than on a live controller, so it
/// can be exercised without one.
pub trait Actuator {
    /// Drives the actuator to `desired_on` and reports what happened.
    fn drive(&mut self, desired_on: bool) -> ActuatorOutcome;
}

/// Fixed downstream addressing for the actuator coil.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Controller connection parameters.
    pub client: ClientConfig,
    /// Address of the actuator coil.
    pub coil_address: u16,
}

impl DriverConfig {
    /// Creates a driver configuration for the default coil address.
    pub fn new(client: ClientConfig) -> Self {
        Self {
            client,
            coil_address: DEFAULT_COIL_ADDRESS,
        }
    }

    /// Sets the actuator coil address.
    pub fn with_coil_address(mut self, coil_address: u16) -> Self {
        self.coil_address = coil_address;
        self
    }
}

/// Modbus-backed actuator driver.
#[derive(Debug, Clone)]
pub struct ActuatorDriver {
    config: DriverConfig,
}

impl ActuatorDriver {
    /// Creates a driver. No connection is opened until [`Actuator::drive`].
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Returns the driver configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }
}

impl Actuator for ActuatorDriver {
    fn drive(&mut self, desired_on: bool) -> ActuatorOutcome {
        let address = self.config.coil_address;
        let mut client = match Client::connect(&self.config.client) {
            Ok(client) => client,
            Err(e) => {
                let error = ActuatorError::Unreachable(e);
                warn!(
                    controller = %self.config.client.controller_addr,
                    kind = error.kind(),
                    error = %error,
                    "controller unreachable"
                );
                return ActuatorOutcome::write_failed(error);
            }
        };
        let controller = client.controller_addr();

        if let Err(e) = client.write_single_coil(address, desired_on) {
            let error = if e.is_transport() {
                ActuatorError::Unreachable(e)
            } else {
                ActuatorError::WriteFailed(e)
            };
            warn!(
                %controller,
                address,
                value = desired_on,
                kind = error.kind(),
                error = %error,
                "failed to send {} signal",
                if desired_on { "ON" } else { "OFF" }
            );
            return ActuatorOutcome::write_failed(error);
        }
        info!(%controller, address, value = desired_on, "coil written");

        let mut outcome = ActuatorOutcome {
            attempted: true,
            write_succeeded: true,
            ..ActuatorOutcome::default()
        };
        match client.read_coils(address, READ_BACK_COILS) {
            Ok(coils) => {
                outcome.read_back_succeeded = true;
                outcome.observed_on = coils.first().copied();
                info!(
                    %controller,
                    address,
                    coils = %crate::utils::format_coils(&coils),
                    "coil status read back"
                );
                outcome.coils = coils;
            }
            Err(e) => {
                let error = ActuatorError::ReadFailed(e);
                warn!(%controller, address, kind = error.kind(), error = %error, "failed to check coil status");
                outcome.error = Some(error);
            }
        }
        outcome
    }
}
