//! Desired actuator state shared by all requests of one gateway.
//!
//! The register starts OFF and only changes when a request body carries a
//! valid directive. It is owned by the [`Gateway`](crate::Gateway) and passed
//! by reference through the pipeline, so independent gateways (and tests)
//! never share state. Requests are processed strictly one after another;
//! a gateway that handles connections in parallel must wrap this in a lock
//! together with the controller connection.

use crate::body::ActuatorDirective;

/// Desired on/off state of the brewing actuator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorState {
    desired_on: bool,
}

impl ActuatorState {
    /// Creates a register in the OFF state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the desired state.
    pub fn desired_on(&self) -> bool {
        self.desired_on
    }

    /// Overwrites the desired state.
    pub fn set_desired_on(&mut self, on: bool) {
        self.desired_on = on;
    }

    /// Applies a directive to the register.
    pub fn apply(&mut self, directive: ActuatorDirective) {
        self.set_desired_on(directive.is_on());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_off() {
        assert!(!ActuatorState::new().desired_on());
    }

    #[test]
    fn test_apply_directives() {
        let mut state = ActuatorState::new();
        state.apply(ActuatorDirective::Start);
        assert!(state.desired_on());
        state.apply(ActuatorDirective::Stop);
        assert!(!state.desired_on());
        state.apply(ActuatorDirective::Stop);
        assert!(!state.desired_on());
    }
}
