//! Driver states, failure reasons and the error type.

/// States of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum State {
    /// Idle, no measurement has been started yet.
    Ready,
    /// Measurement requested, the trigger pulse starts on the next tick.
    WaitingForTrigger,
    /// The trigger pulse is being emitted.
    TriggerUp,
    /// Trigger pulse done, waiting for the echo rising edge.
    WaitingForEcho,
    /// Echo line is high, waiting for the falling edge.
    EchoUp,
    /// The echo fell within the timeout. Distance is valid.
    Finished,
    /// Timeout or an edge that does not fit the protocol.
    Failed,
}

impl State {
    /// A new measurement may be started from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Ready | State::Finished | State::Failed)
    }

    /// A measurement is in flight.
    pub fn is_measuring(&self) -> bool {
        !self.is_terminal()
    }

    /// The last measurement has completed, successfully or not.
    pub fn is_finished(&self) -> bool {
        matches!(self, State::Finished | State::Failed)
    }
}

/// Why a measurement ended in [`State::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum FailureReason {
    /// No falling edge within the echo timeout.
    EchoTimeout,
    /// The echo line was low when a rise was expected, or high when a fall was expected.
    ProtocolViolation,
    /// Driving the trigger line or sampling the echo line returned an error.
    Pin,
}

/// Errors returned by the driver API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Error {
    /// A measurement is already in flight. Retry once it has finished.
    Busy,
    /// The shared slot has no sensor installed yet.
    Uninitialized,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [State; 7] = [
        State::Ready,
        State::WaitingForTrigger,
        State::TriggerUp,
        State::WaitingForEcho,
        State::EchoUp,
        State::Finished,
        State::Failed,
    ];

    #[test]
    fn only_idle_and_outcome_states_are_terminal() {
        for state in ALL {
            let expected = matches!(state, State::Ready | State::Finished | State::Failed);
            assert_eq!(state.is_terminal(), expected, "{:?}", state);
            assert_eq!(state.is_measuring(), !expected, "{:?}", state);
        }
    }

    #[test]
    fn ready_is_not_finished() {
        assert!(!State::Ready.is_finished());
        assert!(State::Finished.is_finished());
        assert!(State::Failed.is_finished());
        assert!(!State::EchoUp.is_finished());
    }
}
