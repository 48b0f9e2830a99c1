//! Command runner state machine.

/// Where the runner is in the per-command frame sequence.
///
/// A command moves the runner through
/// `Idle -> AwaitingStdout -> AwaitingStderr -> AwaitingStatus -> Idle`.
/// Frames are always harvested in that order, matching the order the
/// companion script writes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerState {
    /// Ready for the next command.
    #[default]
    Idle,
    /// Command sent, waiting for its stdout frame.
    AwaitingStdout,
    /// Waiting for the stderr frame.
    AwaitingStderr,
    /// Waiting for the exit status frame.
    AwaitingStatus,
    /// Input has been closed; the session is over.
    Closed,
}

impl RunnerState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Idle -> AwaitingStdout
    /// - AwaitingStdout -> AwaitingStderr
    /// - AwaitingStderr -> AwaitingStatus
    /// - AwaitingStatus -> Idle
    /// - any non-closed state -> Closed
    pub fn can_transition_to(&self, target: RunnerState) -> bool {
        use RunnerState::*;
        matches!(
            (*self, target),
            (Idle, AwaitingStdout)
                | (AwaitingStdout, AwaitingStderr)
                | (AwaitingStderr, AwaitingStatus)
                | (AwaitingStatus, Idle)
                | (Idle | AwaitingStdout | AwaitingStderr | AwaitingStatus, Closed)
        )
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns `Ok(())` if the transition is valid, or an error otherwise.
    pub fn transition_to(&mut self, target: RunnerState) -> crate::Result<()> {
        if self.can_transition_to(target) {
            tracing::trace!("runner: {:?} -> {:?}", self, target);
            *self = target;
            Ok(())
        } else {
            Err(crate::error::ShellError::InvalidStateTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Check if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunnerState::Closed)
    }

    /// Check if the runner can accept a new command.
    pub fn can_run(&self) -> bool {
        matches!(self, RunnerState::Idle)
    }

    /// Check if a command is in flight.
    pub fn is_awaiting(&self) -> bool {
        matches!(
            self,
            RunnerState::AwaitingStdout | RunnerState::AwaitingStderr | RunnerState::AwaitingStatus
        )
    }
}
