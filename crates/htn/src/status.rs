//! Status values exchanged between the executor and operators.

/// The result of ticking a primitive task's operator.
///
/// # Tick Semantics
///
/// Unlike planning, execution may span several simulation ticks:
/// - `Running` suspends the plan on the current task; the executor calls the
///   operator again on the next tick without advancing the cursor
/// - `Success` and `Failure` resolve the task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// The task completed; its effects are applied to the live blackboard.
    Success,

    /// The task could not be completed; the remaining plan is discarded.
    Failure,

    /// The task needs more ticks (e.g. still walking to the target).
    Running,
}

impl TaskStatus {
    /// Returns `true` if this status is `Success`.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, TaskStatus::Success)
    }

    /// Returns `true` if this status is `Failure`.
    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, TaskStatus::Failure)
    }

    /// Returns `true` if the task has not resolved yet.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, TaskStatus::Running)
    }
}

/// Why an operator is being shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ShutdownReason {
    /// The task returned `Success`.
    Finished,

    /// The task returned `Failure`, or was no longer eligible when it
    /// became current.
    Failed,

    /// A periodic re-plan found a plan ranked above the running one.
    BetterPlan,

    /// The goal changed, the agent was invalidated, or it was deactivated.
    Interrupted,
}
