//! Per-agent AI controller state.

use htn::{Blackboard, ExecutorConfig, PlanExecutor};

/// What an active agent owns: its beliefs and its plan executor.
///
/// Created empty on activation and dropped on deactivation; nothing in it
/// is shared with other agents.
#[derive(Debug)]
pub struct NpcController {
    pub(crate) blackboard: Blackboard,
    pub(crate) executor: PlanExecutor,
}

impl NpcController {
    pub(crate) fn new(blackboard: Blackboard, config: ExecutorConfig) -> Self {
        Self {
            blackboard,
            executor: PlanExecutor::new(config),
        }
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    /// Mutable access for collaborators that push facts directly instead of
    /// through a provider.
    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn executor(&self) -> &PlanExecutor {
        &self.executor
    }
}
