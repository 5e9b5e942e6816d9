use htn::{ExecutorConfig, PlannerConfig};

/// Runtime configuration shared by every agent of an [`NpcSystem`](crate::NpcSystem).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RuntimeConfig {
    /// Upper bound on agents advanced per [`update`](crate::NpcSystem::update).
    /// Agents skipped because of it go first on the next tick. Zero is
    /// treated as one.
    pub max_updates_per_tick: usize,

    pub planner: PlannerConfig,

    pub executor: ExecutorConfig,
}

impl RuntimeConfig {
    pub const DEFAULT_MAX_UPDATES_PER_TICK: usize = 64;

    pub fn new() -> Self {
        Self {
            max_updates_per_tick: Self::DEFAULT_MAX_UPDATES_PER_TICK,
            planner: PlannerConfig::default(),
            executor: ExecutorConfig::default(),
        }
    }

    pub fn with_max_updates_per_tick(mut self, max: usize) -> Self {
        self.max_updates_per_tick = max;
        self
    }

    pub fn with_planner(mut self, planner: PlannerConfig) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_executor(mut self, executor: ExecutorConfig) -> Self {
        self.executor = executor;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}
