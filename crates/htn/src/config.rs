/// Search guards for the planner.
///
/// Planning always completes within the tick that starts it, so these limits
/// bound the worst-case cost of a single `plan()` call.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    /// Maximum nesting of compound task expansions (the root goal is depth 1).
    pub max_depth: usize,

    /// Maximum number of methods attempted in one search, across all levels.
    pub max_methods: usize,

    /// Optional ceiling on the accumulated cost of a plan. An expansion that
    /// would exceed it is abandoned like an ineligible subtask.
    pub max_plan_cost: Option<u32>,
}

impl PlannerConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 32;
    pub const DEFAULT_MAX_METHODS: usize = 1024;

    pub fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_methods: Self::DEFAULT_MAX_METHODS,
            max_plan_cost: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_methods(mut self, max_methods: usize) -> Self {
        self.max_methods = max_methods;
        self
    }

    pub fn with_max_plan_cost(mut self, max_plan_cost: u32) -> Self {
        self.max_plan_cost = Some(max_plan_cost);
        self
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Tunables for the per-agent plan executor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExecutorConfig {
    /// While executing, re-plan every this many ticks and switch to the new
    /// plan if it ranks above the running one. `None` disables it.
    pub replan_interval: Option<u32>,
}

impl ExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replan_interval(mut self, ticks: u32) -> Self {
        self.replan_interval = Some(ticks);
        self
    }
}
