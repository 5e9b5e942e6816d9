//! Rendering of tick reports for the terminal.

use htn::{ExecutorEvent, TaskId};
use npc_runtime::TickReport;
use serde_json::{Value, json};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One line per event
    Text,
    /// One JSON object per event (JSON Lines)
    Json,
}

impl OutputFormat {
    pub fn render(self, report: &TickReport) -> Vec<String> {
        match self {
            OutputFormat::Text => report
                .events
                .iter()
                .map(|event| format!("[{:>3}] {}", report.tick, describe(event)))
                .collect(),
            OutputFormat::Json => report
                .events
                .iter()
                .map(|event| to_json(report.tick, event).to_string())
                .collect(),
        }
    }
}

fn join(tasks: &[TaskId]) -> String {
    tasks.iter().map(TaskId::as_str).collect::<Vec<_>>().join(" -> ")
}

pub fn describe(event: &ExecutorEvent) -> String {
    match event {
        ExecutorEvent::PlanFound {
            agent,
            goal,
            tasks,
            cost,
        } => format!("{agent} planned `{goal}`: {} (cost {cost})", join(tasks)),
        ExecutorEvent::PlanFailed { agent, goal, error } => {
            format!("{agent} cannot plan `{goal}`: {error}")
        }
        ExecutorEvent::PlanReplaced { agent, goal, tasks } => {
            format!("{agent} found a better plan for `{goal}`: {}", join(tasks))
        }
        ExecutorEvent::TaskStarted { agent, task } => format!("{agent} started {task}"),
        ExecutorEvent::TaskFinished { agent, task } => format!("{agent} finished {task}"),
        ExecutorEvent::TaskFailed {
            agent,
            task,
            reason,
        } => format!("{agent} {task} {reason}"),
        ExecutorEvent::GoalAchieved { agent, goal } => format!("{agent} achieved `{goal}`"),
    }
}

pub fn to_json(tick: u64, event: &ExecutorEvent) -> Value {
    let agent = event.agent().0;
    match event {
        ExecutorEvent::PlanFound {
            goal, tasks, cost, ..
        } => json!({
            "tick": tick, "event": "plan_found", "agent": agent,
            "goal": goal, "tasks": tasks, "cost": cost
        }),
        ExecutorEvent::PlanFailed { goal, error, .. } => json!({
            "tick": tick, "event": "plan_failed", "agent": agent,
            "goal": goal, "error": error.to_string()
        }),
        ExecutorEvent::PlanReplaced { goal, tasks, .. } => json!({
            "tick": tick, "event": "plan_replaced", "agent": agent,
            "goal": goal, "tasks": tasks
        }),
        ExecutorEvent::TaskStarted { task, .. } => json!({
            "tick": tick, "event": "task_started", "agent": agent, "task": task
        }),
        ExecutorEvent::TaskFinished { task, .. } => json!({
            "tick": tick, "event": "task_finished", "agent": agent, "task": task
        }),
        ExecutorEvent::TaskFailed { task, reason, .. } => json!({
            "tick": tick, "event": "task_failed", "agent": agent,
            "task": task, "reason": reason.to_string()
        }),
        ExecutorEvent::GoalAchieved { goal, .. } => json!({
            "tick": tick, "event": "goal_achieved", "agent": agent, "goal": goal
        }),
    }
}

#[cfg(test)]
mod tests {
    use htn::{EntityId, TaskFailure};

    use super::*;

    fn report() -> TickReport {
        TickReport {
            tick: 7,
            updated: vec![EntityId(1)],
            events: vec![
                ExecutorEvent::PlanFound {
                    agent: EntityId(1),
                    goal: "guard".into(),
                    tasks: vec!["approach_target".into(), "strike".into()],
                    cost: 6,
                },
                ExecutorEvent::TaskFailed {
                    agent: EntityId(1),
                    task: "strike".into(),
                    reason: TaskFailure::Ineligible,
                },
            ],
            failures: Vec::new(),
        }
    }

    #[test]
    fn text_lines() {
        assert_eq!(
            OutputFormat::Text.render(&report()),
            [
                "[  7] #1 planned `guard`: approach_target -> strike (cost 6)",
                "[  7] #1 strike ineligible",
            ]
        );
    }

    #[test]
    fn json_lines() {
        let lines = OutputFormat::Json.render(&report());
        let first: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["event"], "plan_found");
        assert_eq!(first["agent"], 1);
        assert_eq!(first["tasks"], json!(["approach_target", "strike"]));
        assert_eq!(first["cost"], 6);

        let second: Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(second["reason"], "ineligible");
        assert_eq!(second["tick"], 7);
    }
}
