//! Tick-driven runtime for HTN-controlled NPCs.
//!
//! This crate wires the [`htn`] planning core into a simulation loop. The
//! simulation activates agents with a goal, calls [`NpcSystem::update`] once
//! per tick, and reacts to the [`ExecutorEvent`](htn::ExecutorEvent)s it
//! returns.
//!
//! Modules are organized by responsibility:
//! - [`system`] hosts the orchestrator and its builder
//! - [`controller`] holds per-agent state
//! - [`config`] and [`error`] are the configuration and error surface
pub mod config;
pub mod controller;
pub mod error;
pub mod system;

pub use config::RuntimeConfig;
pub use controller::NpcController;
pub use error::{Result, RuntimeError};
pub use system::{NpcSystem, NpcSystemBuilder, TickReport};
