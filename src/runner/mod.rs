//! The iteration-bounded control loop driving the pipeline.

pub mod orchestrator;

pub use orchestrator::{
    IterationObserver, IterationRecord, NoOpObserver, Orchestrator, OrchestratorConfig, RunResult,
    RunStatus,
};
