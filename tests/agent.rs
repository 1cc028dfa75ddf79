#[path = "support/scripted.rs"]
mod support;

#[path = "agent/corrections.rs"]
mod corrections;
#[path = "agent/execution.rs"]
mod execution;
#[path = "agent/scenarios.rs"]
mod scenarios;
