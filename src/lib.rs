#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod actions;
pub mod agent;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod observability;
pub mod prompt;
pub mod schema;

pub use agent::{LoopGovernor, RunOutcome, Termination};
pub use config::Config;
pub use error::{EnrichError, Result};
pub use schema::SchemaDescriptor;
