use crate::agent::{RunOutcome, Termination};
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::schema::SchemaDescriptor;
use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::process::ExitCode;

/// Exit code for runs that ended without an accepted record.
const EXIT_NO_RECORD: u8 = 2;

/// JSON printed by `enricher run`.
pub fn render_outcome(outcome: &RunOutcome, transcript: bool) -> Result<Value> {
    let mut value = json!({
        "record": outcome.record,
        "terminated": outcome.terminated,
        "iterations": outcome.iterations,
    });
    if transcript {
        value["conversation"] =
            serde_json::to_value(outcome.conversation.turns()).context("Failed to serialize conversation")?;
    }
    Ok(value)
}

pub fn exit_code(termination: Termination) -> ExitCode {
    match termination {
        Termination::Accepted => ExitCode::SUCCESS,
        _ => ExitCode::from(EXIT_NO_RECORD),
    }
}

pub async fn dispatch(cli: Cli, mut config: Config) -> Result<ExitCode> {
    match cli.command {
        Commands::Run {
            topic,
            schema,
            max_loops,
            transcript,
        } => {
            let schema = SchemaDescriptor::load(&schema)?;
            if let Some(max_loops) = max_loops {
                config.agent.max_loops = max_loops;
            }

            let outcome = super::run(&topic, schema, &config)
                .await
                .with_context(|| format!("Extraction run for '{topic}' failed"))?;
            let rendered = render_outcome(&outcome, transcript)?;
            println!("{}", serde_json::to_string_pretty(&rendered)?);
            Ok(exit_code(outcome.terminated))
        }

        Commands::Config => {
            let rendered = toml::to_string_pretty(&config.redacted())
                .context("Failed to serialize config")?;
            println!("{rendered}");
            Ok(ExitCode::SUCCESS)
        }
    }
}
