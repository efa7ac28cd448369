use std::{collections::BTreeMap, env, path::PathBuf, str::FromStr};

use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::engine::Scenario;

#[derive(Debug, Clone)]
pub enum Command {
    /// Single analysis of one database under one scenario.
    Analyze {
        identifier: String,
        scenario: Scenario,
    },
    /// Bounded-concurrency analysis of several databases.
    Batch {
        identifiers: Vec<String>,
        scenario: Scenario,
        concurrency: usize,
    },
    /// Baseline vs hypothetical comparison with configuration overrides.
    WhatIf {
        identifier: String,
        scenario: Scenario,
        overrides: BTreeMap<String, Value>,
    },
    /// Lists the scenario catalog.
    Scenarios,
}

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub config_path: PathBuf,
    pub command: Command,
}

const USAGE: &str = "usage: dbimpact [--config <path>] <analyze|batch|what-if|scenarios> ...";

pub fn parse_args() -> Result<CliArgs> {
    parse_from(env::args().skip(1).collect())
}

fn parse_from(args: Vec<String>) -> Result<CliArgs> {
    let mut config_path = PathBuf::from("./dbimpact.jsonc");
    let mut scenario = Scenario::PrimaryDbFailure;
    let mut concurrency = 10usize;
    let mut overrides = BTreeMap::new();
    let mut command: Option<&str> = None;
    let mut positionals: Vec<String> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter.next().ok_or_else(|| anyhow!("missing value for --config"))?;
                config_path = PathBuf::from(value);
            }
            "--scenario" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --scenario"))?;
                scenario = Scenario::from_str(value).map_err(|err| anyhow!("{err}"))?;
            }
            "--concurrency" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --concurrency"))?;
                concurrency = value
                    .parse()
                    .map_err(|_| anyhow!("--concurrency must be a positive integer"))?;
            }
            "--set" => {
                let value = iter.next().ok_or_else(|| anyhow!("missing value for --set"))?;
                let (key, raw) = value
                    .split_once('=')
                    .ok_or_else(|| anyhow!("--set expects key=value, got '{value}'"))?;
                overrides.insert(key.to_string(), parse_override_value(raw));
            }
            "analyze" | "batch" | "what-if" | "scenarios" if command.is_none() => {
                command = Some(arg.as_str());
            }
            other if !other.starts_with("--") => positionals.push(other.to_string()),
            other => return Err(anyhow!("unknown argument: {other}. {USAGE}")),
        }
    }

    let command = match command.ok_or_else(|| anyhow!(USAGE))? {
        "analyze" => Command::Analyze {
            identifier: single_positional(positionals, "analyze <identifier>")?,
            scenario,
        },
        "batch" => {
            let list = single_positional(positionals, "batch <id1,id2,...>")?;
            Command::Batch {
                identifiers: list.split(',').map(str::to_string).collect(),
                scenario,
                concurrency,
            }
        }
        "what-if" => Command::WhatIf {
            identifier: single_positional(positionals, "what-if <identifier> --set key=value")?,
            scenario,
            overrides,
        },
        _ => Command::Scenarios,
    };

    Ok(CliArgs {
        config_path,
        command,
    })
}

fn single_positional(mut positionals: Vec<String>, usage: &str) -> Result<String> {
    if positionals.len() != 1 {
        return Err(anyhow!("expected exactly one argument: {usage}"));
    }
    Ok(positionals.remove(0))
}

/// `true`, `false`, and numbers become typed JSON values; anything else is
/// a string. `--set pitr_enabled=true --set instance_class=db.m5.xlarge`.
fn parse_override_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
