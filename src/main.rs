use std::{process::ExitCode, sync::Arc};

use anyhow::{Context, Result, anyhow};
use serde_json::json;

use dbimpact::{
    cli::{self, CliArgs, Command},
    config::Config,
    engine::{
        AnalysisPipeline, AnalysisRequest, BatchResult, FilePolicyProvider, FixtureConfigProvider,
        Scenario,
    },
    inference::{InferenceGateway, OpenAiCompatibleBackend},
    logging,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dbimpact: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let args = cli::parse_args()?;

    // The catalog listing needs neither config nor an inference backend.
    if matches!(args.command, Command::Scenarios) {
        print_scenarios();
        return Ok(());
    }

    let config = Config::load(&args.config_path)?;
    let logging_guard = logging::init_tracing(&config.logging)?;
    tracing::info!(
        target: "main",
        run_id = %logging_guard.run_id(),
        config = %args.config_path.display(),
        "dbimpact_started"
    );

    let pipeline = build_pipeline(&config)?;
    run_command(&pipeline, args).await
}

fn build_pipeline(config: &Config) -> Result<AnalysisPipeline> {
    let backend = OpenAiCompatibleBackend::from_config(&config.inference)
        .map_err(|err| anyhow!("inference backend setup failed: {err}"))?;
    let gateway = Arc::new(InferenceGateway::new(&config.inference, Arc::new(backend)));
    let config_provider = Arc::new(FixtureConfigProvider::with_demo_fleet());
    let policy_provider = Arc::new(FilePolicyProvider::new(config.engine.policy_docs.clone()));

    AnalysisPipeline::new(
        config_provider,
        policy_provider,
        gateway,
        config.engine.limits.clone(),
    )
    .map_err(|err| anyhow!("pipeline setup failed: {err}"))
}

async fn run_command(pipeline: &AnalysisPipeline, args: CliArgs) -> Result<()> {
    match args.command {
        Command::Analyze {
            identifier,
            scenario,
        } => {
            let request = AnalysisRequest::new(&identifier, scenario);
            let verdict = pipeline
                .analyze(&request)
                .await
                .map_err(|err| anyhow!("analysis of '{identifier}' failed: {err}"))?;
            print_json(&verdict)
        }
        Command::Batch {
            identifiers,
            scenario,
            concurrency,
        } => {
            let requests: Vec<AnalysisRequest> = identifiers
                .iter()
                .map(|identifier| AnalysisRequest::new(identifier, scenario))
                .collect();
            let result = pipeline
                .analyze_batch(&requests, concurrency)
                .await
                .map_err(|err| anyhow!("batch analysis failed: {err}"))?;
            print_json(&batch_report(&result))
        }
        Command::WhatIf {
            identifier,
            scenario,
            overrides,
        } => {
            if overrides.is_empty() {
                return Err(anyhow!("what-if requires at least one --set key=value"));
            }
            let comparison = pipeline
                .compare(&identifier, scenario, &overrides)
                .await
                .map_err(|err| anyhow!("what-if analysis of '{identifier}' failed: {err}"))?;
            print_json(&comparison)
        }
        Command::Scenarios => {
            print_scenarios();
            Ok(())
        }
    }
}

fn print_scenarios() {
    for scenario in Scenario::all() {
        let descriptor = scenario.describe();
        println!("{}\t{}", descriptor.key, descriptor.description);
    }
}

fn batch_report(result: &BatchResult) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = result
        .entries
        .iter()
        .map(|entry| match &entry.outcome {
            Ok(verdict) => json!({
                "db_identifier": entry.identifier,
                "status": "success",
                "verdict": verdict,
            }),
            Err(err) => json!({
                "db_identifier": entry.identifier,
                "status": "error",
                "kind": format!("{:?}", err.kind),
                "error": err.to_string(),
            }),
        })
        .collect();

    json!({
        "entries": entries,
        "succeeded": result.succeeded(),
        "failed": result.failed(),
        "severity_tally": result.tally,
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}
