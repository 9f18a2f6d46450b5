//! `reqdesk` entrypoint: command routing for the lookup-and-decision
//! pipeline. A pipeline stop ends the current run with a message; only
//! genuine faults (unreadable config, bad line-item file) report as errors.
use anyhow::{anyhow, Context, Result};
use clap::Parser;

mod cli;
mod config;
mod decision;
mod gate;
mod locate;
mod payload;
mod pipeline;
mod render;
mod row;
mod source;
mod submit;

use cli::{Command, DecideArgs, RootArgs, ShowArgs};
use config::PipelineConfig;
use decision::Outcome;
use pipeline::{DecisionInput, LineItemInput, Pipeline, RunError};
use submit::HttpSink;

enum Failure {
    /// A terminal stop condition of the run itself.
    Stopped(RunError),
    /// A fault outside the pipeline contract.
    Fault(anyhow::Error),
}

impl From<RunError> for Failure {
    fn from(stop: RunError) -> Failure {
        Failure::Stopped(stop)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Failure {
        Failure::Fault(err)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = RootArgs::parse();
    let outcome = match args.command {
        Command::Show(show) => run_show(&show),
        Command::Decide(decide) => run_decide(&decide),
    };
    match outcome {
        Ok(()) => {}
        Err(Failure::Stopped(stop)) => {
            println!("stopped: {stop}");
            std::process::exit(1);
        }
        Err(Failure::Fault(err)) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}

fn run_show(args: &ShowArgs) -> Result<(), Failure> {
    let config = PipelineConfig::load(&args.config)?;
    let pipeline = Pipeline::from_config(config);
    let lookup = pipeline.lookup(&args.term)?;
    if args.json {
        println!("{}", render::lookup_json(&lookup)?);
    } else {
        print!("{}", render::lookup_text(&lookup));
    }
    Ok(())
}

fn run_decide(args: &DecideArgs) -> Result<(), Failure> {
    let config = PipelineConfig::load(&args.config)?;
    let input = decision_input(args)?;
    let mut sink = HttpSink::new(config.request_timeout());
    let pipeline = Pipeline::from_config(config);
    let report = pipeline.decide(&args.term, input, &mut sink)?;
    println!(
        "decision for {} delivered ({} attempt(s))",
        report.identifier, report.attempts
    );
    Ok(())
}

fn decision_input(args: &DecideArgs) -> Result<DecisionInput> {
    let outcome = match (args.approve, args.reject) {
        (true, false) => Outcome::Approve,
        (false, true) => Outcome::Reject,
        _ => return Err(anyhow!("pass exactly one of --approve or --reject")),
    };
    let line_items: Vec<LineItemInput> = match &args.lines {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read line items: {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parse line items: {}", path.display()))?
        }
        None => Vec::new(),
    };
    Ok(DecisionInput {
        outcome,
        reason: args.reason.clone(),
        line_items,
    })
}
