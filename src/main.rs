//! daqflow - run a pipeline file over JSON samples
//!
//! Reads one JSON value per line from stdin, runs one pass per value and
//! prints each output as one JSON line on stdout. Logs go to stderr.

use anyhow::Context;
use clap::Parser;
use daqflow::config::{EngineSettings, PipelineSpec};
use daqflow::logging::init_logging;
use daqflow::pipeline::{segment, Graph, Value};
use daqflow::scripting::ScriptEngine;
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "daqflow")]
#[command(author, version, about = "Run a block pipeline over JSON samples", long_about = None)]
struct Cli {
    /// Pipeline file (.toml or .json)
    pipeline: PathBuf,

    /// Engine settings file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Log filter directive, overrides RUST_LOG and the settings file
    #[arg(long, value_name = "DIRECTIVE")]
    log: Option<String>,

    /// Print the compiled topology as JSON and exit
    #[arg(long)]
    topology: bool,

    /// Treat each input line as a recording and run one pass per segment
    /// of this many samples
    #[arg(long, value_name = "SAMPLES")]
    segment: Option<usize>,

    /// Samples shared by consecutive segments
    #[arg(long, default_value_t = 0, requires = "segment")]
    overlap: usize,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (settings, load_error) = match &cli.settings {
        Some(path) => (EngineSettings::load_from(path)?, None),
        None => EngineSettings::load_or_default(),
    };
    let _log_guard = init_logging(&settings.logging, cli.log.as_deref())?;
    if let Some(e) = load_error {
        tracing::warn!("Failed to load settings, using defaults: {}", e);
    }

    let engine = ScriptEngine::with_settings(&settings.script);
    let mut graph = PipelineSpec::load(&cli.pipeline)?
        .compile(&engine, settings.executor)
        .with_context(|| format!("Failed to build pipeline {:?}", cli.pipeline))?;

    tracing::info!(
        "Pipeline ready: {} blocks, output {:?}",
        graph.plan().stats.blocks,
        graph.plan().output_arity
    );

    if cli.topology {
        println!("{}", graph.topology().to_json()?);
        return Ok(());
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut skipped = 0u64;

    for (line_no, line) in stdin.lock().lines().enumerate() {
        let line = line.context("Failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let sample: Value = match serde_json::from_str(&line) {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!("Line {}: not a valid sample, skipped: {}", line_no + 1, e);
                skipped += 1;
                continue;
            }
        };

        let inputs = match cli.segment {
            Some(length) => match split_recording(sample, length, cli.overlap) {
                Ok(segments) => segments,
                Err(e) => {
                    tracing::warn!("Line {}: {}", line_no + 1, e);
                    skipped += 1;
                    continue;
                }
            },
            None => vec![sample],
        };

        for input in inputs {
            skipped += run_pass(&mut graph, input, line_no + 1, &mut out)?;
        }
    }

    tracing::info!(
        "Done: {} passes, {} samples skipped",
        graph.passes(),
        skipped
    );
    Ok(())
}

/// Run one pass and print its output. A failed pass is logged and skipped;
/// returns the number of skipped samples.
fn run_pass(graph: &mut Graph, input: Value, line: usize, out: &mut impl Write) -> anyhow::Result<u64> {
    match graph.run(input) {
        Ok(output) => {
            serde_json::to_writer(&mut *out, &output)?;
            writeln!(out)?;
            Ok(0)
        }
        Err(e) => {
            tracing::warn!("Line {}: pass failed, sample skipped: {}", line, e);
            Ok(1)
        }
    }
}

fn split_recording(sample: Value, length: usize, overlap: usize) -> anyhow::Result<Vec<Value>> {
    let signal = match sample {
        Value::Signal(signal) => signal,
        other => anyhow::bail!("expected a recording (list of channels), got {}", other.kind()),
    };
    Ok(segment(&signal, length, overlap)?
        .into_iter()
        .map(Value::Signal)
        .collect())
}
