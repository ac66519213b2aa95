//! `stream-batch` command line entry point.
//!
//! `run` streams a JSON array file through the sequential or the parallel
//! dispatcher; `generate` writes a sample file of random records.
use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{error, info};

use stream_batch_rs::{
    Record,
    core::{
        item::{ItemHandler, ItemHandlerResult},
        listener::{MemoryListener, TimingListener},
        step::{DEFAULT_BUFFER_CAPACITY, DEFAULT_QUEUE_CAPACITY, StepBuilder},
    },
    item::logger::LoggerHandler,
};

#[derive(Parser)]
#[command(
    name = "stream-batch",
    version,
    about = "Stream a large JSON array and dispatch every record to a handler",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode every record of a JSON array file
    Run(RunArgs),
    /// Write a JSON array of random records
    #[cfg(feature = "fake")]
    Generate(GenerateArgs),
}

#[derive(Args)]
struct RunArgs {
    #[arg(long, default_value = "large-file.json", help = "JSON array file to process")]
    file: PathBuf,
    #[arg(long, help = "Dispatch records to a worker pool instead of inline")]
    parallel: bool,
    #[arg(long, help = "Worker threads in parallel mode (default: hardware concurrency)")]
    workers: Option<usize>,
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY, help = "Records buffered between reader and workers")]
    queue_capacity: usize,
    #[arg(long, default_value_t = DEFAULT_BUFFER_CAPACITY, help = "Read buffer size in bytes")]
    buffer_capacity: usize,
    #[arg(long, help = "Log every decoded record")]
    log_records: bool,
}

#[cfg(feature = "fake")]
#[derive(Args)]
struct GenerateArgs {
    #[arg(long, help = "Number of records to write")]
    count: usize,
    #[arg(long, default_value = "large-file.json", help = "Destination file")]
    output: PathBuf,
    #[arg(long, help = "Pretty-print the records")]
    pretty: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => process(args),
        #[cfg(feature = "fake")]
        Command::Generate(args) => generate(args),
    }
}

fn process(args: RunArgs) -> Result<()> {
    let timing = TimingListener::new();
    let memory = MemoryListener::new();

    let mut builder = StepBuilder::new()
        .name("process".to_string())
        .queue_capacity(args.queue_capacity)
        .buffer_capacity(args.buffer_capacity)
        .listener(&timing)
        .listener(&memory);
    if let Some(workers) = args.workers {
        builder = builder.workers(workers);
    }
    let step = builder.build();

    let logger = LoggerHandler::new();
    let discard = |_: &Record| -> ItemHandlerResult { Ok(()) };
    let handler: &(dyn ItemHandler<Record> + Sync) = if args.log_records {
        &logger
    } else {
        &discard
    };

    let result = if args.parallel {
        step.run_parallel::<Record, _, _>(&args.file, handler)
    } else {
        step.run_sequential::<Record, _, _>(&args.file, handler)
    };

    if let Some(err) = result.error {
        return Err(anyhow::Error::new(err).context(format!(
            "processing {} stopped after {} records",
            args.file.display(),
            result.count
        )));
    }

    info!(
        "Processed {} records from {} in {:?}",
        result.count,
        args.file.display(),
        result.duration
    );

    Ok(())
}

#[cfg(feature = "fake")]
fn generate(args: GenerateArgs) -> Result<()> {
    use stream_batch_rs::{
        core::item::ItemWriter,
        item::{fake::RecordReaderBuilder, json::JsonItemWriterBuilder},
    };

    let listener = TimingListener::new();
    let reader = RecordReaderBuilder::new()
        .number_of_items(args.count)
        .build();
    let writer = JsonItemWriterBuilder::<Record>::new()
        .pretty_formatter(args.pretty)
        .from_path(&args.output)?;

    writer.open()?;

    let handler = |record: &Record| writer.write(std::slice::from_ref(record));
    let count = StepBuilder::new()
        .name("generate".to_string())
        .listener(&listener)
        .build()
        .execute_sequential::<Record, _, _>(&reader, &handler)
        .into_result()
        .with_context(|| format!("unable to write {}", args.output.display()))?;

    writer.close()?;

    info!("Wrote {} records to {}", count, args.output.display());

    Ok(())
}
