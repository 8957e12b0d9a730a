//! Command-line front end for the recording decoder.

use atplog::{formatter, DecodeError, RuReader};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_USAGE: u8 = 1;
const EXIT_UNREADABLE: u8 = 2;
const EXIT_RESYNC_BUDGET: u8 = 3;
const EXIT_INTERNAL: u8 = 4;

#[derive(Debug, Parser)]
#[command(name = "atplog", version, about = "Decode ATP recording unit and MMI log files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode a recording into text rows or JSON lines
    Decode {
        /// Input recording file
        input: PathBuf,

        /// Stop after this many output items
        #[arg(short = 'n', long = "count")]
        count: Option<usize>,

        /// Output format
        #[arg(short = 'f', long = "format", value_enum, default_value = "text")]
        format: Format,

        /// Write output to a file instead of stdout
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Verbose logging
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    // Usage errors exit with 1, not clap's default of 2; 2 means an
    // unreadable input here.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    let Command::Decode { input, count, format, output, verbose } = args.command;

    let default_level = if verbose { "atplog=debug" } else { "atplog=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let reader = match RuReader::open(&input) {
        Ok(reader) => reader,
        Err(err) => {
            eprintln!("atplog: {err}");
            return ExitCode::from(EXIT_UNREADABLE);
        }
    };

    let sink: Box<dyn Write> = match &output {
        Some(path) => match std::fs::File::create(path) {
            Ok(file) => Box::new(BufWriter::new(file)),
            Err(err) => {
                eprintln!("atplog: cannot create {}: {err}", path.display());
                return ExitCode::from(EXIT_INTERNAL);
            }
        },
        None => Box::new(BufWriter::new(std::io::stdout())),
    };

    match run_decode(reader, sink, count, format) {
        Ok(()) => ExitCode::SUCCESS,
        Err(RunError::ResyncBudget) => ExitCode::from(EXIT_RESYNC_BUDGET),
        Err(RunError::Internal(err)) => {
            eprintln!("atplog: {err}");
            ExitCode::from(EXIT_INTERNAL)
        }
    }
}

enum RunError {
    ResyncBudget,
    Internal(std::io::Error),
}

fn run_decode(
    mut reader: RuReader<std::io::BufReader<std::fs::File>>,
    mut sink: Box<dyn Write>,
    count: Option<usize>,
    format: Format,
) -> Result<(), RunError> {
    let limit = count.unwrap_or(usize::MAX);
    let mut emitted = 0usize;
    let mut budget_exceeded = false;

    while emitted < limit {
        let Some(item) = reader.next_record() else { break };
        emitted += 1;
        match item {
            Ok(record) => {
                let line = match format {
                    Format::Text => formatter::to_row(&record),
                    Format::Json => formatter::to_json(&record).to_string(),
                };
                writeln!(sink, "{line}").map_err(RunError::Internal)?;
            }
            Err(err) => {
                if matches!(err, DecodeError::ResyncBudgetExceeded { .. }) {
                    budget_exceeded = true;
                }
                eprintln!("atplog: {err}");
            }
        }
    }
    sink.flush().map_err(RunError::Internal)?;

    let stats = reader.stats();
    eprintln!("{}", stats.summary());
    eprintln!(
        "errors: truncated={} invalid_calendar={} body_too_short={} fragment_mismatch={} \
         evicted={} unknown_type={}",
        stats.truncated,
        stats.invalid_calendar_fields,
        stats.bodies_too_short,
        stats.fragment_index_mismatches,
        stats.partial_telegrams_evicted,
        stats.unknown_packet_types,
    );

    if budget_exceeded {
        return Err(RunError::ResyncBudget);
    }
    Ok(())
}
